use std::path::Path;

use super::*;
use crate::base::LineCol;
use crate::hir::{ImportSource, Symbol, SymbolData, SymbolKind};

fn parse_str(text: &str) -> ParsedFile {
    parse(Path::new("/proj/app/main.odin"), text)
}

fn find<'a>(file: &'a ParsedFile, name: &str) -> &'a Symbol {
    file.symbols
        .iter()
        .find(|s| &*s.name == name)
        .unwrap_or_else(|| panic!("no symbol {name} in {:?}", file.symbols))
}

fn names(file: &ParsedFile) -> Vec<&str> {
    file.symbols.iter().map(|s| &*s.name).collect()
}

// ============================================================================
// PACKAGE AND IMPORTS
// ============================================================================

#[test]
fn test_package_clause() {
    let file = parse_str("package demo\n");
    assert_eq!(file.package_name.as_deref(), Some("demo"));
    assert!(file.symbols.is_empty());
}

#[test]
fn test_imports_collection_relative_and_alias() {
    let file = parse_str(
        r#"package demo

import "core:fmt"
import rl "vendor:raylib"
import jui "../jui"
import "core:math/linalg"
foreign import libc "system:c"
"#,
    );
    let aliases: Vec<&str> = file.imports.iter().map(|i| &*i.alias).collect();
    assert_eq!(aliases, vec!["fmt", "rl", "jui", "linalg"]);

    assert_eq!(
        file.imports[1].source,
        ImportSource::Collection {
            collection: "vendor".into(),
            path: "raylib".into(),
        }
    );
    assert_eq!(file.imports[2].source, ImportSource::Relative("../jui".into()));
    assert_eq!(file.imports[0].pos, LineCol::new(2, 0));
}

#[test]
fn test_import_drive_letter_is_a_path() {
    let file = parse_str(r#"import w "C:/odin/shared/w""#);
    assert!(matches!(file.imports[0].source, ImportSource::Relative(_)));
}

// ============================================================================
// PROCEDURES
// ============================================================================

#[test]
fn test_proc_single_line() {
    let file = parse_str("f :: proc(c: Clip) {\n\tx := 1\n\ty :: 2\n}\n");
    assert_eq!(names(&file), vec!["f"]);

    let f = find(&file, "f");
    assert_eq!(f.kind, SymbolKind::Procedure);
    assert_eq!(&*f.signature, "f :: proc(c: Clip)");
    let sig = f.proc_signature().unwrap();
    assert_eq!(sig.param_type(0), Some("Clip"));
}

#[test]
fn test_proc_multiline_params_and_body() {
    let text = "draw :: proc(\n\trect: Rect,\n\tcolor: Color = WHITE,\n) -> bool {\n\treturn true\n}\nafter :: 1\n";
    let file = parse_str(text);
    assert_eq!(names(&file), vec!["draw", "after"]);

    let sig = find(&file, "draw").proc_signature().unwrap().clone();
    let params: Vec<(&str, &str)> = sig.params.iter().map(|p| (&*p.name, &*p.ty)).collect();
    assert_eq!(params, vec![("rect", "Rect"), ("color", "Color")]);
    assert_eq!(&*sig.return_type, "bool");
}

#[test]
fn test_proc_body_on_next_line() {
    let text = "area :: proc(r: Rect) -> i32\n{\n\treturn r.x * r.y\n}\nnext :: proc() {}\n";
    let file = parse_str(text);
    assert_eq!(names(&file), vec!["area", "next"]);
    assert_eq!(&*find(&file, "area").proc_signature().unwrap().return_type, "i32");
}

#[test]
fn test_proc_return_type_on_continuation_line() {
    let text = "split :: proc(s: string)\n\t-> (head: string, tail: string) {\n\treturn\n}\n";
    let file = parse_str(text);
    let sig = find(&file, "split").proc_signature().unwrap().clone();
    assert_eq!(&*sig.return_type, "(head: string, tail: string)");
}

#[test]
fn test_foreign_proc_and_calling_convention() {
    let text = "foreign libc {\n\tputs :: proc \"c\" (s: cstring) -> i32 ---\n}\n";
    let file = parse_str(text);
    let puts = find(&file, "puts");
    let sig = puts.proc_signature().unwrap();
    assert_eq!(sig.calling_convention.as_deref(), Some("c"));
    assert_eq!(puts.pos, LineCol::new(1, 1));
}

#[test]
fn test_proc_directives_and_attributes() {
    let text = "@(private, require_results)\nhelper :: #force_inline proc \"contextless\" () -> int { return 1 }\n";
    let file = parse_str(text);
    let helper = find(&file, "helper");
    assert!(helper.is_private);
    assert_eq!(helper.attributes.len(), 2);
    assert_eq!(&*helper.proc_signature().unwrap().directives[0], "#force_inline");
}

#[test]
fn test_proc_group() {
    let text = "length :: proc{\n\tlength_vec2,\n\tlength_vec3,\n}\n";
    let file = parse_str(text);
    let length = find(&file, "length");
    assert_eq!(length.kind, SymbolKind::Procedure);
    let members: Vec<&str> = length.group_members().iter().map(|m| &**m).collect();
    assert_eq!(members, vec!["length_vec2", "length_vec3"]);
    assert_eq!(&*length.signature, "length :: proc{length_vec2, length_vec3}");
}

#[test]
fn test_proc_group_single_line() {
    let file = parse_str("min :: proc{min_i32, min_f32}\n");
    assert_eq!(find(&file, "min").group_members().len(), 2);
}

// ============================================================================
// STRUCTS, ENUMS, UNIONS
// ============================================================================

#[test]
fn test_struct_with_using_field() {
    let text = "Rect :: struct { x, y: i32 }\nShape :: struct {\n\tusing r: Rect,\n\tcolor: Color,\n}\n";
    let file = parse_str(text);

    let rect = find(&file, "Rect");
    assert_eq!(rect.kind, SymbolKind::Struct);
    assert_eq!(rect.fields().len(), 2);

    let shape = find(&file, "Shape");
    assert!(shape.fields()[0].embedded);
    assert_eq!(&*shape.fields()[0].ty, "Rect");
    assert_eq!(&*shape.fields()[1].name, "color");
    assert_eq!(&*shape.signature, "Shape :: struct");
}

#[test]
fn test_generic_struct_keeps_header() {
    let file = parse_str("Pair :: struct($K, $V: typeid) #packed {\n\tkey: K,\n\tvalue: V,\n}\n");
    let pair = find(&file, "Pair");
    assert_eq!(&*pair.signature, "Pair :: struct($K, $V: typeid) #packed");
    assert_eq!(pair.fields().len(), 2);
}

#[test]
fn test_struct_nested_braces_in_fields() {
    let text = "Outer :: struct {\n\tinner: struct {\n\t\ta: int,\n\t},\n\tafter: f32,\n}\nnext :: 1\n";
    let file = parse_str(text);
    let outer = find(&file, "Outer");
    let fields: Vec<&str> = outer.fields().iter().map(|f| &*f.name).collect();
    assert_eq!(fields, vec!["inner", "after"]);
    assert_eq!(names(&file), vec!["Outer", "next"]);
}

#[test]
fn test_struct_header_brace_on_next_line() {
    let file = parse_str("Node :: struct\n{\n\tnext: ^Node,\n}\n");
    assert_eq!(find(&file, "Node").fields().len(), 1);
}

#[test]
fn test_enum_single_line_with_backing() {
    let file = parse_str("Clip :: enum u32 { NONE, PART, ALL }\n");
    let clip = find(&file, "Clip");
    assert_eq!(clip.kind, SymbolKind::Enum);
    let variants: Vec<&str> = clip.variants().iter().map(|v| &**v).collect();
    assert_eq!(variants, vec!["NONE", "PART", "ALL"]);
    assert_eq!(
        clip.data,
        SymbolData::Enum {
            variants: clip.variants().to_vec(),
            backing_type: Some("u32".into()),
        }
    );
    assert_eq!(&*clip.signature, "Clip :: enum u32");
}

#[test]
fn test_enum_multiline_with_values() {
    let text = "Flag :: enum {\n\tA = 1, // first\n\tB,\n\t/* skipped */ C = 1 << 3,\n}\n";
    let file = parse_str(text);
    let variants: Vec<&str> = find(&file, "Flag").variants().iter().map(|v| &**v).collect();
    assert_eq!(variants, vec!["A", "B", "C"]);
}

#[test]
fn test_union() {
    let file = parse_str("Value :: union #no_nil {\n\ti64,\n\tf64,\n\tstring,\n}\n");
    let value = find(&file, "Value");
    assert_eq!(value.kind, SymbolKind::Union);
    assert_eq!(value.value(), Some("i64, f64, string"));
    assert_eq!(&*value.signature, "Value :: union #no_nil");
}

// ============================================================================
// ALIASES, CONSTANTS, VARIABLES
// ============================================================================

#[test]
fn test_type_alias_heuristics() {
    let text = "\
import rl \"vendor:raylib\"
Handle :: distinct u32
Flags :: bit_set[Flag; u32]
Ptr :: ^Node
Vec3 :: [3]f32
Table :: map[string]int
Mat :: matrix[4, 4]f32
Callback :: #type proc(x: int)
Byte :: u8
Color :: rl.Color
Other :: Shape
MAX :: 64
NAME :: \"demo\"
SHOUT :: OTHER_CONST
";
    let file = parse_str(text);
    for name in ["Handle", "Flags", "Ptr", "Vec3", "Table", "Mat", "Callback", "Byte", "Color", "Other"] {
        assert_eq!(find(&file, name).kind, SymbolKind::TypeAlias, "{name}");
    }
    for name in ["MAX", "NAME", "SHOUT"] {
        assert_eq!(find(&file, name).kind, SymbolKind::Constant, "{name}");
    }
    assert_eq!(find(&file, "Flags").value(), Some("bit_set[Flag; u32]"));
}

#[test]
fn test_enum_values_and_named_constants_are_not_types() {
    let text = "\
import rl \"vendor:raylib\"
Color :: enum { Red, Green }
DEFAULT :: Color.Red
Fallback :: Color.Green
LIMIT :: Max_Size
WHITE :: rl.WHITE
Tint :: rl.Color
Size :: Max_Size
ID :: u32
";
    let file = parse_str(text);
    for name in ["DEFAULT", "Fallback", "LIMIT", "WHITE"] {
        assert_eq!(find(&file, name).kind, SymbolKind::Constant, "{name}");
    }
    for name in ["Tint", "Size", "ID"] {
        assert_eq!(find(&file, name).kind, SymbolKind::TypeAlias, "{name}");
    }
    assert_eq!(find(&file, "DEFAULT").value(), Some("Color.Red"));
}

#[test]
fn test_config_and_typed_constants() {
    let text = "DEBUG :: #config(DEBUG, false)\nSIZE : int : 16\n";
    let file = parse_str(text);
    assert_eq!(find(&file, "DEBUG").kind, SymbolKind::Constant);
    let size = find(&file, "SIZE");
    assert_eq!(size.kind, SymbolKind::Constant);
    assert_eq!(size.value(), Some("int"));
    assert_eq!(&*size.signature, "SIZE : int : 16");
}

#[test]
fn test_variables() {
    let text = "counter := 0\nshape: Shape\nclip: Clip = .PART\n";
    let file = parse_str(text);
    assert_eq!(find(&file, "counter").kind, SymbolKind::Variable);
    assert_eq!(find(&file, "shape").value(), Some("Shape"));
    assert_eq!(&*find(&file, "shape").signature, "shape: Shape");
    assert_eq!(find(&file, "clip").value(), Some("Clip"));
}

#[test]
fn test_multiline_initialiser_is_skipped() {
    let text = "NAMES := [?]string{\n\t\"a\",\n\tfake :: proc() {},\n}\nreal :: 1\n";
    let file = parse_str(text);
    assert_eq!(names(&file), vec!["NAMES", "real"]);
    assert_eq!(&*find(&file, "NAMES").signature, "NAMES := [?]string");
}

// ============================================================================
// COMMENTS, ATTRIBUTES, RECOVERY
// ============================================================================

#[test]
fn test_block_comments_nest_and_hide_declarations() {
    let text = "/* outer\n/* inner */\nhidden :: 1\n*/\nvisible :: 2\n";
    let file = parse_str(text);
    assert_eq!(names(&file), vec!["visible"]);
}

#[test]
fn test_braces_in_strings_do_not_count() {
    let text = "f :: proc() {\n\ts := \"}\"\n\tr := '}'\n}\ng :: proc() {}\n";
    let file = parse_str(text);
    assert_eq!(names(&file), vec!["f", "g"]);
}

#[test]
fn test_attribute_on_own_line_applies_to_next_declaration() {
    let text = "@(private=\"file\")\n@(link_name=\"x\")\nsecret :: proc() {}\npublic :: proc() {}\n";
    let file = parse_str(text);
    let secret = find(&file, "secret");
    assert!(secret.is_private);
    assert_eq!(secret.attributes.len(), 2);
    assert!(!find(&file, "public").is_private);
}

#[test]
fn test_file_private_directive() {
    let file = parse_str("#+private\npackage demo\nhelper :: proc() {}\n");
    assert!(find(&file, "helper").is_private);
}

#[test]
fn test_column_zero_declaration_recovers_unclosed_struct() {
    let text = "Broken :: struct {\n\ta: int,\n\nNext :: proc() {}\n";
    let file = parse_str(text);
    assert_eq!(names(&file), vec!["Broken", "Next"]);
    assert_eq!(find(&file, "Broken").fields().len(), 1);
}

#[test]
fn test_unclosed_params_flushed_at_eof() {
    let file = parse_str("typing :: proc(a: int,\n\tb: f32");
    let sig = find(&file, "typing").proc_signature().unwrap().clone();
    assert_eq!(sig.params.len(), 2);
}

#[test]
fn test_name_column_is_byte_offset() {
    let text = "when ODIN_OS == .Windows {\n\t@(private) win_only :: proc() {}\n}\n";
    let file = parse_str(text);
    assert_eq!(find(&file, "win_only").pos, LineCol::new(1, 12));
}

#[test]
fn test_symbols_carry_file_path() {
    let file = parse_str("x :: 1\n");
    assert_eq!(&*file.symbols[0].file, Path::new("/proj/app/main.odin"));
}

#[test]
fn test_parse_is_deterministic() {
    let text = "package p\nimport \"core:fmt\"\nA :: struct { a: int }\nf :: proc() {}\n";
    assert_eq!(parse_str(text), parse_str(text));
}
