//! Property tests for the text-facing entry points.
//!
//! The parser and the cursor classifier run on every keystroke against
//! half-typed buffers, so neither may panic on any input, and the parser
//! must not invent declarations out of thin air.
#![cfg(feature = "proptest")]

use std::path::Path;

use odex::ide::{classify, word_at};
use odex::syntax::parse;
use odex::{LineIndex, TextSize};
use proptest::prelude::*;

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Fragments that exercise the parser's states: headers, openers, closers,
/// comments and strings, joined in any order.
fn arb_fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "package app\n",
        "import \"core:fmt\"\n",
        "import rl \"vendor:raylib\"\n",
        "Foo :: struct {",
        "x, y: i32,",
        "using base: Base,",
        "}",
        "Clip :: enum u32 { NONE, PART }\n",
        "f :: proc(a: int, b := 2) -> int {",
        "return a\n",
        "g :: proc{f, h}\n",
        "@(private)\n",
        "#+private\n",
        "/* open comment",
        "*/",
        "// line comment {\n",
        "\"str { ( \"",
        "`raw }`",
        "(",
        ")",
        "\n",
        "\t",
        ".",
        "f(.",
        "x == .",
        "é",
    ])
}

/// A buffer assembled from fragments.
fn arb_source() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_fragment(), 0..40).prop_map(|parts| parts.concat())
}

/// A source and a cursor offset somewhere in or past it.
fn arb_source_and_offset() -> impl Strategy<Value = (String, u32)> {
    arb_source().prop_flat_map(|text| {
        let len = text.len() as u32;
        (Just(text), 0..=len + 4)
    })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn parse_never_panics_on_fragments(text in arb_source()) {
        let parsed = parse(Path::new("/mem/app/fuzz.odin"), &text);
        let lines = LineIndex::new(&text);
        for symbol in &parsed.symbols {
            prop_assert!(!symbol.name.is_empty());
            prop_assert!((symbol.pos.line as usize) < lines.len());
        }
    }

    #[test]
    fn parse_never_panics_on_arbitrary_text(text in "\\PC{0,200}") {
        let _ = parse(Path::new("/mem/app/fuzz.odin"), &text);
    }

    #[test]
    fn declarations_are_found_in_the_text(text in arb_source()) {
        let parsed = parse(Path::new("/mem/app/fuzz.odin"), &text);
        for symbol in &parsed.symbols {
            prop_assert!(text.contains(&*symbol.name), "{} not in source", symbol.name);
        }
    }

    #[test]
    fn classify_never_panics((text, offset) in arb_source_and_offset()) {
        let request = classify(&text, TextSize::from(offset));
        prop_assert!(request.prefix.chars().all(|c| c == '_' || unicode_ident::is_xid_continue(c)));
        let _ = word_at(&text, TextSize::from(offset));
    }
}
