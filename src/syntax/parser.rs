//! The line state machine.
//!
//! Each line is first passed through [`mask_comments`], which owns the
//! block-comment state (nesting depth carried across lines), so the states
//! below only ever see code. A line that fits no known shape is inert; a
//! construct left open when the text ends or when a new top-level
//! declaration starts at column 0 is emitted with whatever was collected.

use std::mem;
use std::path::Path;
use std::sync::Arc;

use super::decl::{self, ProcBody, ProcHeader};
use super::lexer::{
    brace_delta, find_block_end, find_top_level, ident_len, is_ident, mask_comments, matching_close,
    paren_delta, split_top_level, squash_whitespace, strip_keyword,
};
use crate::base::LineCol;
use crate::hir::{Import, ImportSource, Symbol, SymbolData, SymbolKind};

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    /// Name from the `package` clause.
    pub package_name: Option<Arc<str>>,
    /// Declarations in source order.
    pub symbols: Vec<Symbol>,
    /// Imports in source order. Aliases may repeat; the last one wins.
    pub imports: Vec<Import>,
}

/// Parse one file's text. Never fails: what cannot be classified is skipped.
pub fn parse(path: &Path, text: &str) -> ParsedFile {
    let mut parser = LineParser::new(path);
    for (line, raw) in text.lines().enumerate() {
        parser.line(line as u32, raw);
    }
    parser.finish()
}

/// Name, position and attributes of a declaration being built.
#[derive(Debug)]
struct Header {
    name: Arc<str>,
    pos: LineCol,
    attributes: Vec<Arc<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Struct,
    Enum,
    Union,
    ProcGroup,
}

#[derive(Debug)]
enum State {
    TopLevel,
    /// Parameter list still open; `text` is everything after `::`.
    InMultilineProc { header: Header, text: String },
    /// Parameters closed but no body, `---` or other terminator seen yet.
    AwaitingProcBody { header: Header, text: String },
    InProcBody { depth: i32 },
    /// Struct, enum, union or procedure-group members.
    InMultilineMembers {
        header: Header,
        shape: Shape,
        head: String,
        body: String,
        depth: i32,
        opened: bool,
    },
    /// A multi-line constant or variable initialiser.
    SkipBlock { depth: i32 },
}

struct LineParser {
    file: Arc<Path>,
    state: State,
    comment_depth: u32,
    /// Attributes seen on their own line(s), waiting for a declaration.
    attributes: Vec<Arc<str>>,
    /// `#+private` seen: everything after it is file-private.
    file_private: bool,
    out: ParsedFile,
}

impl LineParser {
    fn new(path: &Path) -> Self {
        Self {
            file: Arc::from(path),
            state: State::TopLevel,
            comment_depth: 0,
            attributes: Vec::new(),
            file_private: false,
            out: ParsedFile::default(),
        }
    }

    fn line(&mut self, line: u32, raw: &str) {
        let code = mask_comments(raw, &mut self.comment_depth);
        if code.trim().is_empty() {
            return;
        }
        let state = mem::replace(&mut self.state, State::TopLevel);
        self.state = self.step(state, line, &code);
    }

    fn finish(mut self) -> ParsedFile {
        let state = mem::replace(&mut self.state, State::TopLevel);
        self.flush(state);
        self.out
    }

    fn step(&mut self, state: State, line: u32, code: &str) -> State {
        if !matches!(state, State::TopLevel) && starts_declaration(code) {
            self.flush(state);
            return self.top_level(line, code);
        }

        match state {
            State::TopLevel => self.top_level(line, code),
            State::InMultilineProc { header, mut text } => {
                text.push(' ');
                text.push_str(code.trim());
                self.continue_proc(header, text)
            }
            State::AwaitingProcBody { header, mut text } => {
                let trimmed = code.trim();
                let continues = trimmed.starts_with('{')
                    || trimmed.starts_with("->")
                    || trimmed.starts_with("---")
                    || strip_keyword(trimmed, "where").is_some()
                    || text.trim_end().ends_with("->");
                if continues {
                    text.push(' ');
                    text.push_str(trimmed);
                    self.continue_proc(header, text)
                } else {
                    self.flush(State::AwaitingProcBody { header, text });
                    self.top_level(line, code)
                }
            }
            State::InProcBody { mut depth } => match find_block_end(code, &mut depth) {
                Some(_) => State::TopLevel,
                None => State::InProcBody { depth },
            },
            State::SkipBlock { mut depth } => match find_block_end(code, &mut depth) {
                Some(_) => State::TopLevel,
                None => State::SkipBlock { depth },
            },
            State::InMultilineMembers {
                header,
                shape,
                mut head,
                body,
                depth,
                opened,
            } => {
                if opened {
                    return self.feed_members(header, shape, head, body, depth, code);
                }
                match find_top_level(code, |c| c == '{') {
                    Some(brace) => {
                        head.push(' ');
                        head.push_str(&code[..brace]);
                        self.feed_members(header, shape, head, body, 1, &code[brace + 1..])
                    }
                    None => {
                        head.push(' ');
                        head.push_str(code.trim());
                        State::InMultilineMembers {
                            header,
                            shape,
                            head,
                            body,
                            depth,
                            opened,
                        }
                    }
                }
            }
        }
    }

    /// Emit whatever an unfinished state has collected.
    fn flush(&mut self, state: State) {
        match state {
            State::TopLevel | State::InProcBody { .. } | State::SkipBlock { .. } => {}
            State::InMultilineProc { header, text } => {
                let closed = format!("{text})");
                if let Some(proc_header) =
                    decl::parse_proc_header(&closed).or_else(|| decl::parse_proc_header(&text))
                {
                    self.emit_proc(header, proc_header);
                }
            }
            State::AwaitingProcBody { header, text } => {
                if let Some(proc_header) = decl::parse_proc_header(&text) {
                    self.emit_proc(header, proc_header);
                }
            }
            State::InMultilineMembers {
                header,
                shape,
                head,
                body,
                ..
            } => self.emit_members(header, shape, &head, &body),
        }
    }

    fn top_level(&mut self, line: u32, code: &str) -> State {
        let mut rest = code.trim_start();

        if let Some(after) = strip_keyword(rest, "package") {
            let after = after.trim_start();
            let len = ident_len(after);
            if len > 0 {
                self.out.package_name = Some(Arc::from(&after[..len]));
            }
            self.attributes.clear();
            return State::TopLevel;
        }
        if rest.starts_with("#+private") {
            self.file_private = true;
            return State::TopLevel;
        }
        if let Some(after) = strip_keyword(rest, "foreign") {
            if strip_keyword(after.trim_start(), "import").is_some() {
                self.attributes.clear();
                return State::TopLevel;
            }
        }
        if let Some(after) = strip_keyword(rest, "import") {
            let col = (code.len() - rest.len()) as u32;
            self.import(LineCol::new(line, col), after);
            self.attributes.clear();
            return State::TopLevel;
        }

        while rest.starts_with('@') {
            match self.attribute(rest) {
                Some(len) => rest = rest[len..].trim_start(),
                None => break,
            }
        }
        if rest.trim().is_empty() {
            return State::TopLevel;
        }

        let name_len = ident_len(rest);
        if name_len == 0 {
            self.attributes.clear();
            return State::TopLevel;
        }
        let col = (code.len() - rest.len()) as u32;
        let header = Header {
            name: Arc::from(&rest[..name_len]),
            pos: LineCol::new(line, col),
            attributes: mem::take(&mut self.attributes),
        };
        let after = rest[name_len..].trim_start();

        if let Some(value) = after.strip_prefix("::") {
            self.constant(header, value.trim())
        } else if let Some(value) = after.strip_prefix(":=") {
            let value = value.trim();
            let signature = format!("{} := {}", header.name, block_head(value));
            self.value_decl(header, SymbolKind::Variable, value, value, signature)
        } else if let Some(typed) = after.strip_prefix(':') {
            self.typed(header, typed)
        } else {
            State::TopLevel
        }
    }

    /// Parse one `@name` or `@(...)` attribute at the start of `text`,
    /// returning its byte length.
    fn attribute(&mut self, text: &str) -> Option<usize> {
        let after = &text[1..];
        if after.starts_with('(') {
            let close = matching_close(after, 0)?;
            for item in split_top_level(&after[1..close], |c| c == ',') {
                let item = squash_whitespace(item);
                if !item.is_empty() {
                    self.attributes.push(Arc::from(item));
                }
            }
            Some(close + 2)
        } else {
            let len = ident_len(after);
            if len == 0 {
                return None;
            }
            self.attributes.push(Arc::from(&after[..len]));
            Some(len + 1)
        }
    }

    fn import(&mut self, pos: LineCol, after: &str) {
        let mut rest = after.trim_start();
        let mut alias = None;
        let len = ident_len(rest);
        if len > 0 {
            alias = Some(&rest[..len]);
            rest = rest[len..].trim_start();
        }
        let Some(quoted) = rest.strip_prefix('"') else {
            return;
        };
        let Some(end) = quoted.find('"') else {
            return;
        };
        let specifier = &quoted[..end];
        if specifier.is_empty() {
            return;
        }

        let source = match specifier.split_once(':') {
            // A one-letter prefix is a drive letter, not a collection.
            Some((collection, path)) if collection.len() > 1 && is_ident(collection) => {
                ImportSource::Collection {
                    collection: Arc::from(collection),
                    path: Arc::from(path),
                }
            }
            _ => ImportSource::Relative(Arc::from(specifier)),
        };
        self.out.imports.push(Import::new(alias, source, pos));
    }

    /// `NAME :: ...`
    fn constant(&mut self, header: Header, value: &str) -> State {
        if value.is_empty() {
            return State::TopLevel;
        }
        let signature = format!("{} :: {}", header.name, block_head(value));

        if value.starts_with("#config") {
            return self.value_decl(header, SymbolKind::Constant, value, value, signature);
        }
        if ["#type", "#soa", "#simd", "#sparse"]
            .iter()
            .any(|d| strip_keyword(value, d).is_some())
        {
            return self.value_decl(header, SymbolKind::TypeAlias, value, value, signature);
        }

        let mut after_directives = value;
        while let Some(rest) = after_directives.strip_prefix('#') {
            let len = ident_len(rest);
            if len == 0 {
                break;
            }
            after_directives = rest[len..].trim_start();
        }
        if let Some(after_proc) = strip_keyword(after_directives, "proc") {
            let after_proc = after_proc.trim_start();
            if after_directives.len() == value.len() && after_proc.starts_with('{') {
                return self.start_members(header, Shape::ProcGroup, "proc", &after_proc[1..]);
            }
            return self.continue_proc(header, value.to_string());
        }

        for (keyword, shape) in [
            ("struct", Shape::Struct),
            ("enum", Shape::Enum),
            ("union", Shape::Union),
        ] {
            if strip_keyword(value, keyword).is_some() {
                return match find_top_level(value, |c| c == '{') {
                    Some(brace) => {
                        self.start_members(header, shape, &value[..brace], &value[brace + 1..])
                    }
                    None => State::InMultilineMembers {
                        header,
                        shape,
                        head: value.to_string(),
                        body: String::new(),
                        depth: 0,
                        opened: false,
                    },
                };
            }
        }

        let kind = if is_type_expr(value, &header.name, &self.out.imports) {
            SymbolKind::TypeAlias
        } else {
            SymbolKind::Constant
        };
        self.value_decl(header, kind, value, value, signature)
    }

    /// `name : T : value`, `name : T = value` or `name : T`.
    fn typed(&mut self, header: Header, text: &str) -> State {
        match find_top_level(text, |c| c == ':' || c == '=') {
            Some(i) if text[i..].starts_with(':') => {
                let ty = text[..i].trim();
                let value = text[i + 1..].trim();
                let signature = format!("{} : {} : {}", header.name, ty, block_head(value));
                let shown = if ty.is_empty() { value } else { ty };
                self.value_decl(header, SymbolKind::Constant, shown, value, signature)
            }
            Some(i) => {
                let ty = text[..i].trim();
                let value = text[i + 1..].trim();
                let signature = format!("{}: {}", header.name, squash_whitespace(ty));
                self.value_decl(header, SymbolKind::Variable, ty, value, signature)
            }
            None => {
                let ty = text.trim();
                if ty.is_empty() {
                    return State::TopLevel;
                }
                let signature = format!("{}: {}", header.name, squash_whitespace(ty));
                self.value_decl(header, SymbolKind::Variable, ty, ty, signature)
            }
        }
    }

    /// Emit a single-string symbol; skip its initialiser block if one opens.
    fn value_decl(
        &mut self,
        header: Header,
        kind: SymbolKind,
        shown: &str,
        value: &str,
        signature: String,
    ) -> State {
        let data = SymbolData::Value(Arc::from(block_head(shown)));
        self.emit(header, kind, data, signature);
        match brace_delta(value) {
            depth if depth > 0 => State::SkipBlock { depth },
            _ => State::TopLevel,
        }
    }

    fn continue_proc(&mut self, header: Header, text: String) -> State {
        if paren_delta(&text) > 0 {
            return State::InMultilineProc { header, text };
        }
        let Some(proc_header) = decl::parse_proc_header(&text) else {
            return State::TopLevel;
        };
        match proc_header.body {
            ProcBody::Missing => State::AwaitingProcBody { header, text },
            ProcBody::Foreign => {
                self.emit_proc(header, proc_header);
                State::TopLevel
            }
            ProcBody::Open(depth) => {
                self.emit_proc(header, proc_header);
                if depth > 0 {
                    State::InProcBody { depth }
                } else {
                    State::TopLevel
                }
            }
        }
    }

    fn start_members(&mut self, header: Header, shape: Shape, head: &str, after_brace: &str) -> State {
        self.feed_members(header, shape, head.to_string(), String::new(), 1, after_brace)
    }

    fn feed_members(
        &mut self,
        header: Header,
        shape: Shape,
        head: String,
        mut body: String,
        mut depth: i32,
        segment: &str,
    ) -> State {
        match find_block_end(segment, &mut depth) {
            Some(end) => {
                body.push_str(&segment[..end]);
                self.emit_members(header, shape, &head, &body);
                State::TopLevel
            }
            None => {
                body.push_str(segment);
                body.push('\n');
                State::InMultilineMembers {
                    header,
                    shape,
                    head,
                    body,
                    depth,
                    opened: true,
                }
            }
        }
    }

    fn emit_proc(&mut self, header: Header, proc_header: ProcHeader) {
        let signature = format!("{} :: {}", header.name, proc_header.display);
        let data = SymbolData::Procedure(proc_header.signature);
        self.emit(header, SymbolKind::Procedure, data, signature);
    }

    fn emit_members(&mut self, header: Header, shape: Shape, head: &str, body: &str) {
        let head = squash_whitespace(head);
        let signature = format!("{} :: {}", header.name, head);
        let (kind, data, signature) = match shape {
            Shape::Struct => (
                SymbolKind::Struct,
                SymbolData::Struct(decl::parse_fields(body)),
                signature,
            ),
            Shape::Enum => {
                let backing_type = strip_keyword(&head, "enum")
                    .map(|clause| clause.rsplit(';').next().unwrap_or(clause).trim())
                    .filter(|clause| !clause.is_empty())
                    .map(Arc::from);
                let variants = decl::parse_variants(body);
                (
                    SymbolKind::Enum,
                    SymbolData::Enum {
                        variants,
                        backing_type,
                    },
                    signature,
                )
            }
            Shape::Union => {
                let members = decl::parse_members(body).join(", ");
                (SymbolKind::Union, SymbolData::Value(Arc::from(members)), signature)
            }
            Shape::ProcGroup => {
                let members = decl::parse_members(body);
                let signature = format!("{} :: proc{{{}}}", header.name, members.join(", "));
                (SymbolKind::Procedure, SymbolData::ProcGroup(members), signature)
            }
        };
        self.emit(header, kind, data, signature);
    }

    fn emit(&mut self, header: Header, kind: SymbolKind, data: SymbolData, signature: String) {
        let is_private = self.file_private || header.attributes.iter().any(|a| is_private_attribute(a));
        self.out.symbols.push(Symbol {
            name: header.name,
            kind,
            signature: Arc::from(signature),
            file: self.file.clone(),
            pos: header.pos,
            attributes: header.attributes,
            is_private,
            data,
        });
    }
}

/// `@(private)` or `@(private="file")`.
fn is_private_attribute(attribute: &str) -> bool {
    attribute.split('=').next().map(str::trim) == Some("private")
}

/// Text before an initialiser's opening brace, squashed.
fn block_head(value: &str) -> String {
    let head = if brace_delta(value) > 0 {
        find_top_level(value, |c| c == '{').map_or(value, |b| &value[..b])
    } else {
        value
    };
    squash_whitespace(head)
}

/// A column-0 line that can only be the start of a new top-level
/// declaration. Used to recover from constructs that never closed.
fn starts_declaration(code: &str) -> bool {
    if code.starts_with('@')
        || strip_keyword(code, "import").is_some()
        || strip_keyword(code, "package").is_some()
    {
        return true;
    }
    let len = ident_len(code);
    len > 0 && code[len..].trim_start().starts_with("::")
}

const BUILTIN_TYPES: &[&str] = &[
    "bool", "b8", "b16", "b32", "b64", "int", "uint", "i8", "i16", "i32", "i64", "i128", "u8",
    "u16", "u32", "u64", "u128", "uintptr", "i16le", "i32le", "i64le", "u16le", "u32le", "u64le",
    "i16be", "i32be", "i64be", "u16be", "u32be", "u64be", "f16", "f32", "f64", "complex32",
    "complex64", "complex128", "quaternion64", "quaternion128", "quaternion256", "rune", "string",
    "cstring", "rawptr", "typeid", "any",
];

/// Whether the right-hand side of `::` reads as a type rather than a value.
///
/// Type constructors and builtin type names always do. A bare name counts
/// when it is written like a type (`Shape`, `rl.Color`) and the declared name
/// is not a SCREAMING_CASE constant; a qualifier must be one of this file's
/// import aliases, so `Color.Red` stays a value.
fn is_type_expr(value: &str, declared: &str, imports: &[Import]) -> bool {
    const TYPE_PREFIXES: &[&str] = &["bit_set[", "^", "[", "map[", "matrix["];
    if TYPE_PREFIXES.iter().any(|p| value.starts_with(p))
        || strip_keyword(value, "distinct").is_some()
        || strip_keyword(value, "bit_field").is_some()
    {
        return true;
    }

    // `Name`, `pkg.Name` or `Name(args)`, and nothing after it.
    let first = ident_len(value);
    if first == 0 {
        return false;
    }
    let mut name_end = first;
    if value[first..].starts_with('.') {
        let second = ident_len(&value[first + 1..]);
        if second == 0 {
            return false;
        }
        let qualifier = &value[..first];
        if !imports.iter().any(|import| &*import.alias == qualifier) {
            return false;
        }
        name_end += 1 + second;
    }
    let tail = value[name_end..].trim_start();
    let tail_ok = tail.is_empty()
        || (tail.starts_with('(') && matching_close(tail, 0) == Some(tail.len() - 1));
    if !tail_ok {
        return false;
    }

    let name = &value[..name_end];
    let last = name.rsplit('.').next().unwrap_or(name);
    if BUILTIN_TYPES.contains(&last) {
        return true;
    }
    let looks_like_type =
        last.starts_with(|c: char| c.is_uppercase()) && last.chars().any(|c| c.is_lowercase());
    looks_like_type && declared.chars().any(|c| c.is_lowercase())
}
