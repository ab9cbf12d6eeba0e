//! Cursor context: what a completion request at an offset is asking for.
//!
//! Everything here is textual. The classifier looks at the current line,
//! up to five lines above it for open calls, and the whole buffer for the
//! declared types of variables. It never consults the index; the
//! [`CompletionContext`] it returns is resolved later by
//! [`complete`](super::completion::complete).

use std::path::Path;
use std::sync::Arc;

use smol_str::SmolStr;

use super::completion::CompletionContext;
use crate::base::{LineIndex, TextSize};
use crate::hir::EnumContext;
use crate::syntax::{self, CodeChars, ident_len, mask_comments};

/// Lines above the cursor searched for an enclosing call.
const LOOKBACK_LINES: u32 = 5;

/// A `.` right after one of these (or after nothing) is an implicit
/// selector: `.VARIANT` with the enum type left to context.
const IMPLICIT_AFTER: &[char] = &['(', ',', '=', '{', '!', '<', '>', '+', '&', '|'];

/// Words that cannot be a chain root.
const KEYWORDS: &[&str] = &["case", "return", "in", "not_in", "or_else", "do", "if", "for", "when"];

/// Words a declared type can never be.
const NOT_TYPES: &[&str] = &["struct", "enum", "union", "proc", "bit_field", "distinct", "map"];

/// A classified completion request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The identifier characters typed before the cursor.
    pub prefix: SmolStr,
    pub context: CompletionContext,
}

/// Classify a completion request at byte `offset` in `text`.
///
/// Falls back to [`CompletionContext::Unscoped`] whenever the text does
/// not say more.
pub fn classify(text: &str, offset: TextSize) -> CompletionRequest {
    let offset = floor_char_boundary(text, usize::from(offset));
    let lines = LineIndex::new(text);
    let cursor = TextSize::from(offset as u32);
    let line_start = usize::from(lines.start_of_line_above(cursor, 0));

    let line = &text[line_start..offset];
    let prefix = &line[line.len() - trailing_ident_len(line)..];
    let before = line[..line.len() - prefix.len()].trim_end();

    let context = before
        .strip_suffix('.')
        .filter(|rest| !rest.ends_with('.'))
        .and_then(|rest| {
            let before_dot = rest.trim_end();
            let dot_end = line_start + before_dot.len();
            let is_implicit = before_dot
                .chars()
                .next_back()
                .is_none_or(|c| IMPLICIT_AFTER.contains(&c));

            if is_implicit {
                let window_start = usize::from(lines.start_of_line_above(cursor, LOOKBACK_LINES));
                implicit_context(text, &mask_lines(&text[window_start..dot_end]), dot_end)
            } else {
                chain_context(text, before_dot, dot_end)
            }
        })
        .unwrap_or(CompletionContext::Unscoped);

    CompletionRequest {
        prefix: SmolStr::new(prefix),
        context,
    }
}

/// The name under the cursor, qualified with the identifier before a dot
/// when there is one: `rl.DrawText` for a cursor anywhere in `DrawText`.
pub fn word_at(text: &str, offset: TextSize) -> Option<String> {
    let offset = floor_char_boundary(text, usize::from(offset));
    let start = offset - trailing_ident_len(&text[..offset]);
    let end = offset + leading_ident_len(&text[offset..]);
    let word = &text[start..end];
    if ident_len(word) != word.len() || word.is_empty() {
        return None;
    }

    let before = text[..start].trim_end();
    let qualifier = before.strip_suffix('.').map(str::trim_end).and_then(|rest| {
        let len = trailing_ident_len(rest);
        let qualifier = &rest[rest.len() - len..];
        (len > 0 && ident_len(qualifier) == len).then_some(qualifier)
    });
    Some(match qualifier {
        Some(qualifier) => format!("{qualifier}.{word}"),
        None => word.to_string(),
    })
}

// ----------------------------------------------------------------------------
// Implicit selectors
// ----------------------------------------------------------------------------

/// The enum context of an implicit selector whose dot ends `window`.
fn implicit_context(text: &str, window: &str, dot_end: usize) -> Option<CompletionContext> {
    let before = window.trim_end();

    if let Some(context) = assignment_context(text, before, dot_end) {
        return Some(context);
    }

    let frames = open_frames(window);
    let (innermost, outer) = frames.split_last()?;
    let context = match innermost.open {
        '(' => call_context(window, innermost)?,
        '{' => {
            let head = window[..innermost.pos].trim_end();
            if head.ends_with('=') {
                assignment_context(text, head, dot_end)?
            } else {
                // `f(x, {.A, .` passes the literal as an argument.
                let outer = outer.last().filter(|f| f.open == '(' && is_argument_start(window, f, innermost))?;
                call_context(window, outer)?
            }
        }
        _ => return None,
    };
    Some(context)
}

/// `x: T = .`, `x = .`, `x == .` and `x != .`.
fn assignment_context(text: &str, before: &str, dot_end: usize) -> Option<CompletionContext> {
    if let Some(lhs) = before.strip_suffix("==").or_else(|| before.strip_suffix("!=")) {
        let operand = trailing_word(lhs.trim_end())?;
        let ty = variable_type(text, operand, dot_end)?;
        return Some(CompletionContext::ImplicitEnum(EnumContext::Comparison {
            operand_type: Arc::from(ty),
        }));
    }

    let lhs = before.strip_suffix('=')?;
    if lhs.ends_with(|c: char| "=!<>:+-*/%|&~^".contains(c)) {
        return None;
    }
    let lhs = lhs.rsplit('\n').next().unwrap_or(lhs).trim_end();
    let declared_type = match lhs.rsplit_once(':') {
        // `x: T =`, but not `x :: =`.
        Some((name, ty)) if !name.ends_with(':') && is_type_token(ty.trim()) => ty.trim().to_string(),
        _ => variable_type(text, trailing_word(lhs)?, dot_end)?,
    };
    Some(CompletionContext::ImplicitEnum(EnumContext::Declaration {
        declared_type: Arc::from(declared_type),
    }))
}

fn call_context(window: &str, frame: &Frame) -> Option<CompletionContext> {
    let head = window[..frame.pos].trim_end();
    let len = trailing_chain_len(head);
    let callee = &head[head.len() - len..];
    if callee.is_empty() || ident_len(callee) == 0 {
        return None;
    }
    Some(CompletionContext::ImplicitEnum(EnumContext::Call {
        callee: Arc::from(callee),
        index: frame.commas,
    }))
}

/// Whether only whitespace separates `inner`'s brace from the start of the
/// current argument of `call`.
fn is_argument_start(window: &str, call: &Frame, inner: &Frame) -> bool {
    let start = call.last_comma.unwrap_or(call.pos) + 1;
    window[start..inner.pos].trim().is_empty()
}

/// An unclosed bracket.
#[derive(Clone, Copy, Debug)]
struct Frame {
    open: char,
    pos: usize,
    /// Commas seen directly inside this bracket.
    commas: usize,
    last_comma: Option<usize>,
}

/// Brackets still open at the end of `window`, outermost first. Literals
/// are skipped.
fn open_frames(window: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for (i, c) in CodeChars::new(window) {
        match c {
            '(' | '{' | '[' => frames.push(Frame {
                open: c,
                pos: i,
                commas: 0,
                last_comma: None,
            }),
            ')' | '}' | ']' => {
                frames.pop();
            }
            ',' => {
                if let Some(top) = frames.last_mut() {
                    top.commas += 1;
                    top.last_comma = Some(i);
                }
            }
            _ => {}
        }
    }
    frames
}

// ----------------------------------------------------------------------------
// Dotted chains
// ----------------------------------------------------------------------------

fn chain_context(text: &str, before_dot: &str, dot_end: usize) -> Option<CompletionContext> {
    let parts = chain_parts(before_dot)?;
    let (root, rest) = parts.split_first()?;

    if *root == "case" && rest.is_empty() {
        return switch_context(text, dot_end);
    }
    if KEYWORDS.contains(root) && rest.is_empty() {
        return None;
    }

    let parsed = syntax::parse(Path::new(""), text);
    if parsed.imports.iter().any(|import| &*import.alias == *root) {
        return Some(match rest {
            [] => CompletionContext::Package {
                alias: Arc::from(*root),
            },
            [member] => CompletionContext::EnumVariant {
                enum_type: Arc::from(format!("{root}.{member}")),
            },
            [member, path @ ..] => CompletionContext::FieldChain {
                base_type: Arc::from(format!("{root}.{member}")),
                path: path.iter().map(|s| Arc::from(*s)).collect(),
            },
        });
    }

    let path: Vec<Arc<str>> = rest.iter().map(|s| Arc::from(*s)).collect();
    Some(match variable_type(text, root, dot_end) {
        Some(ty) => CompletionContext::FieldChain {
            base_type: Arc::from(ty),
            path,
        },
        None if path.is_empty() => CompletionContext::EnumVariant {
            enum_type: Arc::from(*root),
        },
        None => CompletionContext::FieldChain {
            base_type: Arc::from(*root),
            path,
        },
    })
}

/// `a.b .c` → `["a", "b", "c"]`. `None` when any segment is not a plain
/// identifier (a call, an index, a number).
fn chain_parts(before_dot: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut rest = before_dot.trim_end();
    loop {
        let len = trailing_ident_len(rest);
        let segment = &rest[rest.len() - len..];
        if len == 0 || ident_len(segment) != len {
            return None;
        }
        parts.push(segment);
        rest = rest[..rest.len() - len].trim_end();
        match rest.strip_suffix('.') {
            Some(more) if !more.ends_with('.') => rest = more.trim_end(),
            _ => break,
        }
    }
    parts.reverse();
    Some(parts)
}

/// `case .` inside `switch x {`: the type of the nearest switch subject.
fn switch_context(text: &str, dot_end: usize) -> Option<CompletionContext> {
    let masked = mask_lines(&text[..dot_end]);
    let at = masked.rfind("switch")?;
    let subject = masked[at + "switch".len()..].split('{').next()?.trim();
    // `switch x in y` is a type switch; `switch v := f(); v` uses the tail.
    let subject = subject.rsplit(';').next()?.trim();
    let operand = trailing_word(subject)?;
    let ty = variable_type(text, operand, dot_end)?;
    Some(CompletionContext::ImplicitEnum(EnumContext::Comparison {
        operand_type: Arc::from(ty),
    }))
}

// ----------------------------------------------------------------------------
// Variable types
// ----------------------------------------------------------------------------

/// Declared type of `name` found textually in `text`.
///
/// Accepts `name: T` (parameters, fields, typed declarations) and
/// `name := T{...}` / `name := &T{...}`. The nearest declaration before
/// `before` wins; failing that, the first one after it.
pub fn variable_type(text: &str, name: &str, before: usize) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let masked = mask_lines(text);
    let mut nearest_before = None;
    let mut first_after = None;

    for (at, _) in masked.match_indices(name) {
        let preceded_ok = masked[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(is_ident_char(c) || c == '.'));
        if !preceded_ok || ident_len(&masked[at..]) != name.len() {
            continue;
        }
        let Some(ty) = declared_type_after(&masked[at + name.len()..]) else {
            continue;
        };
        if at < before {
            nearest_before = Some(ty);
        } else if first_after.is_none() {
            first_after = Some(ty);
        }
    }
    nearest_before.or(first_after)
}

/// The type in `: T` or `:= T{` at the start of `rest`.
fn declared_type_after(rest: &str) -> Option<String> {
    let rest = rest.trim_start().strip_prefix(':')?;
    if rest.starts_with(':') {
        return None;
    }
    if let Some(value) = rest.strip_prefix('=') {
        let value = value.trim_start();
        let value = value.strip_prefix('&').unwrap_or(value).trim_start();
        let len = leading_chain_len(value);
        let ty = &value[..len];
        return (len > 0 && value[len..].trim_start().starts_with('{') && is_type_text(ty)).then(|| ty.to_string());
    }
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace() || ",)={};".contains(c))
        .unwrap_or(rest.len());
    let ty = &rest[..end];
    is_type_text(ty).then(|| ty.to_string())
}

fn is_type_text(ty: &str) -> bool {
    let name = ty.trim_start_matches('^');
    !name.is_empty() && ident_len(name) > 0 && !NOT_TYPES.contains(&name)
}

/// A whole type written as one token: `T`, `^T` or `pkg.T`.
fn is_type_token(ty: &str) -> bool {
    is_type_text(ty) && ty.chars().all(|c| is_ident_char(c) || c == '.' || c == '^')
}

// ----------------------------------------------------------------------------
// Small scanners
// ----------------------------------------------------------------------------

/// `text` with comments blanked out line by line, same length.
fn mask_lines(text: &str) -> String {
    let mut depth = 0;
    text.split('\n')
        .map(|line| mask_comments(line, &mut depth))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_ident_char(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

/// Byte length of the identifier characters ending `text`.
fn trailing_ident_len(text: &str) -> usize {
    text.chars()
        .rev()
        .take_while(|&c| is_ident_char(c))
        .map(char::len_utf8)
        .sum()
}

/// Byte length of the identifier characters starting `text`.
fn leading_ident_len(text: &str) -> usize {
    text.chars()
        .take_while(|&c| is_ident_char(c))
        .map(char::len_utf8)
        .sum()
}

/// Byte length of the `a.b.c` chain ending `text`.
fn trailing_chain_len(text: &str) -> usize {
    text.chars()
        .rev()
        .take_while(|&c| is_ident_char(c) || c == '.')
        .map(char::len_utf8)
        .sum::<usize>()
}

/// Byte length of the `a.b.c` chain starting `text`.
fn leading_chain_len(text: &str) -> usize {
    text.chars()
        .take_while(|&c| is_ident_char(c) || c == '.')
        .map(char::len_utf8)
        .sum()
}

/// The last identifier of `text`, if `text` ends in one.
fn trailing_word(text: &str) -> Option<&str> {
    let len = trailing_ident_len(text);
    let word = &text[text.len() - len..];
    (len > 0 && ident_len(word) == len).then_some(word)
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
