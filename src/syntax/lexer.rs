//! Lexical helpers for the line-oriented parser.
//!
//! Nothing here builds tokens. These are small scanners over one line (or a
//! joined run of lines) that know just enough about Odin's literals to keep
//! brackets inside strings and comments from confusing depth counts.

use std::str::CharIndices;

/// Characters of `text` outside string, rune and raw-string literals.
///
/// The quotes themselves are skipped too. An unterminated literal swallows
/// the rest of the text, which is what an editor buffer mid-keystroke needs.
pub(crate) struct CodeChars<'a> {
    inner: CharIndices<'a>,
}

impl<'a> CodeChars<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            inner: text.char_indices(),
        }
    }

    fn skip_literal(&mut self, quote: char) {
        let escapes = quote != '`';
        while let Some((_, c)) = self.inner.next() {
            if escapes && c == '\\' {
                self.inner.next();
            } else if c == quote {
                break;
            }
        }
    }
}

impl Iterator for CodeChars<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<(usize, char)> {
        loop {
            let (i, c) = self.inner.next()?;
            match c {
                '"' | '\'' | '`' => self.skip_literal(c),
                _ => return Some((i, c)),
            }
        }
    }
}

/// Replace comment text with spaces, byte for byte.
///
/// The result has the same length as `raw`, so byte columns computed on it
/// are columns in the raw line. `block_depth` carries `/* */` nesting across
/// lines (Odin block comments nest).
pub(crate) fn mask_comments(raw: &str, block_depth: &mut u32) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if *block_depth > 0 {
            if b == b'*' && next == Some(b'/') {
                *block_depth -= 1;
                out.extend_from_slice(b"  ");
                i += 2;
            } else if b == b'/' && next == Some(b'*') {
                *block_depth += 1;
                out.extend_from_slice(b"  ");
                i += 2;
            } else {
                out.push(b' ');
                i += 1;
            }
            continue;
        }

        match b {
            b'/' if next == Some(b'*') => {
                *block_depth += 1;
                out.extend_from_slice(b"  ");
                i += 2;
            }
            b'/' if next == Some(b'/') => {
                out.resize(bytes.len(), b' ');
                break;
            }
            b'"' | b'\'' | b'`' => {
                let end = literal_end(bytes, i);
                out.extend_from_slice(&bytes[i..end]);
                i = end;
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    // Only ASCII spaces replace bytes, and never inside a multi-byte
    // sequence that is kept, so the result is still UTF-8.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Byte index just past the literal opening at `start`.
fn literal_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Net `{`/`}` count of `text`, ignoring literals.
pub(crate) fn brace_delta(text: &str) -> i32 {
    delta(text, '{', '}')
}

/// Net `(`/`)` count of `text`, ignoring literals.
pub(crate) fn paren_delta(text: &str) -> i32 {
    delta(text, '(', ')')
}

fn delta(text: &str, open: char, close: char) -> i32 {
    CodeChars::new(text).fold(0, |depth, (_, c)| {
        if c == open {
            depth + 1
        } else if c == close {
            depth - 1
        } else {
            depth
        }
    })
}

/// Index of the `}` that brings `depth` to zero, updating `depth` as it
/// scans. `None` means the text ended with the block still open.
pub(crate) fn find_block_end(text: &str, depth: &mut i32) -> Option<usize> {
    for (i, c) in CodeChars::new(text) {
        match c {
            '{' => *depth += 1,
            '}' => {
                *depth -= 1;
                if *depth <= 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_open(c: char) -> bool {
    matches!(c, '(' | '[' | '{')
}

fn is_close(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

/// First index where `pred` holds at bracket depth zero, outside literals.
pub(crate) fn find_top_level(text: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in CodeChars::new(text) {
        if is_close(c) {
            depth -= 1;
        }
        if depth <= 0 && pred(c) {
            return Some(i);
        }
        if is_open(c) {
            depth += 1;
        }
    }
    None
}

/// Index of the bracket closing the one at `open`.
pub(crate) fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in CodeChars::new(&text[open..]) {
        if is_open(c) {
            depth += 1;
        } else if is_close(c) {
            depth -= 1;
            if depth == 0 {
                return Some(open + i);
            }
        }
    }
    None
}

/// Split `text` where `is_sep` holds at bracket depth zero.
pub(crate) fn split_top_level(text: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in CodeChars::new(text) {
        if is_close(c) {
            depth -= 1;
        } else if is_open(c) {
            depth += 1;
        } else if depth <= 0 && is_sep(c) {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte length of the identifier at the start of `text` (0 if none).
pub(crate) fn ident_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c == '_' || unicode_ident::is_xid_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|&(_, c)| !unicode_ident::is_xid_continue(c))
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

pub(crate) fn is_ident(text: &str) -> bool {
    !text.is_empty() && ident_len(text) == text.len()
}

/// `text` without a leading keyword, if the keyword is there as a whole
/// word. The returned rest is not trimmed.
pub(crate) fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if c == '_' || unicode_ident::is_xid_continue(c) => None,
        _ => Some(rest),
    }
}

/// Collapse every whitespace run to one space.
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Element type of `bit_set[E]`, `bit_set[E; u32]` or `distinct bit_set[E]`.
pub fn bit_set_element(ty: &str) -> Option<&str> {
    let ty = ty.trim();
    let ty = strip_keyword(ty, "distinct").map(str::trim_start).unwrap_or(ty);
    let inner = ty.strip_prefix("bit_set")?.trim_start().strip_prefix('[')?;
    let end = inner.find([';', ']'])?;
    let element = inner[..end].trim();
    (!element.is_empty()).then_some(element)
}
