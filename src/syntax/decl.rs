//! Payload parsers for the bodies and headers the state machine collects.

use std::sync::Arc;

use super::lexer::{
    find_top_level, ident_len, is_ident, matching_close, split_top_level, squash_whitespace,
    strip_keyword,
};
use crate::hir::{Field, Param, ProcSignature};

fn is_member_sep(c: char) -> bool {
    c == ',' || c == '\n'
}

/// Drop leading `#directive`s (with a parenthesised argument, if any).
fn strip_directives(mut text: &str) -> &str {
    while let Some(rest) = text.strip_prefix('#') {
        let mut end = ident_len(rest);
        if end == 0 {
            break;
        }
        if rest[end..].starts_with('(') {
            match matching_close(rest, end) {
                Some(close) => end = close + 1,
                None => break,
            }
        }
        text = rest[end..].trim_start();
    }
    text
}

/// Struct fields from the text between the braces.
///
/// `a, b: T` gives one field per name; a `using` prefix marks the field as
/// embedded; backtick tags are dropped.
pub(crate) fn parse_fields(body: &str) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for part in split_top_level(body, is_member_sep) {
        let mut part = part.trim();
        if let Some(tag) = part.find('`') {
            part = part[..tag].trim_end();
        }
        part = strip_directives(part);
        let embedded = match strip_keyword(part, "using") {
            Some(rest) => {
                part = rest.trim_start();
                true
            }
            None => false,
        };
        if part.is_empty() {
            continue;
        }

        match find_top_level(part, |c| c == ':') {
            Some(colon) => {
                let ty: Arc<str> = Arc::from(squash_whitespace(&part[colon + 1..]));
                let names = pending.drain(..).chain(std::iter::once(part[..colon].trim()));
                for name in names.filter(|n| is_ident(n)) {
                    fields.push(Field {
                        name: Arc::from(name),
                        ty: ty.clone(),
                        embedded,
                    });
                }
            }
            None if is_ident(part) => pending.push(part),
            None => pending.clear(),
        }
    }

    fields
}

/// Enum variant names, initialisers dropped.
pub(crate) fn parse_variants(body: &str) -> Vec<Arc<str>> {
    split_top_level(body, is_member_sep)
        .into_iter()
        .filter_map(|part| {
            let part = part.trim();
            let len = ident_len(part);
            (len > 0).then(|| Arc::from(&part[..len]))
        })
        .collect()
}

/// Comma/newline separated members with whitespace squashed: union variants
/// and procedure group members.
pub(crate) fn parse_members(body: &str) -> Vec<Arc<str>> {
    split_top_level(body, is_member_sep)
        .into_iter()
        .map(squash_whitespace)
        .filter(|m| !m.is_empty())
        .map(Arc::from)
        .collect()
}

/// Parameter list from the text between a procedure's parentheses.
pub(crate) fn parse_params(text: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    let push = |params: &mut Vec<Param>, name: &str, ty: &str| {
        params.push(Param {
            name: Arc::from(name.trim_start_matches('$')),
            ty: Arc::from(squash_whitespace(ty)),
        });
    };

    for part in split_top_level(text, |c| c == ',') {
        let mut part = strip_directives(part.trim());
        if let Some(rest) = strip_keyword(part, "using") {
            part = rest.trim_start();
        }
        if part.is_empty() {
            continue;
        }

        let Some(colon) = find_top_level(part, |c| c == ':') else {
            pending.push(part);
            continue;
        };
        let names = part[..colon].trim();
        let rest = &part[colon + 1..];

        // `name := default`: the type is not written down.
        let ty = if rest.starts_with('=') {
            ""
        } else {
            match find_top_level(rest, |c| c == '=') {
                Some(eq) => rest[..eq].trim(),
                None => rest.trim(),
            }
        };

        for name in pending.drain(..).chain(std::iter::once(names)) {
            push(&mut params, name.trim(), ty);
        }
    }

    // No colon after them: these were bare types, as in `proc(int, string)`.
    for ty in pending {
        push(&mut params, "", ty);
    }

    params
}

/// A procedure header split into its pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcHeader {
    pub(crate) signature: ProcSignature,
    /// Header text up to (not including) the body or `---`.
    pub(crate) display: String,
    pub(crate) body: ProcBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcBody {
    /// A `{` was seen; the value is the brace depth left open on this text.
    Open(i32),
    /// `---`: a foreign declaration, no body follows.
    Foreign,
    /// Neither yet; the body may start on a later line.
    Missing,
}

/// Parse `[#directive...] proc ["cc"] (params) [-> ret] [where ...] [{ | ---]`.
///
/// Returns `None` when the text is not a procedure header or the parameter
/// list is not closed yet.
pub(crate) fn parse_proc_header(text: &str) -> Option<ProcHeader> {
    let mut directives = Vec::new();
    let mut rest = text.trim_start();
    while let Some(after) = rest.strip_prefix('#') {
        let len = ident_len(after);
        if len == 0 {
            return None;
        }
        directives.push(Arc::from(&rest[..len + 1]));
        rest = after[len..].trim_start();
    }

    rest = strip_keyword(rest, "proc")?.trim_start();
    let mut calling_convention = None;
    if let Some(after) = rest.strip_prefix('"') {
        let end = after.find('"')?;
        calling_convention = Some(Arc::from(&after[..end]));
        rest = after[end + 1..].trim_start();
    }

    if !rest.starts_with('(') {
        return None;
    }
    let close = matching_close(rest, 0)?;
    let params = parse_params(&rest[1..close]);

    let after = &rest[close + 1..];
    let body_at = find_top_level(after, |c| c == '{');
    let foreign_at = after.find("---");
    let header_end = match (body_at, foreign_at) {
        (Some(b), Some(f)) => b.min(f),
        (Some(b), None) => b,
        (None, Some(f)) => f,
        (None, None) => after.len(),
    };

    let tail = after[..header_end].trim();
    let return_type = match tail.strip_prefix("->") {
        Some(ret) => {
            let ret = ret.trim();
            let ret = match ret.find(" where ") {
                Some(w) => &ret[..w],
                None => ret,
            };
            squash_whitespace(ret.trim_end_matches(','))
        }
        None => String::new(),
    };

    let body = match body_at {
        Some(b) if Some(header_end) == body_at => {
            ProcBody::Open(super::lexer::brace_delta(&after[b..]))
        }
        _ if foreign_at.is_some() => ProcBody::Foreign,
        _ => ProcBody::Missing,
    };

    let consumed = text.len() - after.len() + header_end;
    Some(ProcHeader {
        signature: ProcSignature {
            params,
            return_type: Arc::from(return_type),
            calling_convention,
            directives,
        },
        display: squash_whitespace(&text[..consumed]),
        body,
    })
}
