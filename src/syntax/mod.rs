// Odin source parsing: text in, symbols and imports out.
mod decl;
mod lexer;
mod parser;

pub use lexer::bit_set_element;
pub(crate) use lexer::{CodeChars, ident_len, mask_comments};
pub use parser::{ParsedFile, parse};

#[cfg(test)]
mod tests;
