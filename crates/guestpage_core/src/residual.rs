//! Residual template syntax: removal and detection

use crate::blocks::match_blocks;
use crate::error::RewriteError;
use crate::markers::{line_of, tokenize};
use crate::pipeline::splice_tokens;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidualMarker {
    pub line: usize,
    pub raw: String,
}

/// Deletes every control tag and expression marker.
///
/// Deleting a marker can join the text around it into a new marker, so the
/// pass repeats until the text holds none.
pub fn strip_template_syntax(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let tokens = tokenize(&current);
        let stripped = splice_tokens(&current, &tokens, |token| {
            token.is_marker().then(String::new)
        });
        match stripped {
            Some(next) => current = next,
            None => return current,
        }
    }
}

pub fn residual_markers(text: &str) -> Vec<ResidualMarker> {
    tokenize(text)
        .into_iter()
        .filter(|token| token.is_marker())
        .map(|token| ResidualMarker {
            line: line_of(text, token.span.start),
            raw: token.raw(text).to_string(),
        })
        .collect()
}

/// Number of balanced control blocks in `text`.
pub fn check_nesting(text: &str) -> Result<usize, RewriteError> {
    let tokens = tokenize(text);
    match_blocks(text, &tokens).map(|blocks| blocks.len())
}
