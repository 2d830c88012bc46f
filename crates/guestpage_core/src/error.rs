use thiserror::Error;

use crate::blocks::BlockKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("{kind} at line {line} has no matching terminator")]
    MalformedNesting { kind: BlockKind, line: usize },
    #[error("unexpected {kind} terminator at line {line}")]
    UnexpectedTerminator { kind: BlockKind, line: usize },
    #[error("else at line {line} is outside any conditional")]
    StrayElse { line: usize },
}

impl RewriteError {
    pub fn line(&self) -> usize {
        match self {
            RewriteError::MalformedNesting { line, .. } => *line,
            RewriteError::UnexpectedTerminator { line, .. } => *line,
            RewriteError::StrayElse { line } => *line,
        }
    }
}
