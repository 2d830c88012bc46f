//! Control block resolution over a token stream

use std::fmt;

use crate::error::RewriteError;
use crate::markers::{Tag, Token, line_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Conditional,
    Loop,
}

impl BlockKind {
    fn opens(self, tag: &Tag) -> bool {
        match self {
            BlockKind::Conditional => matches!(tag, Tag::If(_)),
            BlockKind::Loop => matches!(tag, Tag::For { .. }),
        }
    }

    fn closes(self, tag: &Tag) -> bool {
        match self {
            BlockKind::Conditional => matches!(tag, Tag::Endif),
            BlockKind::Loop => matches!(tag, Tag::Endfor),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Conditional => f.write_str("conditional"),
            BlockKind::Loop => f.write_str("loop"),
        }
    }
}

/// One resolved block, as token indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    pub kind: BlockKind,
    pub open: usize,
    pub else_index: Option<usize>,
    pub close: usize,
}

/// Finds the `else` belonging to the conditional opened at `if_index`.
///
/// Returns `None` when the conditional closes, or the stream ends, before an
/// `else` is seen at its own depth.
pub fn find_else(tokens: &[Token], if_index: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (index, token) in tokens.iter().enumerate().skip(if_index + 1) {
        match token.tag() {
            Some(Tag::If(_)) => depth += 1,
            Some(Tag::Endif) => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            Some(Tag::Else) if depth == 1 => return Some(index),
            _ => {}
        }
    }
    None
}

/// Finds where the first branch of the conditional at `if_index` ends: the
/// first `elif` or `else` at its own depth.
pub fn find_first_branch_end(tokens: &[Token], if_index: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (index, token) in tokens.iter().enumerate().skip(if_index + 1) {
        match token.tag() {
            Some(Tag::If(_)) => depth += 1,
            Some(Tag::Endif) => {
                depth -= 1;
                if depth == 0 {
                    return None;
                }
            }
            Some(Tag::Elif(_) | Tag::Else) if depth == 1 => return Some(index),
            _ => {}
        }
    }
    None
}

/// Finds the terminator closing the block that is open at token `from`.
///
/// `from` is either the block's start marker or a marker inside it at the
/// block's own depth (an `else`). Scanning starts right after it with depth 1;
/// same-kind openers increment, same-kind terminators decrement, and the
/// terminator that brings the depth to 0 is the match.
pub fn find_terminator(
    source: &str,
    tokens: &[Token],
    from: usize,
    kind: BlockKind,
) -> Result<usize, RewriteError> {
    let mut depth = 1usize;
    for (index, token) in tokens.iter().enumerate().skip(from + 1) {
        let Some(tag) = token.tag() else {
            continue;
        };
        if kind.opens(tag) {
            depth += 1;
        } else if kind.closes(tag) {
            depth -= 1;
            if depth == 0 {
                return Ok(index);
            }
        }
    }
    let offset = tokens.get(from).map(|token| token.span.start).unwrap_or(0);
    Err(RewriteError::MalformedNesting {
        kind,
        line: line_of(source, offset),
    })
}

struct OpenBlock {
    kind: BlockKind,
    open: usize,
    else_index: Option<usize>,
}

/// Resolves every conditional and loop in the stream with an explicit stack.
///
/// Blocks are returned in the order their terminators appear.
pub fn match_blocks(source: &str, tokens: &[Token]) -> Result<Vec<BlockSpan>, RewriteError> {
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut blocks = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        let Some(tag) = token.tag() else {
            continue;
        };
        let line = || line_of(source, token.span.start);
        match tag {
            Tag::If(_) | Tag::For { .. } => {
                let kind = if matches!(tag, Tag::If(_)) {
                    BlockKind::Conditional
                } else {
                    BlockKind::Loop
                };
                stack.push(OpenBlock {
                    kind,
                    open: index,
                    else_index: None,
                });
            }
            Tag::Else => {
                let owner = stack
                    .iter_mut()
                    .rev()
                    .find(|block| block.kind == BlockKind::Conditional)
                    .ok_or_else(|| RewriteError::StrayElse { line: line() })?;
                owner.else_index = Some(index);
            }
            Tag::Endif | Tag::Endfor => {
                let kind = if matches!(tag, Tag::Endif) {
                    BlockKind::Conditional
                } else {
                    BlockKind::Loop
                };
                match stack.pop() {
                    Some(open) if open.kind == kind => blocks.push(BlockSpan {
                        kind,
                        open: open.open,
                        else_index: open.else_index,
                        close: index,
                    }),
                    _ => return Err(RewriteError::UnexpectedTerminator { kind, line: line() }),
                }
            }
            Tag::Elif(_) | Tag::Other(_) => {}
        }
    }
    if let Some(open) = stack.pop() {
        return Err(RewriteError::MalformedNesting {
            kind: open.kind,
            line: line_of(source, tokens[open.open].span.start),
        });
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::tokenize;

    #[test]
    fn else_at_own_depth_is_found() {
        let input = "{%if A%}{%if B%}{%else%}{%endif%}W{%else%}G{%endif%}";
        let tokens = tokenize(input);
        let else_index = find_else(&tokens, 0).expect("else");
        assert_eq!(tokens[else_index].span.start, input.rfind("{%else%}").unwrap());
    }

    #[test]
    fn conditional_without_else_has_none() {
        let tokens = tokenize("{% if A %}only{% endif %}{% else %}");
        assert_eq!(find_else(&tokens, 0), None);
    }

    #[test]
    fn first_branch_ends_at_elif_or_else() {
        let input = "{%if A%}{%if B%}{%elif C%}{%endif%}W{%elif D%}E{%else%}G{%endif%}";
        let tokens = tokenize(input);
        let end = find_first_branch_end(&tokens, 0).expect("branch end");
        assert_eq!(tokens[end].kind, crate::markers::TokenKind::Tag(Tag::Elif("D".to_string())));
        assert_eq!(find_first_branch_end(&tokenize("{%if A%}W{%endif%}"), 0), None);
    }

    #[test]
    fn terminator_skips_nested_conditionals() {
        let input = "{%else%}{%if B%}X{%endif%}Y{%endif%}REST";
        let tokens = tokenize(input);
        let close = find_terminator(input, &tokens, 0, BlockKind::Conditional).expect("close");
        assert_eq!(&input[tokens[close].span.end..], "REST");
    }

    #[test]
    fn loop_terminator_ignores_conditionals() {
        let input = "{% for m in ms %}{% if m %}a{% endif %}{% endfor %}";
        let tokens = tokenize(input);
        let close = find_terminator(input, &tokens, 0, BlockKind::Loop).expect("close");
        assert_eq!(tokens[close].kind, crate::markers::TokenKind::Tag(Tag::Endfor));
    }

    #[test]
    fn exhausted_scan_is_malformed() {
        let input = "x\n{%else%}{%if B%}X{%endif%}Y";
        let tokens = tokenize(input);
        let err = find_terminator(input, &tokens, 1, BlockKind::Conditional).unwrap_err();
        assert_eq!(
            err,
            RewriteError::MalformedNesting {
                kind: BlockKind::Conditional,
                line: 2,
            }
        );
    }

    #[test]
    fn stack_matches_mixed_blocks() {
        let input = "{% if a %}{% for x in xs %}{% if x %}{% else %}{% endif %}{% endfor %}{% endif %}";
        let tokens = tokenize(input);
        let blocks = match_blocks(input, &tokens).expect("balanced");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Conditional);
        assert_eq!(blocks[0].open, 2);
        assert_eq!(blocks[0].else_index, Some(3));
        assert_eq!(blocks[1].kind, BlockKind::Loop);
        assert_eq!((blocks[1].open, blocks[1].close), (1, 5));
        assert_eq!((blocks[2].open, blocks[2].close), (0, 6));
        assert_eq!(blocks[2].else_index, None);
    }

    #[test]
    fn crossed_terminators_are_rejected() {
        let input = "{% if a %}\n{% for x in xs %}\n{% endif %}{% endfor %}";
        let tokens = tokenize(input);
        let err = match_blocks(input, &tokens).unwrap_err();
        assert_eq!(
            err,
            RewriteError::UnexpectedTerminator {
                kind: BlockKind::Conditional,
                line: 3,
            }
        );
    }

    #[test]
    fn unclosed_and_stray_markers_are_rejected() {
        let unclosed = "{% for x in xs %}";
        let err = match_blocks(unclosed, &tokenize(unclosed)).unwrap_err();
        assert!(matches!(err, RewriteError::MalformedNesting { kind: BlockKind::Loop, line: 1 }));

        let stray = "a\n\n{% else %}";
        let err = match_blocks(stray, &tokenize(stray)).unwrap_err();
        assert_eq!(err, RewriteError::StrayElse { line: 3 });
    }
}
