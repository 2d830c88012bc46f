//! Template marker tokenizer
//!
//! Splits a template into a flat stream of literal text, control tags
//! (`{% ... %}`) and variable expressions (`{{ ... }}`). Every token keeps
//! the byte span it was read from so rewriters can splice the source text
//! around it.

use std::ops::Range;

const TAG_OPEN: &str = "{%";
const TAG_CLOSE: &str = "%}";
const EXPR_OPEN: &str = "{{";
const EXPR_CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    If(String),
    Elif(String),
    Else,
    Endif,
    For { binding: String, collection: String },
    Endfor,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Tag(Tag),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn tag(&self) -> Option<&Tag> {
        match &self.kind {
            TokenKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        !matches!(self.kind, TokenKind::Text)
    }

    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut idx = 0;
    while let Some(offset) = input[idx..].find('{') {
        let start = idx + offset;
        let Some((kind, end)) = read_marker(input, start) else {
            idx = start + 1;
            continue;
        };
        if text_start < start {
            tokens.push(Token {
                kind: TokenKind::Text,
                span: text_start..start,
            });
        }
        tokens.push(Token {
            kind,
            span: start..end,
        });
        text_start = end;
        idx = end;
    }
    if text_start < input.len() {
        tokens.push(Token {
            kind: TokenKind::Text,
            span: text_start..input.len(),
        });
    }
    tokens
}

/// 1-based line number of a byte offset.
pub fn line_of(input: &str, offset: usize) -> usize {
    input[..offset.min(input.len())].matches('\n').count() + 1
}

fn read_marker(input: &str, start: usize) -> Option<(TokenKind, usize)> {
    let rest = &input[start..];
    let (is_tag, close) = if rest.starts_with(TAG_OPEN) {
        (true, TAG_CLOSE)
    } else if rest.starts_with(EXPR_OPEN) {
        (false, EXPR_CLOSE)
    } else {
        return None;
    };
    let inner_start = start + 2;
    let inner_end = inner_start + input[inner_start..].find(close)?;
    let inner = strip_whitespace_control(&input[inner_start..inner_end]);
    let kind = if is_tag {
        TokenKind::Tag(classify_tag(inner))
    } else {
        TokenKind::Expr(inner.to_string())
    };
    Some((kind, inner_end + close.len()))
}

fn strip_whitespace_control(inner: &str) -> &str {
    let inner = inner.strip_prefix('-').unwrap_or(inner);
    let inner = inner.strip_suffix('-').unwrap_or(inner);
    inner.trim()
}

fn classify_tag(inner: &str) -> Tag {
    let (keyword, rest) = match inner.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (inner, ""),
    };
    match keyword {
        "if" => Tag::If(rest.to_string()),
        "elif" => Tag::Elif(rest.to_string()),
        "else" if rest.is_empty() => Tag::Else,
        "endif" if rest.is_empty() => Tag::Endif,
        "endfor" if rest.is_empty() => Tag::Endfor,
        "for" => parse_for(rest).unwrap_or_else(|| Tag::Other(inner.to_string())),
        _ => Tag::Other(inner.to_string()),
    }
}

fn parse_for(rest: &str) -> Option<Tag> {
    let mut words = rest.split_whitespace();
    let binding = words.next()?;
    if words.next()? != "in" {
        return None;
    }
    let collection = words.collect::<Vec<_>>().join(" ");
    if collection.is_empty() {
        return None;
    }
    Some(Tag::For {
        binding: binding.to_string(),
        collection,
    })
}
