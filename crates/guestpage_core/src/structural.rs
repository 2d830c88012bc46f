//! Rewriter for the script-free chat document
//!
//! Resolves the empty-state conditional down to its welcome branch, turns the
//! model loop into a single placeholder option, fills the known
//! interpolations and then drops whatever template syntax is left.

use crate::blocks::{BlockKind, find_first_branch_end, find_terminator};
use crate::error::RewriteError;
use crate::markers::{Tag, TokenKind, tokenize};
use crate::model::{DefaultValueSet, RenderConfig, RewriteStep, Rewritten};
use crate::pipeline::{StepRunner, splice_tokens};
use crate::residual::strip_template_syntax;

pub fn rewrite_structural(template: &str, config: &RenderConfig) -> Result<Rewritten, RewriteError> {
    let targets = &config.targets;
    let mut runner = StepRunner::new(template);
    runner.apply(RewriteStep::EmptyStateConditional, |text| {
        keep_empty_branch(text, &targets.empty_condition)
    })?;
    runner.apply(RewriteStep::LoopPlaceholder, |text| {
        replace_loop(text, &targets.loop_collection, &targets.loop_placeholder)
    })?;
    runner.apply(RewriteStep::Interpolations, |text| {
        Ok(substitute_interpolations(text, &targets.interpolations, &config.defaults))
    })?;
    runner.apply(RewriteStep::Cleanup, |text| {
        let cleaned = strip_template_syntax(text);
        Ok((cleaned != text).then_some(cleaned))
    })?;
    Ok(runner.finish())
}

/// Replaces `{% if condition %}EMPTY{% else %}...{% endif %}` with `EMPTY`.
///
/// `EMPTY` stops at the first `elif` or `else` of the conditional; the rest
/// may hold its own conditionals, and the terminator is the one that closes
/// the outer block, found by depth counting.
pub fn keep_empty_branch(text: &str, condition: &str) -> Result<Option<String>, RewriteError> {
    let tokens = tokenize(text);
    let Some(if_index) = tokens
        .iter()
        .position(|token| matches!(token.tag(), Some(Tag::If(cond)) if cond == condition))
    else {
        return Ok(None);
    };
    let Some(branch_end) = find_first_branch_end(&tokens, if_index) else {
        return Ok(None);
    };
    let close = find_terminator(text, &tokens, branch_end, BlockKind::Conditional)?;

    let open_span = &tokens[if_index].span;
    let branch_span = &tokens[branch_end].span;
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..open_span.start]);
    out.push_str(&text[open_span.end..branch_span.start]);
    out.push_str(&text[tokens[close].span.end..]);
    Ok(Some(out))
}

/// Replaces the loop over `collection`, body and all, with `placeholder`.
pub fn replace_loop(
    text: &str,
    collection: &str,
    placeholder: &str,
) -> Result<Option<String>, RewriteError> {
    let tokens = tokenize(text);
    let Some(open) = tokens.iter().position(|token| {
        matches!(token.tag(), Some(Tag::For { collection: name, .. }) if name == collection)
    }) else {
        return Ok(None);
    };
    let close = find_terminator(text, &tokens, open, BlockKind::Loop)?;

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..tokens[open].span.start]);
    out.push_str(placeholder);
    out.push_str(&text[tokens[close].span.end..]);
    Ok(Some(out))
}

/// Fills the expressions listed in `names` from `defaults`; a listed name
/// with no default is deleted. Other expressions are left for cleanup.
pub fn substitute_interpolations(
    text: &str,
    names: &[String],
    defaults: &DefaultValueSet,
) -> Option<String> {
    let tokens = tokenize(text);
    splice_tokens(text, &tokens, |token| match &token.kind {
        TokenKind::Expr(name) if names.iter().any(|listed| listed == name) => Some(
            defaults
                .get(name)
                .map(|value| value.interpolated())
                .unwrap_or_default(),
        ),
        _ => None,
    })
}
