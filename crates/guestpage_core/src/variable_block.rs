//! Rewriter for the scripted chat document
//!
//! Swaps the templated variable script for literal guest values and keeps
//! only the guest branch of the session conditional.

use std::ops::Range;

use crate::blocks::find_else;
use crate::error::RewriteError;
use crate::markers::{Tag, Token, tokenize};
use crate::model::{DefaultValueSet, RenderConfig, RewriteStep, Rewritten};
use crate::pipeline::{StepRunner, splice_tokens};

const SCRIPT_OPEN: &str = "<script>";
const SCRIPT_CLOSE: &str = "</script>";

pub fn rewrite_variable_block(
    template: &str,
    config: &RenderConfig,
) -> Result<Rewritten, RewriteError> {
    let targets = &config.targets;
    let mut runner = StepRunner::new(template);
    runner.apply(RewriteStep::ScriptBlock, |text| {
        Ok(replace_script_block(text, &targets.script_marker, &config.defaults))
    })?;
    runner.apply(RewriteStep::SessionConditional, |text| {
        Ok(flatten_session_conditional(text, &targets.session_flag))
    })?;
    runner.apply(RewriteStep::ConditionalTerminators, |text| {
        Ok(remove_conditional_terminators(text))
    })?;
    Ok(runner.finish())
}

/// The literal script region holding guest-mode values.
pub fn guest_script_block(defaults: &DefaultValueSet) -> String {
    let mut out = String::from(SCRIPT_OPEN);
    out.push_str("\n        // Template variables (defaults for static version)\n");
    push_const(&mut out, "isLoggedIn", &js_bool(defaults.bool_or_false("logged_in")));
    push_const(
        &mut out,
        "canAccessFrontier",
        &js_bool(defaults.bool_or_false("can_access_frontier")),
    );
    push_const(
        &mut out,
        "defaultFreeModel",
        &js_string(defaults.text_or_empty("default_free_model")),
    );
    push_const(
        &mut out,
        "defaultPaidModel",
        &js_string(defaults.text_or_empty("default_paid_model")),
    );
    push_const(
        &mut out,
        "currentUsername",
        &js_string(defaults.text_or_empty("username")),
    );
    out.push_str("    ");
    out.push_str(SCRIPT_CLOSE);
    out
}

fn replace_script_block(text: &str, marker: &str, defaults: &DefaultValueSet) -> Option<String> {
    let region = find_script_region(text, marker)?;
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..region.start]);
    out.push_str(&guest_script_block(defaults));
    out.push_str(&text[region.end..]);
    Some(out)
}

/// Byte range from `<script>` through `</script>` of the first script whose
/// body opens with `marker`.
fn find_script_region(text: &str, marker: &str) -> Option<Range<usize>> {
    let mut idx = 0;
    while let Some(offset) = text[idx..].find(SCRIPT_OPEN) {
        let open = idx + offset;
        let body = open + SCRIPT_OPEN.len();
        if text[body..].trim_start().starts_with(marker) {
            let close = body + text[body..].find(SCRIPT_CLOSE)?;
            return Some(open..close + SCRIPT_CLOSE.len());
        }
        idx = body;
    }
    None
}

// A flag conditional without an else is left alone, so its content survives
// into the guest page once the terminators are removed.
fn flatten_session_conditional(text: &str, flag: &str) -> Option<String> {
    let tokens = tokenize(text);
    let if_index = find_top_level_if(&tokens, flag)?;
    let else_index = find_else(&tokens, if_index)?;
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..tokens[if_index].span.start]);
    out.push_str(&text[tokens[else_index].span.end..]);
    Some(out)
}

fn find_top_level_if(tokens: &[Token], condition: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        match token.tag() {
            Some(Tag::If(cond)) => {
                if depth == 0 && cond == condition {
                    return Some(index);
                }
                depth += 1;
            }
            Some(Tag::Endif) => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

// Every terminator goes, not only the session conditional's: nested
// conditionals kept in the guest branch lose theirs as well.
fn remove_conditional_terminators(text: &str) -> Option<String> {
    let tokens = tokenize(text);
    splice_tokens(text, &tokens, |token| {
        matches!(token.tag(), Some(Tag::Endif)).then(String::new)
    })
}

fn push_const(out: &mut String, name: &str, literal: &str) {
    out.push_str("        const ");
    out.push_str(name);
    out.push_str(" = ");
    out.push_str(literal);
    out.push_str(";\n");
}

fn js_bool(value: bool) -> String {
    value.to_string()
}

fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' if chars.peek() == Some(&'/') => out.push_str("<\\"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DefaultValue, StepOutcome};

    const TEMPLATE: &str = "<head>
    <script>
        // Template variables
        const isLoggedIn = {{ logged_in }};
        const defaultPaidModel = '{{ default_paid_model }}';
    </script>
</head>
<body>
{% if logged_in %}<a href=\"/logout\">{{ username }}</a>{% else %}<a href=\"/login\">Sign in</a>{% endif %}
</body>";

    #[test]
    fn script_region_gets_guest_values() {
        let out = rewrite_variable_block(TEMPLATE, &RenderConfig::default()).expect("rewrite");
        assert!(out.text.contains("const isLoggedIn = false;"));
        assert!(out.text.contains("const canAccessFrontier = false;"));
        assert!(out.text.contains("const defaultFreeModel = '';"));
        assert!(out.text.contains("const defaultPaidModel = 'gpt-4';"));
        assert!(out.text.contains("const currentUsername = '';"));
        assert!(!out.text.contains("{{ logged_in }}"));
        assert_eq!(out.outcome(RewriteStep::ScriptBlock), Some(StepOutcome::Transformed));
    }

    #[test]
    fn session_conditional_keeps_guest_branch() {
        let out = rewrite_variable_block(TEMPLATE, &RenderConfig::default()).expect("rewrite");
        assert!(out.text.contains("<body>\n<a href=\"/login\">Sign in</a>\n</body>"));
        assert!(!out.text.contains("logout"));
        assert_eq!(
            out.outcome(RewriteStep::SessionConditional),
            Some(StepOutcome::Transformed)
        );
    }

    #[test]
    fn configured_defaults_override_source_values() {
        let mut config = RenderConfig::default();
        config
            .defaults
            .insert("default_paid_model", DefaultValue::Text("o'brien</script>".to_string()));
        config
            .defaults
            .insert("username", DefaultValue::Text("guest".to_string()));
        let out = rewrite_variable_block(TEMPLATE, &config).expect("rewrite");
        assert!(out.text.contains("const defaultPaidModel = 'o\\'brien<\\/script>';"));
        assert!(out.text.contains("const currentUsername = 'guest';"));
        assert_eq!(out.text.matches("</script>").count(), 1);
    }

    #[test]
    fn missing_script_region_passes_through() {
        let input = "<script>console.log('app');</script>\n<p>static</p>";
        let out = rewrite_variable_block(input, &RenderConfig::default()).expect("rewrite");
        assert_eq!(out.text, input);
        assert_eq!(out.outcome(RewriteStep::ScriptBlock), Some(StepOutcome::Skipped));
        assert_eq!(
            out.outcome(RewriteStep::SessionConditional),
            Some(StepOutcome::Skipped)
        );
    }

    #[test]
    fn script_without_marker_is_skipped_before_the_marked_one() {
        let input = "<script>init();</script><script>\n// Template variables\nx</script>";
        let out = rewrite_variable_block(input, &RenderConfig::default()).expect("rewrite");
        assert!(out.text.starts_with("<script>init();</script><script>\n        // Template variables (defaults"));
    }

    #[test]
    fn nested_if_before_else_stays_in_dropped_branch() {
        let input = "{% if logged_in %}{% if admin %}A{% else %}U{% endif %}{% else %}G{% endif %}";
        let out = rewrite_variable_block(input, &RenderConfig::default()).expect("rewrite");
        assert_eq!(out.text, "G");
    }

    #[test]
    fn nested_conditional_in_guest_branch_loses_its_terminator() {
        let input = "{% if logged_in %}U{% else %}{% if promo %}P{% endif %}G{% endif %}";
        let out = rewrite_variable_block(input, &RenderConfig::default()).expect("rewrite");
        assert_eq!(out.text, "{% if promo %}PG");
    }

    #[test]
    fn only_top_level_session_conditional_is_flattened() {
        let input = "{% if open %}{% if logged_in %}U{% else %}G{% endif %}{% endif %}";
        let out = rewrite_variable_block(input, &RenderConfig::default()).expect("rewrite");
        assert_eq!(out.text, "{% if open %}{% if logged_in %}U{% else %}G");
        assert_eq!(
            out.outcome(RewriteStep::SessionConditional),
            Some(StepOutcome::Skipped)
        );
    }

    #[test]
    fn session_conditional_without_else_keeps_its_body() {
        let input = "<nav>{% if logged_in %}<a href=\"/logout\">Out</a>{% endif %}</nav>";
        let out = rewrite_variable_block(input, &RenderConfig::default()).expect("rewrite");
        assert_eq!(
            out.outcome(RewriteStep::SessionConditional),
            Some(StepOutcome::Skipped)
        );
        assert_eq!(out.text, "<nav>{% if logged_in %}<a href=\"/logout\">Out</a></nav>");
    }

    #[test]
    fn rewriting_twice_is_stable() {
        let config = RenderConfig::default();
        let once = rewrite_variable_block(TEMPLATE, &config).expect("rewrite");
        let twice = rewrite_variable_block(&once.text, &config).expect("rewrite");
        assert_eq!(once.text, twice.text);
    }
}
