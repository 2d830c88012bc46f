use guestpage_core::model::{DefaultValue, RewriteStep, StepOutcome};
use guestpage_core::residual::{check_nesting, residual_markers, strip_template_syntax};
use guestpage_core::{DocumentRole, RenderConfig, RewriteError, render_document};

const CHAT: &str = include_str!("fixtures/chat.html");
const CHAT_NOJS: &str = include_str!("fixtures/chat_nojs.html");

#[test]
fn chat_renders_guest_page() {
    let out = render_document(DocumentRole::Chat, CHAT, &RenderConfig::default()).expect("render");
    assert!(out.text.contains("const isLoggedIn = false;"));
    assert!(out.text.contains("const defaultPaidModel = 'gpt-4';"));
    assert!(out.text.contains("<a href=\"/login\" class=\"login\">Log in</a>"));
    assert!(!out.text.contains("Log out"));
    assert!(out.text.contains("<script src=\"/static/js/config.js\"></script>"));
    assert!(residual_markers(&out.text).is_empty());
    assert_eq!(out.transformed_count(), 3);
}

#[test]
fn chat_script_values_ignore_source_template() {
    let mut config = RenderConfig::default();
    config
        .defaults
        .insert("default_free_model", DefaultValue::Text("llama-3".to_string()));
    config
        .defaults
        .insert("can_access_frontier", DefaultValue::Bool(true));
    let edited = CHAT.replace("'{{ default_free_model }}'", "'mistral'");
    let out = render_document(DocumentRole::Chat, &edited, &config).expect("render");
    assert!(out.text.contains("const defaultFreeModel = 'llama-3';"));
    assert!(out.text.contains("const canAccessFrontier = true;"));
    assert!(!out.text.contains("mistral"));
}

#[test]
fn chat_no_script_renders_welcome_state() {
    assert_eq!(check_nesting(CHAT_NOJS), Ok(5));
    let out = render_document(DocumentRole::ChatNoScript, CHAT_NOJS, &RenderConfig::default())
        .expect("render");
    assert!(out.text.contains("<h1>How can I help you today?</h1>"));
    assert!(!out.text.contains("message.content"));
    assert!(!out.text.contains("<article"));
    assert!(out.text.contains(
        "<select name=\"model\">\n            <option value=\"\" disabled selected>Configure API in config.js</option>\n        </select>"
    ));
    assert!(out.text.contains("<input type=\"hidden\" name=\"history\" value=\"\">"));
    assert!(out.text.contains("<textarea name=\"prompt\"></textarea>"));
    assert!(out.text.contains("<button type=\"submit\">Send to AI</button>"));
    assert!(residual_markers(&out.text).is_empty());
    assert_eq!(out.outcome(RewriteStep::Cleanup), Some(StepOutcome::Skipped));
}

#[test]
fn cleanup_leaves_rendered_output_unchanged() {
    let out = render_document(DocumentRole::ChatNoScript, CHAT_NOJS, &RenderConfig::default())
        .expect("render");
    assert_eq!(strip_template_syntax(&out.text), out.text);
}

#[test]
fn broken_else_branch_is_reported() {
    let broken = CHAT_NOJS.replacen("{% endif %}\n    </main>", "\n    </main>", 1);
    let err = render_document(DocumentRole::ChatNoScript, &broken, &RenderConfig::default())
        .expect_err("expected malformed nesting");
    assert!(matches!(err, RewriteError::MalformedNesting { .. }));
    assert_eq!(err.line(), 14);
}

#[test]
fn alternate_targets_drive_the_rewrite() {
    let template = "{% if history.is_empty() %}hello{% else %}{{ history }}{% endif %}<ul>{% for m in models %}<li>{{ m }}</li>{% endfor %}</ul>";
    let mut config = RenderConfig::default();
    config.targets.empty_condition = "history.is_empty()".to_string();
    config.targets.loop_collection = "models".to_string();
    config.targets.loop_placeholder = "<li>none</li>".to_string();
    let out = render_document(DocumentRole::ChatNoScript, template, &config).expect("render");
    assert_eq!(out.text, "hello<ul><li>none</li></ul>");
}
