use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    Text(String),
    EmptyCollection,
}

impl DefaultValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DefaultValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DefaultValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Text spliced in place of an interpolation of this value.
    pub fn interpolated(&self) -> String {
        match self {
            DefaultValue::Bool(value) => value.to_string(),
            DefaultValue::Text(value) => value.clone(),
            DefaultValue::EmptyCollection => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValueSet {
    values: BTreeMap<String, DefaultValue>,
}

impl DefaultValueSet {
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DefaultValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: DefaultValue) {
        self.values.insert(name.into(), value);
    }

    pub fn bool_or_false(&self, name: &str) -> bool {
        self.get(name).and_then(DefaultValue::as_bool).unwrap_or(false)
    }

    pub fn text_or_empty(&self, name: &str) -> &str {
        self.get(name).and_then(DefaultValue::as_text).unwrap_or("")
    }
}

impl Default for DefaultValueSet {
    fn default() -> Self {
        let mut set = Self::empty();
        set.insert("logged_in", DefaultValue::Bool(false));
        set.insert("can_access_frontier", DefaultValue::Bool(false));
        set.insert("default_free_model", DefaultValue::Text(String::new()));
        set.insert("default_paid_model", DefaultValue::Text("gpt-4".to_string()));
        set.insert("username", DefaultValue::Text(String::new()));
        set.insert("chat_messages", DefaultValue::EmptyCollection);
        set.insert("available_models", DefaultValue::EmptyCollection);
        set.insert("selected_model", DefaultValue::Text(String::new()));
        set.insert("selected_model_name", DefaultValue::Text("AI".to_string()));
        set.insert("message_history", DefaultValue::Text(String::new()));
        set.insert("previous_prompt", DefaultValue::Text(String::new()));
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTargets {
    pub script_marker: String,
    pub session_flag: String,
    pub empty_condition: String,
    pub loop_collection: String,
    pub loop_placeholder: String,
    /// Expressions filled from the Default Value Set in the script-free
    /// document; every other expression is deleted by cleanup.
    pub interpolations: Vec<String>,
}

impl Default for RewriteTargets {
    fn default() -> Self {
        Self {
            script_marker: "// Template variables".to_string(),
            session_flag: "logged_in".to_string(),
            empty_condition: "chat_messages.is_empty()".to_string(),
            loop_collection: "available_models".to_string(),
            loop_placeholder:
                "<option value=\"\" disabled selected>Configure API in config.js</option>"
                    .to_string(),
            interpolations: [
                "message_history",
                "previous_prompt",
                "selected_model",
                "selected_model_name",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFiles {
    pub template: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSet {
    pub chat: DocumentFiles,
    pub chat_no_script: DocumentFiles,
}

impl Default for DocumentSet {
    fn default() -> Self {
        Self {
            chat: DocumentFiles {
                template: "chat.html".to_string(),
                output: "index.html".to_string(),
            },
            chat_no_script: DocumentFiles {
                template: "chat_nojs.html".to_string(),
                output: "chat_nojs.html".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderConfig {
    pub defaults: DefaultValueSet,
    pub targets: RewriteTargets,
    pub documents: DocumentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStep {
    ScriptBlock,
    SessionConditional,
    ConditionalTerminators,
    EmptyStateConditional,
    LoopPlaceholder,
    Interpolations,
    Cleanup,
}

impl fmt::Display for RewriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RewriteStep::ScriptBlock => "script-block",
            RewriteStep::SessionConditional => "session-conditional",
            RewriteStep::ConditionalTerminators => "conditional-terminators",
            RewriteStep::EmptyStateConditional => "empty-state-conditional",
            RewriteStep::LoopPlaceholder => "loop-placeholder",
            RewriteStep::Interpolations => "interpolations",
            RewriteStep::Cleanup => "cleanup",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Transformed,
    /// The construct the step looks for is absent; text left unchanged.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: RewriteStep,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub steps: Vec<StepReport>,
}

impl Rewritten {
    pub fn outcome(&self, step: RewriteStep) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| report.outcome)
    }

    pub fn transformed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|report| report.outcome == StepOutcome::Transformed)
            .count()
    }
}
