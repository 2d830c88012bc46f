use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_yaml::Value;

use crate::model::{
    DefaultValue, DefaultValueSet, DocumentFiles, DocumentSet, RenderConfig, RewriteTargets,
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenderConfigRaw {
    #[serde(default)]
    defaults: BTreeMap<String, Value>,
    targets: Option<RewriteTargetsRaw>,
    documents: Option<DocumentSetRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RewriteTargetsRaw {
    script_marker: Option<String>,
    session_flag: Option<String>,
    empty_condition: Option<String>,
    loop_collection: Option<String>,
    loop_placeholder: Option<String>,
    interpolations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentSetRaw {
    chat: Option<DocumentFilesRaw>,
    chat_no_script: Option<DocumentFilesRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentFilesRaw {
    template: Option<String>,
    output: Option<String>,
}

pub fn load_render_config(path: &Path) -> Result<RenderConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_render_config(&raw)
        .with_context(|| format!("failed to parse render config {}", path.display()))
}

pub fn parse_render_config(raw: &str) -> Result<RenderConfig> {
    let parsed: RenderConfigRaw = if raw.trim().is_empty() {
        RenderConfigRaw::default()
    } else {
        serde_yaml::from_str(raw).context("invalid YAML")?
    };

    let mut defaults = DefaultValueSet::default();
    for (name, value) in parsed.defaults {
        let value = default_value_from_yaml(&name, value)?;
        defaults.insert(name, value);
    }

    let builtin = RewriteTargets::default();
    let targets = match parsed.targets {
        None => builtin,
        Some(raw) => RewriteTargets {
            script_marker: non_empty_or_default(
                raw.script_marker,
                &builtin.script_marker,
                "targets.script_marker",
            )?,
            session_flag: non_empty_or_default(
                raw.session_flag,
                &builtin.session_flag,
                "targets.session_flag",
            )?,
            empty_condition: non_empty_or_default(
                raw.empty_condition,
                &builtin.empty_condition,
                "targets.empty_condition",
            )?,
            loop_collection: non_empty_or_default(
                raw.loop_collection,
                &builtin.loop_collection,
                "targets.loop_collection",
            )?,
            loop_placeholder: raw.loop_placeholder.unwrap_or(builtin.loop_placeholder),
            interpolations: match raw.interpolations {
                Some(names) => interpolation_names(names)?,
                None => builtin.interpolations,
            },
        },
    };

    let builtin = DocumentSet::default();
    let documents = match parsed.documents {
        None => builtin,
        Some(raw) => DocumentSet {
            chat: document_files(raw.chat, builtin.chat, "documents.chat")?,
            chat_no_script: document_files(
                raw.chat_no_script,
                builtin.chat_no_script,
                "documents.chat_no_script",
            )?,
        },
    };

    Ok(RenderConfig {
        defaults,
        targets,
        documents,
    })
}

fn default_value_from_yaml(name: &str, value: Value) -> Result<DefaultValue> {
    match value {
        Value::Bool(value) => Ok(DefaultValue::Bool(value)),
        Value::String(text) => Ok(DefaultValue::Text(text)),
        Value::Number(number) => Ok(DefaultValue::Text(number.to_string())),
        Value::Null => Ok(DefaultValue::Text(String::new())),
        Value::Sequence(items) if items.is_empty() => Ok(DefaultValue::EmptyCollection),
        Value::Sequence(_) => bail!("defaults.{name}: only empty collections are supported"),
        Value::Mapping(_) | Value::Tagged(_) => {
            bail!("defaults.{name} must be a boolean, string or empty list")
        }
    }
}

fn interpolation_names(names: Vec<String>) -> Result<Vec<String>> {
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                bail!("targets.interpolations[{index}] must not be empty");
            }
            Ok(trimmed.to_string())
        })
        .collect()
}

fn document_files(
    raw: Option<DocumentFilesRaw>,
    builtin: DocumentFiles,
    field: &str,
) -> Result<DocumentFiles> {
    let Some(raw) = raw else {
        return Ok(builtin);
    };
    let template_field = format!("{field}.template");
    let output_field = format!("{field}.output");
    let template = non_empty_or_default(raw.template, &builtin.template, &template_field)?;
    let output = non_empty_or_default(raw.output, &builtin.output, &output_field)?;
    ensure_relative(&template, &template_field)?;
    ensure_relative(&output, &output_field)?;
    Ok(DocumentFiles { template, output })
}

fn ensure_relative(value: &str, field: &str) -> Result<()> {
    let path = Path::new(value);
    if path.is_absolute() {
        bail!("{field} must be a relative path: {value}");
    }
    for comp in path.components() {
        match comp {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("{field} must not contain parent/root: {value}");
            }
            _ => {}
        }
    }
    Ok(())
}

fn non_empty_or_default(value: Option<String>, default: &str, field: &str) -> Result<String> {
    match value {
        Some(text) => {
            if text.trim().is_empty() {
                bail!("{field} must not be empty");
            }
            Ok(text)
        }
        None => Ok(default.to_string()),
    }
}
