use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use guestpage_core::residual::{check_nesting, residual_markers};
use guestpage_core::{DocumentRole, RenderConfig, render_document};
use tracing::{debug, info, warn};

use crate::assets::{CopyReport, copy_static_dir};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub role: DocumentRole,
    pub path: PathBuf,
    pub residual_markers: usize,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub documents: Vec<RenderedDocument>,
    pub assets: Option<CopyReport>,
}

pub fn build_site(opts: &BuildOptions, config: &RenderConfig) -> Result<BuildReport> {
    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("failed to create {}", opts.out_dir.display()))?;

    let mut documents = Vec::new();
    for role in DocumentRole::ALL {
        documents.push(render_one(role, opts, config)?);
    }

    let assets = if opts.static_dir.is_dir() {
        let dest = opts.out_dir.join("static");
        let report = copy_static_dir(&opts.static_dir, &dest)?;
        info!(files = report.files, dest = %dest.display(), "copied static assets");
        Some(report)
    } else {
        warn!(
            dir = %opts.static_dir.display(),
            "static directory not found, skipping asset copy"
        );
        None
    };

    Ok(BuildReport { documents, assets })
}

fn render_one(role: DocumentRole, opts: &BuildOptions, config: &RenderConfig) -> Result<RenderedDocument> {
    let files = role.files(&config.documents);
    let template_path = opts.templates_dir.join(&files.template);
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("failed to read {}", template_path.display()))?;

    match check_nesting(&template) {
        Ok(blocks) => debug!(document = %role, blocks, "template nesting balanced"),
        Err(err) => warn!(document = %role, "template nesting: {err}"),
    }

    let rewritten = render_document(role, &template, config)
        .with_context(|| format!("failed to rewrite {}", template_path.display()))?;

    let residual = residual_markers(&rewritten.text);
    for marker in &residual {
        warn!(
            document = %role,
            line = marker.line,
            marker = %marker.raw,
            "template syntax left in output"
        );
    }

    let out_path = opts.out_dir.join(&files.output);
    write_output(&out_path, &rewritten.text)?;
    Ok(RenderedDocument {
        role,
        path: out_path,
        residual_markers: residual.len(),
    })
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
