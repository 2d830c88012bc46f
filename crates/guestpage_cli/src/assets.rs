use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub dest: PathBuf,
    pub files: usize,
}

/// Replaces `dest` with a verbatim copy of the `src` tree.
pub fn copy_static_dir(src: &Path, dest: &Path) -> Result<CopyReport> {
    if !src.is_dir() {
        bail!("static directory {} does not exist", src.display());
    }
    if dest.exists() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;

    let mut files = 0;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).with_context(|| {
            format!(
                "failed to read asset relative path for {}",
                entry.path().display()
            )
        })?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let rel = checked_rel_path(rel)?;
        let out_path = dest.join(&rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create {}", out_path.display()))?;
            continue;
        }
        if !entry.file_type().is_file() {
            debug!(path = %entry.path().display(), "skipping non-file entry");
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(entry.path(), &out_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                entry.path().display(),
                out_path.display()
            )
        })?;
        files += 1;
    }
    Ok(CopyReport {
        dest: dest.to_path_buf(),
        files,
    })
}

fn checked_rel_path(path: &Path) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("asset rel path must not contain parent/root: {}", path.display());
            }
        }
    }
    Ok(clean)
}
