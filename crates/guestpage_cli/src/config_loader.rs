use std::path::Path;

use anyhow::{Result, bail};
use guestpage_core::config::load_render_config;
use guestpage_core::model::RenderConfig;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "guestpage.yaml";

/// An explicit `--config` must exist; otherwise `guestpage.yaml` under the
/// root is used when present, and the built-in defaults when not.
pub fn load_config_for_build(root: &Path, explicit: Option<&Path>) -> Result<RenderConfig> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        return load_render_config(&path);
    }
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        debug!(root = %root.display(), "no {CONFIG_FILE_NAME}, using built-in defaults");
        return Ok(RenderConfig::default());
    }
    load_render_config(&config_path)
}
