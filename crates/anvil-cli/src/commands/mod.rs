//! CLI command implementations

pub mod repack;
pub mod template;

use anvil_template::TemplateSettings;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Layered settings with an optional `--templates` override
pub fn settings(templates: Option<&str>) -> Result<TemplateSettings> {
    let mut settings = TemplateSettings::load().context("Failed to load anvil config")?;
    if let Some(dir) = templates {
        settings.dir = PathBuf::from(dir);
    }
    Ok(settings)
}
