//! Layered configuration
//!
//! Settings are loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `ANVIL_TEMPLATE_DIR`, `ANVIL_ALLOW_NODE_REMOVAL`
//! 2. Project-local: `.anvil/config.toml`
//! 3. Global: `~/.anvil/config.toml`

use anvil_core::{AnvilError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[templates]` section as written in a config file; unset keys fall through
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesSection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub variant_suffix: Option<String>,
    #[serde(default)]
    pub allow_node_removal: Option<bool>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnvilConfigFile {
    #[serde(default)]
    pub templates: TemplatesSection,
}

/// Resolved settings for a template store
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSettings {
    /// Directory holding `.template.toml` files
    pub dir: PathBuf,
    /// Word appended to a base name when naming a new variant
    pub variant_suffix: String,
    /// Whether instantiated nodes may be deleted instead of cleared
    pub allow_node_removal: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
            variant_suffix: "Variant".to_string(),
            allow_node_removal: false,
        }
    }
}

impl TemplateSettings {
    /// Load settings with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = AnvilConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                Self::merge_into(&mut config, Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".anvil/config.toml");
        if local_path.exists() {
            Self::merge_into(&mut config, Self::load_file(&local_path)?);
        }

        Self::apply_env_overrides(&mut config)?;
        Ok(Self::resolve(config))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".anvil").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<AnvilConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            AnvilError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut AnvilConfigFile, overlay: AnvilConfigFile) {
        let overlay = overlay.templates;
        if overlay.dir.is_some() {
            base.templates.dir = overlay.dir;
        }
        if overlay.variant_suffix.is_some() {
            base.templates.variant_suffix = overlay.variant_suffix;
        }
        if overlay.allow_node_removal.is_some() {
            base.templates.allow_node_removal = overlay.allow_node_removal;
        }
    }

    fn apply_env_overrides(config: &mut AnvilConfigFile) -> Result<()> {
        if let Ok(dir) = std::env::var("ANVIL_TEMPLATE_DIR") {
            config.templates.dir = Some(PathBuf::from(dir));
        }
        if let Ok(flag) = std::env::var("ANVIL_ALLOW_NODE_REMOVAL") {
            let value = match flag.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(AnvilError::Config(format!(
                        "ANVIL_ALLOW_NODE_REMOVAL must be true or false, got '{}'",
                        other
                    )))
                }
            };
            config.templates.allow_node_removal = Some(value);
        }
        Ok(())
    }

    fn resolve(config: AnvilConfigFile) -> Self {
        let defaults = Self::default();
        let t = config.templates;
        Self {
            dir: t.dir.unwrap_or(defaults.dir),
            variant_suffix: t.variant_suffix.unwrap_or(defaults.variant_suffix),
            allow_node_removal: t.allow_node_removal.unwrap_or(defaults.allow_node_removal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = TemplateSettings::default();
        assert_eq!(settings.dir, PathBuf::from("templates"));
        assert_eq!(settings.variant_suffix, "Variant");
        assert!(!settings.allow_node_removal);
    }

    #[test]
    fn test_config_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[templates]
dir = "assets/avatars"
allow_node_removal = true
"#,
        );

        let settings = TemplateSettings::resolve(TemplateSettings::load_file(&path).unwrap());
        assert_eq!(settings.dir, PathBuf::from("assets/avatars"));
        assert!(settings.allow_node_removal);
        assert_eq!(settings.variant_suffix, "Variant");
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = AnvilConfigFile::default();
        base.templates.variant_suffix = Some("Copy".into());
        base.templates.dir = Some(PathBuf::from("a"));

        let mut overlay = AnvilConfigFile::default();
        overlay.templates.dir = Some(PathBuf::from("b"));

        TemplateSettings::merge_into(&mut base, overlay);
        let settings = TemplateSettings::resolve(base);
        assert_eq!(settings.dir, PathBuf::from("b"));
        assert_eq!(settings.variant_suffix, "Copy");
    }

    #[test]
    fn test_bad_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[templates]\nallow_node_removal = \"maybe\"\n");
        assert!(matches!(
            TemplateSettings::load_file(&path),
            Err(AnvilError::Config(_))
        ));
    }
}
