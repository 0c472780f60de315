//! Template stores: where templates live and how variants are saved

use crate::capture::capture;
use crate::config::TemplateSettings;
use crate::format::{TemplateFile, TemplateMeta};
use crate::instantiate::instantiate_file;
use anvil_core::{AnvilError, ContentHash, NodeId, Result};
use anvil_stage::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TEMPLATE_EXTENSION: &str = ".template.toml";

/// Name of a stored template, unique within its store
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence for templates.
///
/// Implementors supply raw storage; instantiation, template-root checks, and
/// variant saving are built on top of it.
pub trait TemplateStore {
    fn settings(&self) -> &TemplateSettings;

    fn load(&self, id: &TemplateId) -> Result<TemplateFile>;

    fn contains(&self, id: &TemplateId) -> bool;

    /// Names of all stored templates, sorted
    fn list(&self) -> Result<Vec<TemplateId>>;

    /// Write `file` under `id`, replacing any previous content
    fn store(&mut self, id: &TemplateId, file: &TemplateFile) -> Result<()>;

    /// Hash of the stored representation of `id`
    fn content_hash(&self, id: &TemplateId) -> Result<ContentHash> {
        let file = self.load(id)?;
        Ok(ContentHash::of_str(&toml::to_string(&file)?))
    }

    /// Materialize `id` as a fresh live tree on `stage`
    fn instantiate(&self, stage: &mut Stage, id: &TemplateId) -> Result<NodeId> {
        let file = self.load(id)?;
        instantiate_file(&file, stage, id.as_str(), self.settings().allow_node_removal)
    }

    /// Whether `node` is the root of an instantiation of a template in this store
    fn is_template_root(&self, stage: &Stage, node: NodeId) -> bool {
        stage
            .template_of(node)
            .map(|name| self.contains(&TemplateId::new(name)))
            .unwrap_or(false)
    }

    /// Persist the tree under `root` as a new variant of `base`, under a name
    /// not yet used in this store
    fn save_as_variant(
        &mut self,
        stage: &Stage,
        root: NodeId,
        base: &TemplateId,
    ) -> Result<TemplateId> {
        if !self.contains(base) {
            return Err(AnvilError::TemplateNotFound(base.to_string()));
        }
        let id = self.unique_variant_id(base);
        let meta = TemplateMeta {
            base: Some(base.to_string()),
            base_hash: Some(self.content_hash(base)?.to_prefixed_hex()),
            ..TemplateMeta::new(id.as_str())
        };
        let file = capture(stage, root, meta)?;
        self.store(&id, &file)?;
        info!(template = %id, base = %base, nodes = file.nodes.len(), "saved variant");
        Ok(id)
    }

    /// `"<base> Variant"`, then `"<base> Variant 1"`, `"<base> Variant 2"`, ...
    fn unique_variant_id(&self, base: &TemplateId) -> TemplateId {
        let stem = format!("{} {}", base, self.settings().variant_suffix);
        let mut candidate = TemplateId::new(stem.clone());
        let mut n = 1;
        while self.contains(&candidate) {
            candidate = TemplateId::new(format!("{} {}", stem, n));
            n += 1;
        }
        candidate
    }
}

/// Templates held in memory
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    settings: TemplateSettings,
    templates: BTreeMap<TemplateId, TemplateFile>,
}

impl MemoryTemplateStore {
    pub fn new(settings: TemplateSettings) -> Self {
        Self {
            settings,
            templates: BTreeMap::new(),
        }
    }

    /// Capture the tree under `root` and store it as `name`
    pub fn insert_tree(&mut self, stage: &Stage, root: NodeId, name: &str) -> Result<TemplateId> {
        let id = TemplateId::new(name);
        let file = capture(stage, root, TemplateMeta::new(name))?;
        self.store(&id, &file)?;
        Ok(id)
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    fn load(&self, id: &TemplateId) -> Result<TemplateFile> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| AnvilError::TemplateNotFound(id.to_string()))
    }

    fn contains(&self, id: &TemplateId) -> bool {
        self.templates.contains_key(id)
    }

    fn list(&self) -> Result<Vec<TemplateId>> {
        Ok(self.templates.keys().cloned().collect())
    }

    fn store(&mut self, id: &TemplateId, file: &TemplateFile) -> Result<()> {
        self.templates.insert(id.clone(), file.clone());
        Ok(())
    }
}

/// Templates stored as `<dir>/<name>.template.toml`
#[derive(Debug)]
pub struct DirTemplateStore {
    settings: TemplateSettings,
}

impl DirTemplateStore {
    pub fn new(settings: TemplateSettings) -> Self {
        Self { settings }
    }

    pub fn dir(&self) -> &Path {
        &self.settings.dir
    }

    /// File holding `id`. Names that could resolve outside the template
    /// directory are rejected.
    pub fn path_of(&self, id: &TemplateId) -> Result<PathBuf> {
        let name = id.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(AnvilError::InvalidTemplateName(name.to_string()));
        }
        Ok(self.settings.dir.join(format!("{}{}", name, TEMPLATE_EXTENSION)))
    }

    fn read_text(&self, id: &TemplateId) -> Result<String> {
        let path = self.path_of(id)?;
        if !path.exists() {
            return Err(AnvilError::TemplateNotFound(id.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }
}

impl TemplateStore for DirTemplateStore {
    fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    fn load(&self, id: &TemplateId) -> Result<TemplateFile> {
        let content = self.read_text(id)?;
        toml::from_str(&content).map_err(|e| {
            AnvilError::TemplateFormat(format!("Failed to parse template '{}': {}", id, e))
        })
    }

    fn contains(&self, id: &TemplateId) -> bool {
        self.path_of(id).map(|p| p.is_file()).unwrap_or(false)
    }

    fn list(&self) -> Result<Vec<TemplateId>> {
        if !self.settings.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.settings.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let stem = file_name.to_str().and_then(|n| n.strip_suffix(TEMPLATE_EXTENSION));
            if let Some(name) = stem {
                ids.push(TemplateId::new(name));
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn store(&mut self, id: &TemplateId, file: &TemplateFile) -> Result<()> {
        let path = self.path_of(id)?;
        fs::create_dir_all(&self.settings.dir)?;
        let content = toml::to_string_pretty(file)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn content_hash(&self, id: &TemplateId) -> Result<ContentHash> {
        Ok(ContentHash::of_str(&self.read_text(id)?))
    }
}
