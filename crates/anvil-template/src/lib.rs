//! Anvil Template - template persistence
//!
//! Templates are immutable stored node trees in TOML. This crate turns them
//! into live trees on a `Stage`, captures live trees back into files, and
//! saves variants under names that do not collide with existing templates.

mod capture;
pub mod config;
mod format;
mod instantiate;
mod store;

pub use capture::capture;
pub use config::TemplateSettings;
pub use format::{BehaviorDef, BehaviorKey, FieldDef, NodeDef, TemplateFile, TemplateMeta, ValueDef};
pub use instantiate::instantiate_file;
pub use store::{DirTemplateStore, MemoryTemplateStore, TemplateId, TemplateStore};
