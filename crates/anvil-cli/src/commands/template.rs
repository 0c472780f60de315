//! Template inspection commands

use anvil_core::ContentHash;
use anvil_template::{DirTemplateStore, NodeDef, TemplateFile, TemplateId, TemplateStore};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::collections::HashMap;

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List templates in the template directory
    List {
        /// Template directory (overrides config)
        #[arg(long)]
        templates: Option<String>,
    },

    /// Show template information
    Info {
        /// Template name
        name: String,

        /// Template directory (overrides config)
        #[arg(long)]
        templates: Option<String>,
    },

    /// Print the node hierarchy of a template
    Tree {
        /// Template name
        name: String,

        /// Template directory (overrides config)
        #[arg(long)]
        templates: Option<String>,
    },
}

pub fn run(cmd: TemplateCommands) -> Result<()> {
    match cmd {
        TemplateCommands::List { templates } => list(templates.as_deref()),
        TemplateCommands::Info { name, templates } => info(&name, templates.as_deref()),
        TemplateCommands::Tree { name, templates } => tree(&name, templates.as_deref()),
    }
}

fn open(templates: Option<&str>) -> Result<DirTemplateStore> {
    Ok(DirTemplateStore::new(super::settings(templates)?))
}

fn load(store: &DirTemplateStore, name: &str) -> Result<TemplateFile> {
    store
        .load(&TemplateId::new(name))
        .with_context(|| format!("Failed to load template '{}'", name))
}

fn list(templates: Option<&str>) -> Result<()> {
    let store = open(templates)?;
    let ids = store.list()?;

    if ids.is_empty() {
        println!("No templates found in {}", store.dir().display());
        return Ok(());
    }

    println!("Templates:");
    for id in ids {
        match store.load(&id).ok().and_then(|f| f.template.base) {
            Some(base) => println!("  {} (variant of {})", id, base),
            None => println!("  {}", id),
        }
    }
    Ok(())
}

fn info(name: &str, templates: Option<&str>) -> Result<()> {
    let store = open(templates)?;
    let file = load(&store, name)?;
    let hash = store.content_hash(&TemplateId::new(name))?;

    println!("Template: {}", file.template.name);
    if let Some(desc) = &file.template.description {
        println!("  {}", desc);
    }
    if let Some(base) = &file.template.base {
        println!("Variant of: {}", base);
        if let Some(base_hash) = &file.template.base_hash {
            let recorded = ContentHash::from_prefixed_hex(base_hash);
            let current = store.content_hash(&TemplateId::new(base)).ok();
            match (recorded, current) {
                (None, _) => println!("  recorded base hash is malformed: {}", base_hash),
                (_, None) => println!("  base template is missing"),
                (Some(r), Some(c)) if r == c => println!("  base unchanged since repack"),
                _ => println!("  base has changed since repack"),
            }
        }
    }
    println!("Nodes: {}", file.nodes.len());
    println!("Behaviors: {}", file.behavior_count());
    println!("Hash: {}", hash);

    Ok(())
}

fn tree(name: &str, templates: Option<&str>) -> Result<()> {
    let store = open(templates)?;
    let file = load(&store, name)?;

    let mut children: HashMap<Option<&str>, Vec<&NodeDef>> = HashMap::new();
    for node in &file.nodes {
        children.entry(node.parent.as_deref()).or_default().push(node);
    }

    let mut lines = Vec::new();
    print_subtree(&children, None, 0, &mut lines);
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn print_subtree(
    children: &HashMap<Option<&str>, Vec<&NodeDef>>,
    parent: Option<&str>,
    depth: usize,
    out: &mut Vec<String>,
) {
    let Some(nodes) = children.get(&parent) else {
        return;
    };
    for node in nodes {
        let behaviors: Vec<&str> = node
            .behaviors
            .iter()
            .map(|b| b.type_name.as_str())
            .filter(|t| *t != anvil_stage::TRANSFORM_TYPE)
            .collect();
        if behaviors.is_empty() {
            out.push(format!("{}{}", "  ".repeat(depth), node.name));
        } else {
            let indent = "  ".repeat(depth);
            out.push(format!("{}{} [{}]", indent, node.name, behaviors.join(", ")));
        }
        print_subtree(children, Some(node.key.as_str()), depth + 1, out);
    }
}
