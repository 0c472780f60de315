//! Repack command: rebase an edited tree onto a base template

use anvil_repack::{repack, RepackReport};
use anvil_stage::Stage;
use anvil_template::{instantiate_file, DirTemplateStore, TemplateFile, TemplateId, TemplateStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;

pub struct RepackArgs {
    pub reference: String,
    pub base: String,
    pub templates: Option<String>,
    pub format: String,
}

#[derive(Serialize)]
struct RepackSummary<'a> {
    variant: &'a str,
    base: &'a str,
    report: &'a RepackReport,
}

pub fn run(args: RepackArgs) -> Result<()> {
    let settings = super::settings(args.templates.as_deref())?;
    let mut store = DirTemplateStore::new(settings);

    let base = TemplateId::new(&args.base);
    let base_path = store
        .path_of(&base)
        .with_context(|| format!("Invalid base template name '{}'", args.base))?;
    if !base_path.is_file() {
        anyhow::bail!(
            "Base template '{}' not found in {}",
            args.base,
            store.dir().display()
        );
    }

    let content = fs::read_to_string(&args.reference)
        .with_context(|| format!("Failed to read reference tree: {}", args.reference))?;
    let reference_file: TemplateFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse reference tree: {}", args.reference))?;

    let mut stage = Stage::new();
    let reference_root = instantiate_file(
        &reference_file,
        &mut stage,
        &reference_file.template.name,
        true,
    )
    .context("Failed to load reference tree")?;
    let base_root = store
        .instantiate(&mut stage, &base)
        .with_context(|| format!("Failed to instantiate base template '{}'", args.base))?;

    let outcome = repack(&mut stage, &mut store, reference_root, base_root)
        .context("Repack failed")?;

    let summary = RepackSummary {
        variant: outcome.template.as_str(),
        base: base.as_str(),
        report: &outcome.report,
    };
    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "toml" => println!("{}", toml::to_string_pretty(&summary)?),
        _ => {
            let saved = store.path_of(&outcome.template)?;
            print_text(&summary, &saved.display().to_string());
        }
    }

    Ok(())
}

fn print_text(summary: &RepackSummary<'_>, path: &str) {
    let r = summary.report;
    println!("Saved variant '{}' of '{}'", summary.variant, summary.base);
    println!("  {}", path);
    println!(
        "Nodes: {} matched, {} created, {} cleared, {} removed",
        r.nodes_matched, r.nodes_created, r.nodes_cleared, r.nodes_removed
    );
    println!(
        "Behaviors: {} updated, {} added, {} destroyed",
        r.behaviors_updated, r.behaviors_added, r.behaviors_destroyed
    );
    println!(
        "References: {} rebased, {} preserved",
        r.references_rewritten, r.references_preserved
    );
}
