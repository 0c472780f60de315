//! Anvil CLI - Command-line interface for anvil template tooling

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{repack, template};

#[derive(Parser)]
#[command(name = "anvil")]
#[command(about = "Template tooling for avatar creators", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebase an edited tree onto a different base template, saving a new variant
    Repack {
        /// Path to the edited tree (.template.toml)
        reference: String,

        /// Name of the base template to rebase onto
        #[arg(long)]
        base: String,

        /// Template directory (overrides config)
        #[arg(long)]
        templates: Option<String>,

        /// Output format (text, json or toml)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Template operations
    #[command(subcommand)]
    Template(template::TemplateCommands),
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" | "toml" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json, toml", s)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Repack {
            reference,
            base,
            templates,
            format,
        } => repack::run(repack::RepackArgs {
            reference,
            base,
            templates,
            format,
        }),
        Commands::Template(cmd) => template::run(cmd),
    }
}
