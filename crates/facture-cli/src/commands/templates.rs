//! Templates command - inspect the issuer template catalog.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use facture_core::TemplateCatalog;

use super::load_config;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List templates in selection order
    List(DirArgs),

    /// Load and validate every template
    Check(DirArgs),
}

#[derive(Args)]
struct DirArgs {
    /// Template directory (default from config)
    #[arg(short, long)]
    dir: Option<PathBuf>,
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let (dir_args, list) = match args.command {
        TemplatesCommand::List(dir_args) => (dir_args, true),
        TemplatesCommand::Check(dir_args) => (dir_args, false),
    };

    let dir = match dir_args.dir {
        Some(dir) => dir,
        None => load_config(config_path)?.templates.dir.ok_or_else(|| {
            anyhow::anyhow!("No template directory configured. Pass --dir or set templates.dir.")
        })?,
    };

    let catalog = TemplateCatalog::load_dir(&dir)?;

    if list {
        list_templates(&catalog);
    } else {
        println!(
            "{} {} templates in {} are valid",
            style("✓").green(),
            catalog.len(),
            dir.display()
        );
    }

    Ok(())
}

fn list_templates(catalog: &TemplateCatalog) {
    if catalog.is_empty() {
        println!("{} No templates found.", style("ℹ").blue());
        return;
    }

    println!("{:<30} {:>8}  {}", "ISSUER", "PRIORITY", "VERSION");
    for template in catalog.templates() {
        println!(
            "{:<30} {:>8}  {}",
            template.issuer(),
            template.priority(),
            template.version().unwrap_or("-")
        );
    }
}
