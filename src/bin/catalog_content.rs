//! catalog-content command line interface
//!
//! # Usage
//!
//! ```bash
//! # Print the permission catalog
//! catalog-content groups
//!
//! # Resolve an item's effective content from JSON records
//! catalog-content resolve --template template.json --item item.json
//!
//! # Show the audited diff between two entity snapshots
//! catalog-content diff --before old.json --after new.json --locale en-GB
//!
//! # Run the write path end to end against in-memory stores
//! catalog-content demo
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;

use catalog_content::{telemetry, CatalogConfig, MemoryStores};
use catalog_content_core::audit::{self, format_changes, group_by_permission, DisplayLocale, PageRequest};
use catalog_content_core::{
    permissions, resolve_effective_content, CatalogService, ItemDescription,
    ItemDescriptionPatch, Principal, Section, Template, VersionDraft,
};

#[derive(Parser)]
#[command(name = "catalog-content")]
#[command(version)]
#[command(about = "Resolve templated catalog content and inspect audit diffs")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// List permission groups in display order
    Groups,

    /// Merge a template version with an item's overrides
    Resolve {
        /// Template record (JSON)
        #[arg(short, long)]
        template: PathBuf,

        /// Item description record (JSON)
        #[arg(short, long)]
        item: PathBuf,
    },

    /// Diff two entity snapshots, ignoring bookkeeping fields
    Diff {
        /// Snapshot before the change (JSON)
        #[arg(short, long)]
        before: PathBuf,

        /// Snapshot after the change (JSON)
        #[arg(short, long)]
        after: PathBuf,

        /// Locale for dates; defaults to CATALOG_LOCALE
        #[arg(long)]
        locale: Option<DisplayLocale>,
    },

    /// Create a template and an item, edit it, and print its history
    Demo,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let config = CatalogConfig::from_env();
    telemetry::init(&config.log_filter);

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Groups => cmd_groups(cli.format),
        Commands::Resolve { template, item } => cmd_resolve(&template, &item, cli.format),
        Commands::Diff {
            before,
            after,
            locale,
        } => cmd_diff(&before, &after, locale.unwrap_or(config.locale), cli.format),
        Commands::Demo => cmd_demo(&config, cli.format).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

fn cmd_groups(format: OutputFormat) -> Result<()> {
    let groups = permissions::groups();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&groups)?),
        OutputFormat::Pretty => {
            for g in groups {
                println!("{:>3}  {:<12} {:<24} [{}]", g.order, g.key, g.label, g.icon);
            }
        }
    }
    Ok(())
}

fn cmd_resolve(template_path: &Path, item_path: &Path, format: OutputFormat) -> Result<()> {
    let template: Template = read_json(template_path)?;
    let item: ItemDescription = read_json(item_path)?;
    if let Err(e) = template.validate() {
        tracing::warn!("template in {} is inconsistent: {e}", template_path.display());
    }

    let Some(content) = resolve_effective_content(&template, &item) else {
        match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Pretty => println!(
                "no content: neither version {} nor the active version exists",
                item.template_version
            ),
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&content)?),
        OutputFormat::Pretty => {
            if content.fell_back {
                println!("(version {} missing, using active version)", item.template_version);
            }
            println!("v{}", content.version);
            println!("{}", content.intro);
            for section in &content.sections {
                println!();
                println!("## {}", section.title);
                println!("{}", section.content);
            }
        }
    }
    Ok(())
}

fn cmd_diff(
    before_path: &Path,
    after_path: &Path,
    locale: DisplayLocale,
    format: OutputFormat,
) -> Result<()> {
    let before: serde_json::Value = read_json(before_path)?;
    let after: serde_json::Value = read_json(after_path)?;
    let changes = audit::diff(&before, &after);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&changes)?),
        OutputFormat::Pretty => {
            if changes.is_empty() {
                println!("no changes");
            }
            for row in format_changes(&changes, locale) {
                println!("{}: {} -> {}", row.field, row.before, row.after);
            }
        }
    }
    Ok(())
}

async fn cmd_demo(config: &CatalogConfig, format: OutputFormat) -> Result<()> {
    let stores = MemoryStores::new();
    let service = stores.service().with_paging(config.paging);
    let seller = Principal::own("seller-1");

    let template = service.create_template(&seller, "Trail shoes").await?;
    let draft = VersionDraft {
        intro: Some("Grip for every surface.".into()),
        sections: vec![
            Section::new("fit", "Fit", "True to size."),
            Section::new("care", "Care", "Hand wash only."),
        ],
    };
    service
        .publish_template_version(&seller, template.id, draft, true)
        .await?;

    let item = service.create_item(&seller, "Ridge Runner", template.id).await?;
    let patch = ItemDescriptionPatch::default()
        .with_description(Some("Our lightest trail shoe.".into()))
        .set_override("fit", "Runs half a size small.");
    service
        .update_item_description(&seller, item.id, patch)
        .await?;

    let intruder = Principal::own("seller-2");
    let denied = service
        .update_item_description(
            &intruder,
            item.id,
            ItemDescriptionPatch::default().set_override("care", "Machine wash."),
        )
        .await;
    anyhow::ensure!(
        denied.is_err(),
        "second seller was allowed to edit an item they do not own"
    );
    if let Err(e) = &denied {
        tracing::info!("second seller rejected as expected: {e}");
    }

    let content = service
        .effective_content(item.id)
        .await?
        .context("demo item has no resolvable content")?;
    let history = service
        .item_history(&item.id.to_string(), PageRequest::default())
        .await?;
    let audit_log = service.security_audit(PageRequest::default()).await?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "content": content,
                "history": history,
                "auditGroups": group_by_permission(&audit_log.items),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Pretty => {
            println!("{}", content.intro);
            for section in &content.sections {
                println!("  {}: {}", section.title, section.content);
            }
            println!();
            println!(
                "history of item {} ({} record(s)):",
                item.id, history.pagination.total
            );
            for record in &history.items {
                println!(
                    "  {} {} by {}",
                    config.locale.format_datetime(&record.recorded_at),
                    record.action.as_deref().unwrap_or("change"),
                    record.actor_id
                );
                for row in format_changes(&record.changes, config.locale) {
                    println!("    {}: {} -> {}", row.field, row.before, row.after);
                }
            }
            println!();
            for bucket in group_by_permission(&audit_log.items) {
                let label = bucket
                    .group
                    .as_ref()
                    .map(|g| g.label.as_str())
                    .unwrap_or("Other");
                println!("{label}: {} record(s)", bucket.records.len());
            }
        }
    }
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
