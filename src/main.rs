use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use folio_sync::config;
use folio_sync::images;
use folio_sync::model::Language;
use folio_sync::notion::NotionClient;
use folio_sync::retry::RetryPolicy;
use folio_sync::sync::Pipeline;

#[derive(Debug, Parser)]
#[command(author, version, about = "Sync Notion portfolio content to local snapshots")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sync the project list for one language
    Projects {
        #[arg(long, value_enum, default_value_t = Language::Zh)]
        language: Language,
    },
    /// Sync one project's content (id is always the primary-language id)
    Content {
        project_id: String,
        #[arg(long, value_enum, default_value_t = Language::Zh)]
        language: Language,
    },
    /// Sync the project list and every project's content
    All {
        #[arg(long, value_enum, default_value_t = Language::Zh)]
        language: Language,
    },
    /// Print the local project list in display order
    List {
        #[arg(long, value_enum, default_value_t = Language::Zh)]
        language: Language,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let retry = RetryPolicy::new(
        cfg.sync.max_retries,
        Duration::from_millis(cfg.sync.retry_base_ms),
    );
    let client = NotionClient::new(cfg.notion.token.clone(), cfg.notion.version.clone(), retry);
    let pipeline = Pipeline::new(client, &cfg);

    match args.command {
        Command::Projects { language } => {
            let summary = pipeline.sync_all_projects(language).await?;
            info!(count = summary.count, %language, "project list sync complete");
        }
        Command::Content {
            project_id,
            language,
        } => {
            let snapshot = pipeline.sync_project_content(&project_id, language).await?;
            info!(
                blocks = snapshot.blocks.len(),
                source = %snapshot.source_project_id,
                %language,
                "content sync complete"
            );
        }
        Command::All { language } => {
            let summary = pipeline.sync_all_projects(language).await?;

            // Content requests are keyed by primary-language ids.
            let keys: Vec<String> = if language == Language::PRIMARY {
                summary.projects.iter().map(|p| p.id.clone()).collect()
            } else {
                let primary = pipeline.store().read_project_list(Language::PRIMARY).await?;
                if primary.is_empty() {
                    error!(
                        "no {} project list found; sync the primary language first",
                        Language::PRIMARY
                    );
                }
                primary.iter().map(|p| p.id.clone()).collect()
            };

            let mut synced = 0usize;
            let mut failed = 0usize;
            for project_id in &keys {
                match pipeline.sync_project_content(project_id, language).await {
                    Ok(_) => synced += 1,
                    Err(err) => {
                        failed += 1;
                        error!(error = %err, %project_id, "failed to sync project content");
                    }
                }
            }
            info!(synced, failed, %language, "full sync complete");
        }
        Command::List { language } => {
            let mut projects = pipeline.store().read_project_list(language).await?;
            images::sort_by_display_order(&mut projects);
            for project in &projects {
                println!(
                    "{}  {}  [{}]  {}",
                    project.slug,
                    project.name,
                    project.year,
                    project.tags.join(", ")
                );
            }
        }
    }

    Ok(())
}
