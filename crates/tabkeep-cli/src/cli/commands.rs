use super::setup::{Cli, Commands, SettingsAction, TagAction};
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabkeep::api::{ApiResponse, TabkeepApi};
use tabkeep::config::{StoreConfig, CONFIG_FILE_NAME};
use tabkeep::model::{PageDraft, PagePatch};
use tabkeep::query::PageQuery;
use tabkeep::store::fs_backend::FsBackend;
use tabkeep::store::page_store::{BatchOperation, ImportBundle};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Parse arguments, run one command, print its response.
///
/// Returns the response's `success` flag.
pub async fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let config = load_config(&data_dir)?;
    debug!(data_dir = %data_dir.display(), "opening store");

    let api = TabkeepApi::open(Arc::new(FsBackend::new(&data_dir)), config)
        .await
        .with_context(|| format!("failed to open store at {}", data_dir.display()))?;

    dispatch(&api, cli.command).await
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tabkeep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "tabkeep=warn".into())
    };
    // Ignore a second init, e.g. when a test harness already installed one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    ProjectDirs::from("", "", "tabkeep")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("could not determine a data directory; pass --data-dir")
}

fn load_config(data_dir: &Path) -> Result<StoreConfig> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    let file = path.exists().then_some(path.as_path());
    StoreConfig::load(file).context("failed to load configuration")
}

async fn dispatch(api: &TabkeepApi<FsBackend>, command: Commands) -> Result<bool> {
    match command {
        Commands::Save {
            url,
            title,
            summary,
            tags,
        } => {
            let mut draft = PageDraft::new(url, title).tags(tags);
            if let Some(summary) = summary {
                draft = draft.summary(summary);
            }
            emit(api.save(draft).await)
        }
        Commands::List => emit(api.get_all().await),
        Commands::Show { id } => {
            let response = api.get(&id).await;
            match response.data {
                Some(None) => emit(ApiResponse::<()>::err(format!("Page not found: {}", id))),
                _ => emit(response),
            }
        }
        Commands::Search { query } => emit(api.search(&query).await),
        Commands::Query {
            text,
            tags,
            domains,
            from,
            to,
            archived,
            active,
            sort,
            order,
            limit,
            offset,
        } => {
            let query = PageQuery {
                query: text,
                tags,
                date_from: from,
                date_to: to,
                domains,
                archived: match (archived, active) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                sort_by: sort.into(),
                sort_order: order.into(),
                limit,
                offset,
            };
            emit(api.filtered_query(&query).await)
        }
        Commands::Delete { id } => emit(api.delete(&id).await),
        Commands::Update {
            id,
            title,
            summary,
            tags,
            archive,
            unarchive,
        } => {
            let patch = PagePatch {
                title,
                summary,
                tags: (!tags.is_empty()).then_some(tags),
                is_archived: match (archive, unarchive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                ..Default::default()
            };
            emit(api.update(&id, patch).await)
        }
        Commands::Tag { action } => {
            let (operation, ids) = match action {
                TagAction::Add { tag, ids } => (BatchOperation::AddTag(tag), ids),
                TagAction::Remove { tag, ids } => (BatchOperation::RemoveTag(tag), ids),
            };
            emit(api.batch_operation(operation, &ids).await)
        }
        Commands::BatchDelete { ids } => {
            emit(api.batch_operation(BatchOperation::Delete, &ids).await)
        }
        Commands::Export { file: None } => emit(api.export_all().await),
        Commands::Export { file: Some(path) } => {
            let response = api.export_all().await;
            let Some(bundle) = response.data else {
                return emit(response);
            };
            let text = serde_json::to_string_pretty(&bundle)?;
            fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            emit(ApiResponse::ok(json!({
                "path": path.display().to_string(),
                "pageCount": bundle.pages.len(),
            })))
        }
        Commands::Import { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let bundle: ImportBundle = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a tabkeep export", file.display()))?;
            emit(api.import_all(bundle).await)
        }
        Commands::Backups => emit(api.list_backups().await),
        Commands::Recover { id } => emit(api.recover(id.as_deref()).await),
        Commands::Info => emit(api.storage_info().await),
        Commands::Maintain => emit(api.maintenance().await),
        Commands::Limit { max } => emit(api.enforce_limit(max).await),
        Commands::Clear => emit(api.clear_all().await),
        Commands::Settings { action } => match action {
            SettingsAction::Show => emit(api.get_settings().await),
            SettingsAction::Set { json } => {
                let patch: Value =
                    serde_json::from_str(&json).context("settings must be a JSON object")?;
                emit(api.update_settings(patch).await)
            }
            SettingsAction::Reset => emit(api.reset_settings().await),
        },
    }
}

fn emit<T: Serialize>(response: ApiResponse<T>) -> Result<bool> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.success)
}
