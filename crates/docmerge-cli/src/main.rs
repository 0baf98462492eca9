//! docmerge - Store department documents and merge spreadsheets or PDFs.

mod cli;
mod output;

use clap::Parser;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Acting, Cli, Command};
use crate::output::OutputFormatter;
use docmerge::config::CompressionLevel;
use docmerge::library::{DocumentLibrary, UploadRequest};
use docmerge::model::{Actor, MergeKind, Role};
use docmerge::service::MergeService;
use docmerge::store::SqliteStore;
use docmerge::{Config, DocMergeError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let formatter = OutputFormatter::new(cli.quiet, cli.verbose > 0, cli.json);

    if let Err(err) = run(cli, &formatter).await {
        if formatter.is_verbose() {
            formatter.error(&format!("Error: {err}"));
        } else {
            formatter.error(&format!("Error: {}", err.user_message()));
        }
        process::exit(err.exit_code());
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over `-v`/`-q` when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_log_filter(verbose, quiet)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn default_log_filter(verbose: u8, quiet: bool) -> String {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    format!("{level},sqlx=warn")
}

/// Build the library configuration from global flags.
fn build_config(cli: &Cli) -> Result<Config, DocMergeError> {
    let mut config = Config::default();
    if let Some(root) = &cli.root {
        config.working_root = root.clone();
    }
    if let Some(upload_dir) = &cli.upload_dir {
        config.upload_dir = upload_dir.clone();
    }
    match (&cli.database_url, &cli.root) {
        (Some(url), _) => config.database_url = url.clone(),
        (None, Some(root)) => {
            config.database_url = format!("sqlite://{}", root.join("docmerge.db").display());
        }
        (None, None) => {}
    }
    config.jobs = cli.jobs;

    if let Command::MergePdfs { compression, .. } = &cli.command {
        config.compression = compression.parse::<CompressionLevel>()?;
    }

    config
        .validate()
        .map_err(|e| DocMergeError::invalid_config(e.to_string()))?;
    Ok(config)
}

async fn resolve_actor(store: &SqliteStore, acting: &Acting) -> Result<Actor, DocMergeError> {
    let user = store
        .find_user(&acting.user)
        .await?
        .ok_or_else(|| DocMergeError::UserNotFound {
            username: acting.user.clone(),
        })?;
    debug!(username = %user.username, role = %user.role, "acting user resolved");
    Ok(user.actor())
}

/// Main application logic.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<(), DocMergeError> {
    let config = build_config(&cli)?;
    formatter.debug(&format!("Database: {}", config.database_url));
    formatter.debug(&format!("Upload root: {}", config.upload_root().display()));
    let store = Arc::new(SqliteStore::open(&config).await?);

    let result = dispatch(cli.command, store.clone(), config, formatter).await;
    store.close().await;
    result
}

async fn dispatch(
    command: Command,
    store: Arc<SqliteStore>,
    config: Config,
    formatter: &OutputFormatter,
) -> Result<(), DocMergeError> {
    let library = DocumentLibrary::new(store.clone(), config.clone());

    match command {
        Command::Init {
            admin_username,
            admin_password,
        } => {
            let created = store
                .provision_admin(&admin_username, &admin_password)
                .await?;
            formatter.json(&serde_json::json!({ "adminCreated": created }))?;
            if created {
                formatter.success(&format!("Created admin account '{admin_username}'"));
            } else {
                formatter.info("An admin account already exists");
            }
        }

        Command::AddUser {
            username,
            password,
            role,
        } => {
            let role: Role = role.parse()?;
            let user = store.create_user(&username, &password, role).await?;
            formatter.json(&user)?;
            formatter.success(&format!("Created {} account '{}'", user.role, user.username));
        }

        Command::Upload {
            acting,
            title,
            description,
            session,
            semester,
            file,
        } => {
            let actor = resolve_actor(&store, &acting).await?;
            let request = UploadRequest {
                title,
                description,
                session,
                semester,
            };
            let document = library.upload(&file, request, &actor).await?;
            formatter.json(&document)?;
            formatter.success(&format!(
                "Uploaded {} as document {}",
                file.display(),
                document.id
            ));
            formatter.detail("Stored at", &document.file_path);
        }

        Command::List { acting, kind } => {
            let actor = resolve_actor(&store, &acting).await?;
            match kind {
                Some(kind) => {
                    let kind: MergeKind = kind.parse()?;
                    let paths = library.list_paths(kind, &actor).await?;
                    formatter.json(&paths)?;
                    if formatter.should_print() {
                        for path in &paths {
                            println!("{path}");
                        }
                    }
                }
                None => {
                    let documents = library.list(&actor).await?;
                    formatter.documents(&documents)?;
                }
            }
        }

        Command::Download { acting, id, output } => {
            let actor = resolve_actor(&store, &acting).await?;
            let download = library.download(id, &actor).await?;
            copy_to(&download.path, &output).await?;
            formatter.json(&serde_json::json!({
                "id": download.document.id,
                "output": output,
                "contentType": download.content_type,
            }))?;
            formatter.success(&format!(
                "Saved '{}' to {}",
                download.document.title,
                output.display()
            ));
            formatter.detail("Content type", download.content_type);
        }

        Command::Delete { acting, id } => {
            let actor = resolve_actor(&store, &acting).await?;
            library.delete(id, &actor).await?;
            formatter.json(&serde_json::json!({ "deleted": id }))?;
            formatter.success(&format!("Deleted document {id}"));
        }

        Command::Classify {
            acting,
            id,
            session,
            semester,
        } => {
            let actor = resolve_actor(&store, &acting).await?;
            if session.is_none() && semester.is_none() {
                formatter.warning("Nothing to update: pass --session and/or --semester");
            }
            let document = library.classify(id, session, semester, &actor).await?;
            formatter.json(&document)?;
            formatter.success(&format!("Updated document {id}"));
        }

        Command::MergeSheets { acting, ids } => {
            let actor = resolve_actor(&store, &acting).await?;
            let service = MergeService::new(store.clone(), config);
            let outcome = service.merge_spreadsheets(&ids, &actor).await?;
            formatter.merge_outcome(&outcome)?;
        }

        Command::MergePdfs { acting, ids, .. } => {
            let actor = resolve_actor(&store, &acting).await?;
            let service = MergeService::new(store.clone(), config);
            let outcome = service.merge_pdfs(&ids, &actor).await?;
            formatter.merge_outcome(&outcome)?;
        }
    }

    Ok(())
}

async fn copy_to(source: &Path, output: &Path) -> Result<(), DocMergeError> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocMergeError::write_failed(parent, e))?;
    }
    tokio::fs::copy(source, output)
        .await
        .map_err(|e| DocMergeError::write_failed(output, e))?;
    Ok(())
}
