mod console;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, FormSettings, HostBridge, HttpTransport, ReportFormController, ReportTransport,
    SimulatedTransport, SubmitOutcome,
};
use serde_json::Value;
use shared::domain::{FieldId, FieldMarker, FileCandidate};
use storage::{KeyValueStore, SnapshotPersistence, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::{ConsoleHost, ConsoleView};

#[derive(Parser, Debug)]
#[command(about = "Fill in and submit the daily manager report")]
struct Cli {
    /// Overrides the configured database location.
    #[arg(long)]
    database_url: Option<String>,
    /// Run as if inside the mini-app shell.
    #[arg(long)]
    host: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show saved answers and progress.
    Status,
    Set {
        field: FieldId,
        value: String,
    },
    /// Apply answers from a JSON object keyed by field id.
    Fill {
        answers: PathBuf,
    },
    Submit {
        #[arg(long = "attach", num_args = 1..)]
        attachments: Vec<PathBuf>,
        #[arg(long)]
        simulate_failure: bool,
    },
    /// Press the shell back button.
    Back {
        #[arg(long)]
        assume_yes: bool,
    },
    /// Forget the saved report.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(database_url) = cli.database_url.clone() {
        settings.database_url = Some(database_url);
    }

    let storage = Storage::new(&resolve_database_url(&settings)?).await?;
    storage.health_check().await?;
    let last_saved = storage
        .updated_at(&settings.storage_key)
        .await?
        .map(|at| at.to_rfc3339());
    let store: Arc<dyn KeyValueStore> = Arc::new(storage);
    let persistence = SnapshotPersistence::with_key(store, settings.storage_key.clone());

    if matches!(cli.command, Command::Clear) {
        persistence.clear().await?;
        println!("saved report cleared");
        return Ok(());
    }

    let simulate_failure = matches!(
        cli.command,
        Command::Submit {
            simulate_failure: true,
            ..
        }
    );
    let hosted = cli.host || matches!(cli.command, Command::Back { .. });
    let assume_yes = matches!(cli.command, Command::Back { assume_yes: true });
    let host = if hosted {
        HostBridge::attached(Arc::new(ConsoleHost::new(assume_yes)))
    } else {
        HostBridge::detached()
    };

    let mut controller = ReportFormController::new(
        &settings,
        persistence,
        build_transport(&settings, simulate_failure),
        Arc::new(ConsoleView),
    )
    .with_host(host);
    controller.start().await;

    let result = run(&mut controller, cli.command, &settings, hosted, last_saved).await;

    if controller.page_exit().await {
        info!("unsent answers kept for the next session");
    }
    controller.stop();
    result
}

async fn run(
    controller: &mut ReportFormController,
    command: Command,
    settings: &FormSettings,
    hosted: bool,
    last_saved: Option<String>,
) -> Result<()> {
    match command {
        Command::Status => {
            print_status(controller);
            match last_saved {
                Some(at) => println!("last saved {at}"),
                None => println!("nothing saved yet"),
            }
        }
        Command::Set { field, value } => {
            controller.handle_input(field, &value).await;
            print_status(controller);
        }
        Command::Fill { answers } => {
            for (field, value) in read_answers(&answers).await? {
                controller.handle_input(field, &value).await;
            }
            print_status(controller);
        }
        Command::Submit { attachments, .. } => {
            if !attachments.is_empty() {
                let mut candidates = Vec::with_capacity(attachments.len());
                for path in &attachments {
                    candidates.push(read_candidate(path).await?);
                }
                controller.handle_files(candidates).await;
            }

            match controller.submit().await {
                SubmitOutcome::Submitted => {
                    if hosted {
                        tokio::time::sleep(settings.host_close_delay).await;
                        controller.poll_timers().await;
                    }
                }
                SubmitOutcome::Invalid => {
                    print_status(controller);
                    return Err(anyhow!("report is incomplete"));
                }
                SubmitOutcome::Failed(err) => {
                    return Err(err).context("report submission failed");
                }
                SubmitOutcome::Ignored => println!("report already submitted"),
            }
        }
        Command::Back { .. } => {
            if !controller.on_back_button().await {
                println!("report left open");
            }
        }
        // Handled before the controller starts.
        Command::Clear => {}
    }
    Ok(())
}

fn print_status(controller: &ReportFormController) {
    let progress = controller.progress();
    println!("{} ({:.0}%)", progress.label(), progress.percentage());
    for field in FieldId::value_fields() {
        let marker = match controller.form().marker(field) {
            FieldMarker::Valid => "ok",
            FieldMarker::Invalid => "!!",
            FieldMarker::Unmarked => "  ",
        };
        println!("[{marker}] {field}: {}", controller.form().value(field));
    }
    for name in controller.attachments().names() {
        println!("[ok] receipt: {name}");
    }
}

fn build_transport(settings: &FormSettings, simulate_failure: bool) -> Arc<dyn ReportTransport> {
    if simulate_failure {
        return Arc::new(SimulatedTransport::failing(settings.simulated_delay));
    }
    match &settings.endpoint {
        Some(endpoint) => {
            info!(%endpoint, "reports will be posted to endpoint");
            Arc::new(HttpTransport::new(endpoint.clone()))
        }
        None => Arc::new(SimulatedTransport::new(settings.simulated_delay)),
    }
}

fn resolve_database_url(settings: &FormSettings) -> Result<String> {
    if let Some(database_url) = &settings.database_url {
        return Ok(database_url.clone());
    }
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("unable to resolve local app data dir"))?;
    Ok(base
        .join("manager_report")
        .join("report.db")
        .display()
        .to_string())
}

async fn read_answers(path: &Path) -> Result<Vec<(FieldId, String)>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read answers from {}", path.display()))?;
    let answers: BTreeMap<String, Value> =
        serde_json::from_str(&raw).context("answers file must be a JSON object")?;

    answers
        .into_iter()
        .map(|(key, value)| {
            let field = key.parse::<FieldId>()?;
            let value = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Ok((field, value))
        })
        .collect()
}

async fn read_candidate(path: &Path) -> Result<FileCandidate> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read attachment {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("attachment.bin")
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(FileCandidate {
        name,
        size_bytes: content.len() as u64,
        mime_type,
        content,
    })
}
