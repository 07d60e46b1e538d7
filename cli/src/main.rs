use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use gateway::{GatewayConfig, GatewayError, PlanClient, SaveOutcome};
use planner::doc::{ElementId, LoadReport, PlanSnapshot, PlanStore};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("cannot read or write {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{count} element(s) violate plan invariants; fix them or pass --drop-invalid")]
    InvalidElements { count: usize },
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),
}

#[derive(Parser, Debug)]
#[command(name = "floorplan", about = "Floor-plan backend CLI")]
struct Cli {
    #[arg(long, env = "FLOORPLAN_BASE_URL", default_value = gateway::config::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Plan(PlanCommand),
    Element(ElementCommand),
    Docs(DocsCommand),
    Safety(SafetyCommand),
}

#[derive(Args, Debug)]
struct PlanCommand {
    #[command(subcommand)]
    command: PlanSubcommand,
}

#[derive(Subcommand, Debug)]
enum PlanSubcommand {
    /// Print a per-kind summary of a stored plan.
    Show { plan_id: u64 },
    /// Download a plan as JSON.
    Pull {
        plan_id: u64,
        #[arg(long, help = "Output file; stdout when absent")]
        out: Option<PathBuf>,
    },
    /// Validate a local plan file and save it.
    Push {
        plan_id: u64,
        file: PathBuf,
        #[arg(long, default_value_t = false, help = "Save the valid elements even if some are rejected")]
        drop_invalid: bool,
    },
    /// Validate a local plan file without contacting the backend.
    Check { file: PathBuf },
}

#[derive(Args, Debug)]
struct ElementCommand {
    #[command(subcommand)]
    command: ElementSubcommand,
}

#[derive(Subcommand, Debug)]
enum ElementSubcommand {
    Delete { element_id: ElementId },
    /// Print the machine info panel.
    Info { element_id: ElementId },
}

#[derive(Args, Debug)]
struct DocsCommand {
    #[command(subcommand)]
    command: DocsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DocsSubcommand {
    List { plan_id: u64, element_id: ElementId },
    Upload { plan_id: u64, element_id: ElementId, file: PathBuf },
}

#[derive(Args, Debug)]
struct SafetyCommand {
    #[command(subcommand)]
    command: SafetySubcommand,
}

#[derive(Subcommand, Debug)]
enum SafetySubcommand {
    /// Store safety properties (a JSON object) for an element.
    Set {
        plan_id: u64,
        element_id: ElementId,
        #[arg(long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = GatewayConfig {
        base_url: cli.base_url.trim_end_matches('/').to_owned(),
        ..GatewayConfig::from_env()
    };
    let client = PlanClient::new(&config)?;

    match cli.command {
        Command::Plan(plan) => run_plan(&client, plan).await,
        Command::Element(element) => run_element(&client, element).await,
        Command::Docs(docs) => run_docs(&client, docs).await,
        Command::Safety(safety) => run_safety(&client, safety).await,
    }
}

async fn run_plan(client: &PlanClient, plan: PlanCommand) -> Result<(), CliError> {
    match plan.command {
        PlanSubcommand::Show { plan_id } => {
            let snapshot = client.load_plan(plan_id).await?;
            let (store, report) = hydrate(snapshot);
            for (kind, count) in summarize(&store) {
                println!("{kind:<16} {count}");
            }
            print_rejections(&report);
            Ok(())
        }
        PlanSubcommand::Pull { plan_id, out } => {
            let snapshot = client.load_plan(plan_id).await?;
            let rendered = serde_json::to_string_pretty(&snapshot)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, rendered)
                        .await
                        .map_err(|source| CliError::Io { path: path.clone(), source })?;
                    info!(plan_id, path = %path.display(), "plan written");
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
        PlanSubcommand::Push { plan_id, file, drop_invalid } => {
            let (store, report) = read_plan_file(&file).await?;
            print_rejections(&report);
            if !report.rejected.is_empty() && !drop_invalid {
                return Err(CliError::InvalidElements { count: report.rejected.len() });
            }
            match client.save_plan(plan_id, &store.snapshot()).await? {
                SaveOutcome::Saved => println!("saved {} element(s) to plan {plan_id}", store.len()),
                SaveOutcome::Superseded => println!("save superseded by a newer save"),
            }
            Ok(())
        }
        PlanSubcommand::Check { file } => {
            let (store, report) = read_plan_file(&file).await?;
            println!("{} element(s) valid, {} rejected", store.len(), report.rejected.len());
            print_rejections(&report);
            if report.rejected.is_empty() {
                Ok(())
            } else {
                Err(CliError::InvalidElements { count: report.rejected.len() })
            }
        }
    }
}

async fn run_element(client: &PlanClient, element: ElementCommand) -> Result<(), CliError> {
    match element.command {
        ElementSubcommand::Delete { element_id } => {
            client.delete_element(element_id).await?;
            println!("deleted element {element_id}");
        }
        ElementSubcommand::Info { element_id } => println!("{}", client.machine_info(element_id).await?),
    }
    Ok(())
}

async fn run_docs(client: &PlanClient, docs: DocsCommand) -> Result<(), CliError> {
    match docs.command {
        DocsSubcommand::List { plan_id, element_id } => println!("{}", client.documents(plan_id, element_id).await?),
        DocsSubcommand::Upload { plan_id, element_id, file } => {
            let name = file_name(&file)?;
            let bytes = tokio::fs::read(&file).await.map_err(|source| CliError::Io { path: file.clone(), source })?;
            println!("{}", client.upload_document(plan_id, element_id, name, bytes).await?);
        }
    }
    Ok(())
}

async fn run_safety(client: &PlanClient, safety: SafetyCommand) -> Result<(), CliError> {
    match safety.command {
        SafetySubcommand::Set { plan_id, element_id, data } => {
            let value = serde_json::from_str::<Value>(&data)?;
            println!("{}", client.save_safety_info(plan_id, element_id, &value).await?);
        }
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Load a snapshot into a store, applying every plan invariant.
fn hydrate(snapshot: PlanSnapshot) -> (PlanStore, LoadReport) {
    let mut store = PlanStore::new();
    let report = store.load(snapshot);
    (store, report)
}

fn parse_plan(text: &str) -> Result<(PlanStore, LoadReport), CliError> {
    let snapshot = serde_json::from_str::<PlanSnapshot>(text)?;
    Ok(hydrate(snapshot))
}

async fn read_plan_file(path: &Path) -> Result<(PlanStore, LoadReport), CliError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    parse_plan(&text)
}

/// Element counts per kind, in wire-name order.
fn summarize(store: &PlanStore) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for el in store.elements() {
        *counts.entry(el.kind().as_str()).or_insert(0) += 1;
    }
    counts
}

fn print_rejections(report: &LoadReport) {
    for (id, err) in &report.rejected {
        warn!(id, error = %err, "element rejected");
        eprintln!("rejected element {id}: {err}");
    }
}

fn file_name(path: &Path) -> Result<String, CliError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::NoFileName(path.to_path_buf()))
}
