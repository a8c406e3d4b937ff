//! car-tool
//!
//! Inspect default tables and preview what selecting one does to a session.

mod backend;

use anyhow::{bail, Context, Result};
use backend::FileBackend;
use car_core::wire::decode_key_payload;
use car_core::{CarConfig, Command, Dispatcher, Outcome, ReportBackend, SessionController};
use car_keys::KeyCatalog;
use car_session::PropertyMap;
use clap::{value_parser, Arg, ArgMatches, Command as Cli};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Session state printed by `reset`
#[derive(Debug, Serialize)]
struct ResetReport<'a> {
    changed: bool,
    properties: &'a PropertyMap,
}

fn cli() -> Cli {
    Cli::new("car-tool")
        .version(car_core::VERSION)
        .about("CAR report assembly tool")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Controller configuration (TOML)"),
        )
        .subcommand(
            Cli::new("classify")
                .about("Print the key groups of a default table")
                .arg(
                    Arg::new("keys")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Key table as a flat JSON object"),
                ),
        )
        .subcommand(
            Cli::new("reset")
                .about("Select a default table and print the resulting session")
                .arg(
                    Arg::new("table")
                        .long("table")
                        .required(true)
                        .help("Key table to select, relative to --root"),
                )
                .arg(
                    Arg::new("session")
                        .long("session")
                        .help("Session to load first, relative to --root"),
                )
                .arg(
                    Arg::new("root")
                        .long("root")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory tables and sessions are read from"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CarConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CarConfig::default(),
    };

    match matches.subcommand() {
        Some(("classify", args)) => classify(args).await,
        Some(("reset", args)) => reset(args, config).await,
        Some((other, _)) => bail!("unknown command {other}"),
        None => bail!("no command given"),
    }
}

async fn classify(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("keys")
        .context("no key table given")?;
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let catalog = KeyCatalog::new(decode_key_payload(&text)?);
    tracing::info!(keys = catalog.len(), "key table classified");
    println!("{}", serde_json::to_string_pretty(&catalog.groups())?);
    Ok(())
}

async fn reset(args: &ArgMatches, config: CarConfig) -> Result<()> {
    let table = args.get_one::<String>("table").context("no table given")?;
    let root = args
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let backend: Arc<dyn ReportBackend> = Arc::new(FileBackend::new(root));
    let mut dispatcher = Dispatcher::new(backend, &config);
    let mut controller = SessionController::new(config);

    if let Some(session) = args.get_one::<String>("session") {
        dispatcher.dispatch(&mut controller, Command::LoadSession(session.clone()))?;
        settle(&mut dispatcher, &mut controller).await?;
    }

    dispatcher.dispatch(&mut controller, Command::SelectDefaultTable(table.clone()))?;
    settle(&mut dispatcher, &mut controller).await?;

    let report = ResetReport {
        changed: controller.session().is_changed(),
        properties: controller.session().properties(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Apply every pending completion, failing on the first failed request
async fn settle(dispatcher: &mut Dispatcher, controller: &mut SessionController) -> Result<()> {
    let outcomes = dispatcher.run_until_idle(controller).await;

    let mut first_error = None;
    for notice in controller.drain_notices() {
        if notice.is_error() {
            tracing::error!("{}", notice.text);
            first_error.get_or_insert(notice.text);
        } else {
            tracing::info!("{}", notice.text);
        }
    }

    if outcomes.contains(&Outcome::Failed) {
        bail!(first_error.unwrap_or_else(|| "request failed".to_string()));
    }
    Ok(())
}
