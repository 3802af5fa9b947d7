pub mod cli;
pub mod columns;
pub mod config;
pub mod io_utils;
pub mod load;
pub mod session;
pub mod source;
pub mod sql;
pub mod sync;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InspectArgs, RunArgs},
    config::{ConnectionConfig, ImportProfile, SourceOptions},
    load::LoadReport,
    session::Session,
    sync::SyncReport,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_sql_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => handle_run(&args, Pass::Both),
        Commands::Sync(args) => handle_run(&args, Pass::Sync),
        Commands::Load(args) => handle_run(&args, Pass::Load),
        Commands::Inspect(args) => handle_inspect(&args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Sync,
    Load,
    Both,
}

/// Outcome of [`import`]: the schema pass always runs before the load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub sync: SyncReport,
    pub load: LoadReport,
}

/// Rebuilds the tables for `options.folder` and then loads them.
pub fn import(session: &mut dyn Session, options: &SourceOptions) -> Result<ImportReport> {
    let sync = sync::synchronize(session, options).context("Synchronizing table schemas")?;
    let load = load::load_folder(session, options).context("Loading CSV rows")?;
    Ok(ImportReport { sync, load })
}

fn handle_run(args: &RunArgs, pass: Pass) -> Result<()> {
    let profile = ImportProfile::load_optional(args.config.as_deref())?;
    let connection = ConnectionConfig::resolve(&args.connection, &profile)?;
    let options = SourceOptions::resolve(&args.source, &profile)?;
    info!(
        "Reading CSV files from {:?} (delimiter '{}', marker '{}')",
        options.folder,
        io_utils::printable_delimiter(options.delimiter),
        options.marker
    );

    let mut session = session::connect(&connection)?;
    match pass {
        Pass::Sync => {
            let report = sync::synchronize(session.as_mut(), &options)?;
            info!("Synchronized {} table(s)", report.created.len());
        }
        Pass::Load => {
            load::load_folder(session.as_mut(), &options)?;
        }
        Pass::Both => {
            let report = import(session.as_mut(), &options)?;
            info!(
                "Import finished: {} table(s) created, {} row(s) loaded, {} row(s) rejected",
                report.sync.created.len(),
                report.load.inserted(),
                report.load.failed()
            );
        }
    }
    drop(session);
    info!("Closed connection to {}", connection.describe());
    Ok(())
}

fn handle_inspect(args: &InspectArgs) -> Result<()> {
    let profile = ImportProfile::load_optional(args.config.as_deref())?;
    let options = SourceOptions::resolve(&args.source, &profile)?;
    let descriptors = sync::plan(&options)?;
    for descriptor in &descriptors {
        let marker = match &descriptor.marker {
            Some(line) => format!(" [marker: {line}]"),
            None => String::new(),
        };
        println!(
            "{} ({} column(s)){marker}: {}",
            descriptor.name,
            descriptor.column_count(),
            descriptor.columns.join(", ")
        );
    }
    info!("Inspected {} CSV file(s)", descriptors.len());
    Ok(())
}
