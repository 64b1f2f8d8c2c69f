//! intake-forms - command line front end for the intake wizard engine
//!
//! Checks form definitions, reports active steps and validation results for
//! a set of answers, and can drive a full wizard session into the JSON file
//! store.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use intake_forms::commands;
use intake_forms::config::WizardConfig;
use intake_forms::forms::WizardOptions;
use intake_forms::session::SessionStep;
use intake_forms::store::JsonFileStore;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_forms=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = WizardConfig::load()?;

    match cli.command {
        Commands::Check { definition } => check(&definition, &config),
        Commands::Steps { definition, data } => steps(&definition, &data, &config),
        Commands::Validate {
            definition,
            data,
            json,
        } => validate(&definition, &data, json, &config),
        Commands::Submit {
            definition,
            data,
            store,
        } => submit(&definition, &data, store, &config).await,
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn check(path: &Path, config: &WizardConfig) -> Result<ExitCode> {
    let definition = commands::load_definition(path, WizardOptions::from(config))?;
    println!("{}", commands::summary(&definition));
    Ok(ExitCode::SUCCESS)
}

fn steps(definition: &Path, data: &Path, config: &WizardConfig) -> Result<ExitCode> {
    let definition = commands::load_definition(definition, WizardOptions::from(config))?;
    let data = commands::load_data(data)?;
    for (position, line) in commands::active_steps(&definition, &data).iter().enumerate() {
        println!(
            "{:>2}. {} - {} ({} fields)",
            position + 1,
            line.id,
            line.title,
            line.shown_fields
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn validate(definition: &Path, data: &Path, json: bool, config: &WizardConfig) -> Result<ExitCode> {
    let definition = commands::load_definition(definition, WizardOptions::from(config))?;
    let data = commands::load_data(data)?;
    let report = commands::validate(&definition, &data);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for error in &report.errors {
            println!("error   {}: {}", error.field, error.message);
        }
        for warning in &report.warnings {
            println!("warning {}: {}", warning.rule, warning.message);
        }
        if report.is_valid {
            println!("ok ({} warnings)", report.warnings.len());
        }
    }
    Ok(exit_code(report.is_valid))
}

async fn submit(
    definition: &Path,
    data: &Path,
    store: Option<PathBuf>,
    config: &WizardConfig,
) -> Result<ExitCode> {
    let definition = commands::load_definition(definition, WizardOptions::from(config))?;
    let answers = commands::load_data(data)?;
    let store = JsonFileStore::new(store.unwrap_or_else(|| config.store_dir()));
    tracing::info!(store = %store.root().display(), "using file store");

    match commands::submit(definition, &answers, store, config.auto_save_every()).await? {
        SessionStep::Submitted { receipt, warnings } => {
            for warning in &warnings {
                println!("warning {}: {}", warning.rule, warning.message);
            }
            println!("submitted: {receipt}");
            Ok(ExitCode::SUCCESS)
        }
        SessionStep::Blocked(result) => {
            for error in &result.errors {
                eprintln!("error   {}: {}", error.field, error.message);
            }
            Ok(ExitCode::FAILURE)
        }
        SessionStep::Failed { reason } => {
            eprintln!("{reason}");
            Ok(ExitCode::FAILURE)
        }
        SessionStep::Moved { .. } => Ok(ExitCode::FAILURE),
    }
}
