use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use devspeedtest::cli::{Cli, OutputMode};
use devspeedtest::engine::client::build_client;
use devspeedtest::engine::store::{JsonFileStore, ResultStore, SavedResult};
use devspeedtest::engine::{SessionOutcome, SpeedTest};
use devspeedtest::output::{csv, json, simple, summary};
use devspeedtest::tui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        clap_complete::generate(shell, &mut Cli::command(), "devspeedtest", &mut io::stdout());
        return Ok(());
    }

    let mode = cli.output_mode();
    // The TUI owns the terminal; log lines would tear the screen.
    if mode != OutputMode::Tui {
        init_tracing();
    }

    let store = JsonFileStore::new(cli.results_file.clone().unwrap_or_else(default_results_path));
    if cli.last {
        match store.load_last()? {
            Some(record) => summary::print_summary(&record),
            None => eprintln!("No saved result at {}", store.path().display()),
        }
        return Ok(());
    }

    let local_addr = cli.local_address().map_err(anyhow::Error::msg)?;
    let client = build_client(local_addr)?;
    let mut speedtest = SpeedTest::new(client, cli.to_config());
    if !cli.no_save {
        speedtest = speedtest.with_store(Arc::new(store));
    }
    let speedtest = Arc::new(speedtest);

    if mode == OutputMode::Tui {
        return tui::run(speedtest).await;
    }

    let handle = speedtest.start().context("a session is already running")?;
    let canceller = Arc::clone(&speedtest);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    match handle.await? {
        SessionOutcome::Completed(report) => match mode {
            OutputMode::Simple => simple::print_simple(&report),
            OutputMode::Json => json::print_json(&report)?,
            OutputMode::JsonPretty => json::print_json_pretty(&report)?,
            OutputMode::Csv => csv::print_csv(&report)?,
            OutputMode::Summary | OutputMode::Tui => {
                summary::print_summary(&SavedResult::from(&*report))
            }
        },
        SessionOutcome::Aborted => eprintln!("Speed test aborted"),
        SessionOutcome::Failed(message) => bail!("Speed test failed: {message}"),
    }

    Ok(())
}

fn init_tracing() {
    Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn default_results_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".devspeedtest")
        .join("last.json")
}
