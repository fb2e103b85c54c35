//! fxconv - convert amounts using daily exchange rates
//!
//! Loads the saved rates, refreshes them from the provider when they have gone
//! stale, then either runs the interactive prompt or performs a single
//! conversion from the command line.

use std::io;
use std::process;

use chrono::Local;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fxconv::app::{App, StartupStatus};
use fxconv::cache::RateStore;
use fxconv::cli::{Cli, Mode, StartupConfig};
use fxconv::currency::CurrencyDirectory;
use fxconv::data::HttpFetcher;
use fxconv::prompt;

/// Sets up logging to stderr. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let directory = CurrencyDirectory::new();
    let config = match StartupConfig::from_cli(&cli, &directory) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    init_tracing(config.verbose);

    if config.mode == Mode::List {
        prompt::print_currency_names(&mut io::stdout().lock(), directory.all())?;
        return Ok(());
    }

    let store = match &config.cache_dir {
        Some(dir) => Some(RateStore::with_dir(dir.clone())),
        None => RateStore::new(),
    };
    if store.is_none() {
        warn!("No cache directory available, exchange rates will not be saved");
    }

    let fetcher = HttpFetcher::new(config.fetch.clone());
    let mut app = App::new(store, fetcher, directory, &config.fetch);

    match app.startup(Local::now().naive_local()).await {
        Ok(StartupStatus::Stale(e)) => {
            eprintln!("Warning: using saved exchange rates ({})", e);
        }
        Ok(StartupStatus::Ready(_)) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    let converter = app.converter();
    match config.mode {
        Mode::Convert { amount, currency } => match converter.convert(amount, currency.code) {
            Ok(converted) => println!("{}", converted),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Mode::Interactive => {
            let mut input = io::stdin().lock();
            let mut output = io::stdout().lock();
            prompt::run(&mut input, &mut output, &converter)?;
        }
        Mode::List => {}
    }

    Ok(())
}
