// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use currency_converter::api::{ErApiClient, RateProvider};
use currency_converter::config::{self, Config, StorageKind};
use currency_converter::db::SqliteStore;
use currency_converter::models::export_rates_csv;
use currency_converter::storage::{JsonFileStore, KeyValueStore};
use currency_converter::utils::{
    format_conversion, format_currency, format_last_updated, format_status,
};
use currency_converter::{initialize, RateStore, StartupOutcome};

#[derive(Parser)]
#[command(name = "currency-converter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert amounts between currencies using cached exchange rates", long_about = None)]
struct Cli {
    /// Fetch fresh rates even when cached rates exist
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount from one currency to another
    #[command(allow_negative_numbers = true)]
    Convert {
        #[arg(value_name = "AMOUNT", default_value_t = 1.0)]
        amount: f64,

        /// Source currency (defaults to config `default_from`)
        #[arg(short, long)]
        from: Option<String>,

        /// Target currency (defaults to config `default_to`)
        #[arg(short, long)]
        to: Option<String>,

        /// Exchange source and target
        #[arg(long)]
        swap: bool,
    },
    /// Fetch the latest rates from the provider
    Refresh,
    /// List cached rates
    Rates,
    /// List the currencies offered for conversion
    Currencies {
        /// Add every currency the provider quotes first
        #[arg(long)]
        sync: bool,
    },
    /// Add a currency code to the known set
    AddCurrency {
        #[arg(value_name = "CODE")]
        code: String,
    },
    /// Show whether rates are known and when they were fetched
    Status,
    /// Set the default source and target currencies in the config file
    Defaults {
        #[arg(short, long)]
        from: Option<String>,

        #[arg(short, long)]
        to: Option<String>,
    },
    /// Export cached rates to CSV
    Export {
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    log::debug!("Using config: {:?}", config);

    let storage = open_storage(&config).await?;
    let provider = ErApiClient::new(config.api_url.as_str());
    let mut store = RateStore::new(provider, storage);
    let force_refresh = cli.refresh || config.refresh_on_start;

    match cli.command {
        Commands::Convert {
            amount,
            from,
            to,
            swap,
        } => {
            let from = from.unwrap_or_else(|| config.default_from.clone());
            let to = to.unwrap_or_else(|| config.default_to.clone());
            let (from, to) = if swap { (to, from) } else { (from, to) };

            start(&mut store, force_refresh).await?;
            let Some(snapshot) = store.snapshot() else {
                return Ok(());
            };

            match store.convert(amount, &from, &to) {
                Some(converted) => {
                    println!("{}", format_conversion(amount, &from, converted, &to));
                    println!("{}", format_last_updated(snapshot));
                }
                None => log::warn!("No rate for {} -> {}", from, to),
            }
        }
        Commands::Refresh => {
            if let StartupOutcome::Fetched(snapshot) = start(&mut store, true).await? {
                println!(
                    "✅ Exchange rates updated ({} currencies)",
                    snapshot.table().len()
                );
                println!("{}", format_last_updated(&snapshot));
            }
        }
        Commands::Rates => {
            start(&mut store, force_refresh).await?;
            if let Some(snapshot) = store.snapshot() {
                for (code, rate) in snapshot.table().iter() {
                    println!("{:<4} {}", code, rate);
                }
                println!("{}", format_last_updated(snapshot));
            }
        }
        Commands::Currencies { sync } => {
            store.load_known_currencies().await;
            if sync {
                match store.fetch_currencies().await {
                    Ok(added) => println!("✅ {} new currencies from provider", added),
                    Err(e) => eprintln!("Error fetching currencies: {}", e),
                }
            }
            for currency in store.known_currencies().iter() {
                println!("{}", format_currency(currency));
            }
        }
        Commands::AddCurrency { code } => {
            store.load_known_currencies().await;
            if store.add_currency(&code).await? {
                println!("✅ Added {}", code.trim().to_uppercase());
            } else if code.trim().is_empty() {
                eprintln!("Currency code is empty");
            } else {
                println!("{} is already known", code.trim().to_uppercase());
            }
        }
        Commands::Status => {
            store.load_cached().await;
            println!("{}", format_status(store.snapshot()));
        }
        Commands::Defaults { from, to } => {
            let path = config::get_config_path();
            let mut file_config = config::load_config_from(&path)?;
            file_config.set_defaults(from.as_deref(), to.as_deref());
            config::save_config(&file_config, &path)?;
            println!(
                "✅ Default conversion {} -> {} saved to {}",
                file_config.default_from,
                file_config.default_to,
                path.display()
            );
        }
        Commands::Export { output } => {
            start(&mut store, force_refresh).await?;
            if let Some(snapshot) = store.snapshot() {
                let path = export_rates_csv(snapshot, &output)?;
                println!("📁 CSV file created: {}", path.display());
            }
        }
    }

    Ok(())
}

async fn open_storage(config: &Config) -> Result<Box<dyn KeyValueStore>> {
    let storage: Box<dyn KeyValueStore> = match config.storage {
        StorageKind::Json => Box::new(JsonFileStore::new(&config.storage_path)),
        StorageKind::Sqlite => Box::new(SqliteStore::open(&config.storage_path).await?),
    };
    Ok(storage)
}

/// Run startup behind a spinner and report a failed fetch to the user
async fn start<P, S>(store: &mut RateStore<P, S>, force_refresh: bool) -> Result<StartupOutcome>
where
    P: RateProvider,
    S: KeyValueStore,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Loading exchange rates...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = initialize(store, force_refresh).await;
    spinner.finish_and_clear();

    if let StartupOutcome::Failed(e) = &outcome {
        eprintln!(
            "Failed to fetch exchange rates. Please try again later. ({})",
            e
        );
        if store.snapshot().is_some() {
            eprintln!("Using cached rates instead.");
        }
    }

    Ok(outcome)
}
