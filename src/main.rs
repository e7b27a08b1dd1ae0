use clap::{Parser, Subcommand};
use poe_trade_query::models::{ItemFilters, ParsedItem, PricingOptions, StatFilter};
use poe_trade_query::{
    create_trade_request, init_logging, AppConfig, Result, SessionStore, StatDatabase, TradeClient,
    TradeError,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

/// Price checks against the Path of Exile trade site
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via POE_TRADE_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// League to search, overrides the configured one
    #[arg(long, global = true)]
    league: Option<String>,

    /// Divine:exalted ratio, overrides the configured one
    #[arg(long, global = true)]
    ratio: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the trade request for an item without contacting the trade site
    Query {
        /// JSON file with `filters`, `stats` and `item`
        #[arg(short, long)]
        input: String,
    },
    /// Search the trade site and print the cheapest listings
    Search {
        /// JSON file with `filters`, `stats` and `item`
        #[arg(short, long)]
        input: String,
    },
}

#[derive(Debug, Deserialize)]
struct PriceCheckInput {
    #[serde(default)]
    filters: ItemFilters,
    #[serde(default)]
    stats: Vec<StatFilter>,
    #[serde(default)]
    item: ParsedItem,
}

async fn read_input(path: &str) -> Result<PriceCheckInput> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content)
        .map_err(|e| TradeError::ParseError(format!("Failed to parse input {}: {}", path, e)))
}

async fn run(args: Args) -> Result<()> {
    init_logging()?;
    info!("Starting poe-trade v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(league) = args.league {
        config.league = league;
    }
    if let Some(ratio) = args.ratio {
        config.divine_exalt_ratio = Some(ratio);
    }
    config.validate()?;
    info!(league = %config.league, api = %config.api_base_url, "Configuration loaded");

    let stats = match &config.stats_path {
        Some(path) => StatDatabase::load_from_file(path).await?,
        None => StatDatabase::embedded()?,
    };

    match args.command {
        Command::Query { input } => {
            let input = read_input(&input).await?;
            let request = create_trade_request(&input.filters, &input.stats, &input.item, &stats)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Command::Search { input } => {
            let input = read_input(&input).await?;

            let session = SessionStore::new();
            if let Ok(token) = std::env::var("POESESSID") {
                session.set_session(token);
            }

            let client = TradeClient::from_config(&config, Arc::new(session), Arc::new(stats))?;
            let opts = PricingOptions {
                account_name: config.account_name.clone(),
                divine_exalt_ratio: config.divine_exalt_ratio,
            };

            let check = client
                .price_check(&input.filters, &input.stats, &input.item, &config.league, &opts)
                .await?;
            info!(query_id = %check.id, total = check.total, listed = check.listings.len(), "Price check done");
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
