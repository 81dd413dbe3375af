mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ridewise_core::{EngineConfig, RatingRecord, TripListing, UserId};
use ridewise_engine::{DriverReport, ReputationEngine};
use ridewise_store::{JsonStore, RatingSource, TripSource};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "ridewise", version)]
#[command(about = "Rank trip listings by predicted driver reputation")]
struct Cli {
    /// Engine config file (TOML). Defaults apply when omitted.
    #[arg(long, global = true, env = "RIDEWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the effective engine config to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank trip listings by their drivers' predicted reputation
    Rank {
        #[command(flatten)]
        data: DataArgs,

        /// Only trips this rider holds a passenger record on (DuckDB only)
        #[arg(long)]
        rider: Option<UserId>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Per-driver rating summary and predicted reputation
    Drivers {
        #[command(flatten)]
        data: DataArgs,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Score feedback texts on the 1-5 sentiment scale
    Score {
        /// Feedback texts to score
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

#[derive(clap::Args)]
struct DataArgs {
    /// Data directory: ratings.json + trips.json, or <table>.parquet for DuckDB
    #[arg(long, env = "RIDEWISE_DATA")]
    data: PathBuf,

    /// Persistent DuckDB database; imported from the data directory on first use
    #[arg(long, env = "RIDEWISE_DUCKDB")]
    duckdb: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if cli.verbose {
        eprintln!("{}", config.display_summary());
    }

    let engine = Arc::new(
        ReputationEngine::from_config(&config).context("initialising reputation engine")?,
    );

    match cli.command {
        Command::Rank { data, rider, json } => cmd_rank(engine, &data, rider, json).await,
        Command::Drivers { data, json } => cmd_drivers(engine, &data, json).await,
        Command::Score { texts } => cmd_score(&engine, &texts),
    }
}

async fn cmd_rank(
    engine: Arc<ReputationEngine>,
    data: &DataArgs,
    rider: Option<UserId>,
    json: bool,
) -> anyhow::Result<()> {
    let (trips, ratings) = load_data(data, rider)?;
    let ranked = engine
        .rank_blocking(trips, ratings)
        .await
        .context("ranking trips")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        display::print_table(&display::trips_batch(&ranked)?)?;
    }
    Ok(())
}

async fn cmd_drivers(
    engine: Arc<ReputationEngine>,
    data: &DataArgs,
    json: bool,
) -> anyhow::Result<()> {
    let ratings = load_ratings(data)?;
    let DriverReport {
        summaries,
        reputations,
    } = engine
        .report_blocking(ratings)
        .await
        .context("predicting reputations")?;

    if json {
        let rows: Vec<serde_json::Value> = summaries
            .values()
            .map(|s| {
                serde_json::json!({
                    "driver_id": s.driver_id,
                    "sample_count": s.sample_count,
                    "avg_numeric_rating": s.avg_numeric_rating,
                    "avg_sentiment_score": s.avg_sentiment_score,
                    "predicted_rating": reputations.get(&s.driver_id).map(|r| r.predicted_rating),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        display::print_table(&display::drivers_batch(&summaries, &reputations)?)?;
    }
    Ok(())
}

fn cmd_score(engine: &ReputationEngine, texts: &[String]) -> anyhow::Result<()> {
    let feedback: Vec<Option<&str>> = texts.iter().map(|t| Some(t.as_str())).collect();
    let scores = engine.scorer().score_batch(&feedback);
    for (text, score) in texts.iter().zip(scores) {
        println!("{score:.2}\t{text}");
    }
    Ok(())
}

// ── Data loading ──

fn load_data(
    data: &DataArgs,
    rider: Option<UserId>,
) -> anyhow::Result<(Vec<TripListing>, Vec<RatingRecord>)> {
    if let Some(db_path) = &data.duckdb {
        return load_duck(&data.data, db_path, rider);
    }
    if rider.is_some() {
        bail!("--rider needs passenger records; pass --duckdb");
    }
    let store = JsonStore::open(&data.data)
        .with_context(|| format!("opening data directory {}", data.data.display()))?;
    let trips = store.all_trip_listings().context("loading trips")?;
    let ratings = store.all_rating_records().context("loading ratings")?;
    Ok((trips, ratings))
}

fn load_ratings(data: &DataArgs) -> anyhow::Result<Vec<RatingRecord>> {
    if let Some(db_path) = &data.duckdb {
        let (_, ratings) = load_duck(&data.data, db_path, None)?;
        return Ok(ratings);
    }
    let store = JsonStore::open(&data.data)
        .with_context(|| format!("opening data directory {}", data.data.display()))?;
    store.all_rating_records().context("loading ratings")
}

#[cfg(feature = "duckdb")]
fn load_duck(
    data_dir: &Path,
    db_path: &Path,
    rider: Option<UserId>,
) -> anyhow::Result<(Vec<TripListing>, Vec<RatingRecord>)> {
    let store = ridewise_store::DuckStore::open_persistent(db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;
    if !store.has_tables() {
        tracing::info!(data = %data_dir.display(), "importing parquet tables");
        store
            .load_all(data_dir)
            .with_context(|| format!("importing {}", data_dir.display()))?;
    }

    let trips = match rider {
        Some(rider_id) => store
            .trip_listings_for_rider(rider_id)
            .with_context(|| format!("loading trips for rider {rider_id}"))?,
        None => store.all_trip_listings().context("loading trips")?,
    };
    let ratings = store.all_rating_records().context("loading ratings")?;
    Ok((trips, ratings))
}

#[cfg(not(feature = "duckdb"))]
fn load_duck(
    _data_dir: &Path,
    _db_path: &Path,
    _rider: Option<UserId>,
) -> anyhow::Result<(Vec<TripListing>, Vec<RatingRecord>)> {
    bail!("ridewise was built without the 'duckdb' feature")
}
