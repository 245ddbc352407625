//! Taigamap CLI - forest-disturbance classifier training and inference

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use taigamap_algorithms::classify::{
    filter_and_parse, grid_search, write_records_to_path, FilterParams, HyperGrid, RandomForest,
};
use taigamap_core::{RawSample, RunConfig};

/// Years with composite coverage; runs outside this span are rejected
const FIRST_YEAR: i32 = 1985;
const LAST_YEAR: i32 = 2025;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "taigamap")]
#[command(author, version, about = "Forest-disturbance mapping pipeline", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and score classifiers for one region over the full
    /// hyperparameter grid
    Train {
        /// Analysis year
        #[arg(short, long)]
        year: i32,
        /// Region id (1-35)
        #[arg(short, long)]
        region: u8,
        /// Sample library CSV, one row per labeled point
        #[arg(short, long)]
        samples: PathBuf,
        /// Output CSV for the evaluation records
        #[arg(short, long)]
        out: PathBuf,
        /// Column holding the class label
        #[arg(long, default_value = "label")]
        label_column: String,
        /// Feature columns, comma separated; defaults to every column
        /// except the label
        #[arg(short, long, value_delimiter = ',')]
        features: Option<Vec<String>>,
        /// Band whose zero value marks a sample unusable
        #[arg(short, long)]
        quality_band: Option<String>,
    },
    /// Classify feature vectors with a stored model
    Classify {
        /// Analysis year
        #[arg(short, long)]
        year: i32,
        /// Region id (1-35)
        #[arg(short, long)]
        region: u8,
        /// Trained model artifact (JSON)
        #[arg(short, long)]
        model: PathBuf,
        /// Feature vector CSV, one row per point, columns in the model's
        /// training order
        #[arg(short, long)]
        features: PathBuf,
        /// Output CSV with a predicted label per row
        #[arg(short, long)]
        out: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn checked_config(year: i32, region: u8) -> Result<RunConfig> {
    let config = RunConfig::new(year, region).map_err(|e| anyhow::anyhow!(e))?;
    config
        .validate_year(FIRST_YEAR, LAST_YEAR)
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

/// Read the raw sample library. Every non-label column rides along as a
/// string field; coercion happens later in filtering.
fn read_samples(path: &PathBuf, label_column: &str) -> Result<(Vec<RawSample>, Vec<String>)> {
    let pb = spinner("Reading samples...");
    let mut reader = csv::Reader::from_path(path).context("Failed to open sample CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if !headers.iter().any(|h| h == label_column) {
        anyhow::bail!("Sample CSV has no '{label_column}' column");
    }
    let feature_columns: Vec<String> = headers
        .iter()
        .filter(|h| *h != label_column)
        .cloned()
        .collect();

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed CSV record")?;
        let mut label = String::new();
        let mut fields = HashMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if header == label_column {
                label = value.to_string();
            } else {
                fields.insert(header.clone(), value.to_string());
            }
        }
        samples.push(RawSample { label, fields });
    }

    pb.finish_and_clear();
    info!("Samples: {} rows, {} columns", samples.len(), headers.len());
    Ok((samples, feature_columns))
}

/// Read feature vectors in column order, empty/malformed values as 0
fn read_vectors(path: &PathBuf) -> Result<Vec<Vec<f64>>> {
    let pb = spinner("Reading feature vectors...");
    let mut reader = csv::Reader::from_path(path).context("Failed to open feature CSV")?;
    let mut vectors = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed CSV record")?;
        vectors.push(record.iter().map(taigamap_core::sample::coerce_numeric).collect());
    }
    pb.finish_and_clear();
    Ok(vectors)
}

// ─── Subcommands ────────────────────────────────────────────────────────

fn run_train(
    config: RunConfig,
    samples: &PathBuf,
    out: &PathBuf,
    label_column: &str,
    features: Option<Vec<String>>,
    quality_band: Option<String>,
) -> Result<()> {
    let start = Instant::now();
    let (raw, csv_columns) = read_samples(samples, label_column)?;
    let feature_names = features.unwrap_or(csv_columns);

    let filter = FilterParams {
        required: feature_names.clone(),
        quality_band,
    };
    let parsed = filter_and_parse(&raw, &filter);
    info!(
        "Usable samples: {} of {} after filtering",
        parsed.len(),
        raw.len()
    );

    let grid = HyperGrid::default();
    let combinations = grid.combinations().len();
    let pb = spinner(&format!("Evaluating {combinations} combinations..."));
    let records =
        grid_search(&parsed, &feature_names, config.region, &grid).context("Grid search failed")?;
    pb.finish_and_clear();

    write_records_to_path(out, &records).context("Failed to write records CSV")?;

    println!("Evaluation records saved to: {}", out.display());
    println!("  Combinations scored: {}", records.len());
    println!("  Processing time: {:.2?}", start.elapsed());
    Ok(())
}

fn run_classify(config: RunConfig, model: &PathBuf, features: &PathBuf, out: &PathBuf) -> Result<()> {
    let start = Instant::now();
    let forest = RandomForest::load(model)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to load model")?;
    info!(
        "Model for region {}: {} trees, {} features",
        config.region,
        forest.tree_count(),
        forest.n_features()
    );

    let vectors = read_vectors(features)?;
    for (i, vector) in vectors.iter().enumerate() {
        if vector.len() != forest.n_features() {
            anyhow::bail!(
                "Row {} has {} features but the model expects {}",
                i + 1,
                vector.len(),
                forest.n_features()
            );
        }
    }

    let pb = spinner(&format!("Classifying {} points...", vectors.len()));
    let mut writer = csv::Writer::from_path(out).context("Failed to create output CSV")?;
    writer.write_record(["label"])?;
    for vector in &vectors {
        writer.write_record([forest.predict(vector).to_string()])?;
    }
    writer.flush()?;
    pb.finish_and_clear();

    println!("Labels saved to: {}", out.display());
    println!("  Points classified: {}", vectors.len());
    println!("  Processing time: {:.2?}", start.elapsed());
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Train {
            year,
            region,
            samples,
            out,
            label_column,
            features,
            quality_band,
        } => {
            let config = checked_config(year, region)?;
            run_train(config, &samples, &out, &label_column, features, quality_band)
        }
        Commands::Classify {
            year,
            region,
            model,
            features,
            out,
        } => {
            let config = checked_config(year, region)?;
            run_classify(config, &model, &features, &out)
        }
    }
}
