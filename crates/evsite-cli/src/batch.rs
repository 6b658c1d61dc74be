//! The `batch` subcommand: survey every row of a CSV file.
//!
//! Input rows are `lat,lon,fast,rapid,ultra` under a header. Malformed rows
//! do not abort the batch: they carry through as records annotated with the
//! parse error, so the output always aligns row-for-row with the input.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;

use evsite_core::{AppConfig, ChargerConfig, ChargerMix, Coordinate, PowerRatings};
use evsite_enrich::{BatchItem, Enricher, SiteRequest};

use crate::output::{self, OutputFormat};

#[derive(Debug, clap::Args)]
pub struct BatchArgs {
    /// CSV file with columns lat,lon,fast,rapid,ultra.
    pub input: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Power rating per fast charger, in kW.
    #[arg(long, default_value_t = 22.0)]
    pub fast_kw: f64,
    /// Power rating per rapid charger, in kW.
    #[arg(long, default_value_t = 60.0)]
    pub rapid_kw: f64,
    /// Power rating per ultra-rapid charger, in kW.
    #[arg(long, default_value_t = 150.0)]
    pub ultra_kw: f64,

    /// Capacity margin factor applied to every row's kVA figure.
    #[arg(long, default_value_t = 1.0)]
    pub margin: f64,
}

#[derive(Debug, serde::Deserialize)]
struct RawRow {
    lat: f64,
    lon: f64,
    #[serde(default)]
    fast: i64,
    #[serde(default)]
    rapid: i64,
    #[serde(default)]
    ultra: i64,
}

pub async fn run(config: &AppConfig, args: BatchArgs) -> anyhow::Result<()> {
    let ratings = PowerRatings::new(args.fast_kw, args.rapid_kw, args.ultra_kw)?;
    let items = read_rows(&args, ratings)?;
    let total = items.len();
    anyhow::ensure!(total > 0, "{} contains no data rows", args.input.display());

    let malformed = items
        .iter()
        .filter(|item| matches!(item, BatchItem::Malformed(_)))
        .count();
    if malformed > 0 {
        tracing::warn!(malformed, total, "some rows failed to parse");
    }

    // Best-effort cancellation: finish the current row, annotate the rest.
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received — stopping after the current row");
            cancel_flag.store(true, Ordering::Relaxed);
        }
    });

    let enricher = Enricher::from_config(config)?;
    let records = enricher.process_batch(items, &cancel).await;

    let failed_rows = records
        .iter()
        .filter(|record| record.row_error.is_some())
        .count();
    tracing::info!(
        total,
        ok = total - failed_rows,
        failed = failed_rows,
        "batch complete"
    );

    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            output::write_records(&records, args.format, &mut file)?;
            file.flush()?;
        }
        None => {
            output::write_records(&records, args.format, &mut std::io::stdout().lock())?;
        }
    }
    Ok(())
}

/// Parses the input CSV into batch items, converting each row's parse or
/// validation error into a [`BatchItem::Malformed`] annotation instead of
/// failing the run. Only an unreadable file is fatal.
fn read_rows(args: &BatchArgs, ratings: PowerRatings) -> anyhow::Result<Vec<BatchItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let mut items = Vec::new();
    for (index, row) in reader.deserialize::<RawRow>().enumerate() {
        // Data starts on line 2, after the header.
        let line = index + 2;
        let item = match row {
            Ok(raw) => match validate_row(&raw, ratings, args.margin) {
                Ok(request) => BatchItem::Request(request),
                Err(e) => BatchItem::Malformed(format!("line {line}: {e}")),
            },
            Err(e) => BatchItem::Malformed(format!("line {line}: {e}")),
        };
        items.push(item);
    }
    Ok(items)
}

fn validate_row(
    raw: &RawRow,
    ratings: PowerRatings,
    margin: f64,
) -> Result<SiteRequest, evsite_core::CoreError> {
    let coordinate = Coordinate::new(raw.lat, raw.lon)?;
    let mix = ChargerMix::new(raw.fast, raw.rapid, raw.ultra)?;
    let chargers = ChargerConfig::new(mix, ratings, margin)?;
    Ok(SiteRequest {
        coordinate,
        chargers,
    })
}
