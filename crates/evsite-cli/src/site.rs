//! The `site` subcommand: survey a single coordinate.

use evsite_core::{AppConfig, ChargerConfig, ChargerMix, Coordinate, PowerRatings};
use evsite_enrich::{Enricher, SiteRequest};

use crate::output::{self, OutputFormat};

#[derive(Debug, clap::Args)]
#[command(allow_negative_numbers = true)]
pub struct SiteArgs {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,

    /// Number of fast (AC) charging points.
    #[arg(long, default_value_t = 0)]
    pub fast: i64,
    /// Number of rapid (DC) charging points.
    #[arg(long, default_value_t = 0)]
    pub rapid: i64,
    /// Number of ultra-rapid charging points.
    #[arg(long, default_value_t = 0)]
    pub ultra: i64,

    /// Power rating per fast charger, in kW.
    #[arg(long, default_value_t = 22.0)]
    pub fast_kw: f64,
    /// Power rating per rapid charger, in kW.
    #[arg(long, default_value_t = 60.0)]
    pub rapid_kw: f64,
    /// Power rating per ultra-rapid charger, in kW.
    #[arg(long, default_value_t = 150.0)]
    pub ultra_kw: f64,

    /// Capacity margin factor applied to the computed kVA figure.
    #[arg(long, default_value_t = 1.0)]
    pub margin: f64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

pub async fn run(config: &AppConfig, args: SiteArgs) -> anyhow::Result<()> {
    let coordinate = Coordinate::new(args.lat, args.lon)?;
    let mix = ChargerMix::new(args.fast, args.rapid, args.ultra)?;
    let ratings = PowerRatings::new(args.fast_kw, args.rapid_kw, args.ultra_kw)?;
    let chargers = ChargerConfig::new(mix, ratings, args.margin)?;

    let enricher = Enricher::from_config(config)?;
    let record = enricher
        .process(&SiteRequest {
            coordinate,
            chargers,
        })
        .await;

    output::write_records(&[record], args.format, &mut std::io::stdout().lock())?;
    Ok(())
}
