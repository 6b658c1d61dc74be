use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod batch;
mod output;
mod site;

#[derive(Debug, Parser)]
#[command(name = "evsite")]
#[command(about = "EV charger site survey: power sizing plus local context for a coordinate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Survey a single site.
    Site(site::SiteArgs),
    /// Survey every row of a CSV file of coordinates and charger counts.
    Batch(batch::BatchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = evsite_core::load_app_config()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Site(args) => site::run(&config, args).await,
        Commands::Batch(args) => batch::run(&config, args).await,
    }
}
