use anyhow::Result;
use clap::{Parser, Subcommand};
use duels_build::BuildConfig;
use duels_cards::{CardDatabase, CardResolver};

#[derive(Debug, Parser)]
#[command(name = "duels-cli")]
#[command(about = "Builds and publishes the Duels loot buckets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate recent loot offers and publish the buckets file
    Build,
    /// Load the card database and run its self-check
    CheckCards,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let summary = duels_build::run_build_once_from_env().await?;
            println!(
                "build complete: status={} run_id={} rows={} buckets={} anomalies={} stored={}",
                summary.response().status_code,
                summary.run_id,
                summary.offer_rows,
                summary.published_buckets,
                summary.anomalies.len(),
                summary.stored.location
            );
        }
        Commands::CheckCards => {
            let config = BuildConfig::from_env();
            let source = config.card_source()?;
            let cards = CardDatabase::initialize(source.as_ref()).await?;
            cards.health_check()?;
            println!("cards ok: {} cards from {}", cards.len(), source.describe());
        }
    }

    Ok(())
}
