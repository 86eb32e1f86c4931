use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use betform::config::{AppConfig, Secrets};
use betform::db::Store;
use betform::engine::InsightsEngine;
use betform::logging;
use betform::odds::api::OddsApiClient;
use betform::odds::{NullOddsProvider, OddsProvider};
use betform::server::{self, AppState};
use betform::stats::api::StatsApiClient;
use betform::stats::CachingProvider;

#[derive(Parser)]
#[command(name = "betform", about = "Form-based betting insights for football fixtures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Season pattern profile for one team
    Team { name: String },
    /// Full analysis for a fixture
    Fixture { home: String, away: String },
    /// Serve the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load()?;

    logging::init_logging(&config.monitoring)?;

    tracing::info!(
        league = %config.providers.stats.league,
        odds_enabled = config.providers.odds.enabled,
        "betform starting"
    );

    let engine = Arc::new(build_engine(&config, &secrets).await?);

    match cli.command {
        Command::Team { name } => {
            let report = engine.analyze_team(&name).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Fixture { home, away } => {
            let report = engine.analyze_fixture(&home, &away).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve => {
            let state = AppState::new(engine);
            server::serve(state, &config.server.host, config.server.port).await?;
        }
    }

    Ok(())
}

async fn build_engine(config: &AppConfig, secrets: &Secrets) -> Result<InsightsEngine> {
    let run_store = Store::new(&config.database.path).await?;
    let cache_store = Store::new(&config.database.path).await?;

    let stats = CachingProvider::new(
        StatsApiClient::new(config, secrets)?,
        cache_store,
        config.cache.ttl_minutes,
    );

    let odds: Arc<dyn OddsProvider> = if config.providers.odds.enabled {
        Arc::new(OddsApiClient::new(config, secrets)?)
    } else {
        Arc::new(NullOddsProvider)
    };

    Ok(InsightsEngine::new(Arc::new(stats), odds).with_store(run_store))
}
