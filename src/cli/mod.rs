use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod recommend;

use crate::ai::suggest::build_provider;
use crate::core::AppConfig;
use crate::spotify::SpotifyClient;

/// Builds a fresh playlist of songs you don't already know, picked by
/// an LLM from a sample of your liked songs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {}

pub async fn run() -> Result<()> {
    let _args = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    println!(
        "Using {} with model {}",
        config.provider.kind, config.provider.model
    );

    let token = auth::access_token(&config).await?;
    let catalog = SpotifyClient::new(&token);
    let provider = build_provider(&config.provider);

    recommend::run(&config, &catalog, provider.as_ref()).await?;
    println!("\nDone.");
    Ok(())
}
