use anyhow::{Context, Result};

use crate::ai::suggest::SuggestionProvider;
use crate::catalog::{Catalog, fetch_liked_songs, fetch_playlist_songs};
use crate::core::{AppConfig, VerifiedSong, key_set};
use crate::recommend::{SessionBuilder, sample_seed};
use crate::sync::{PublishReport, find_or_create_playlist, publish};

#[derive(Debug, Default)]
pub struct RunSummary {
    pub collected: Vec<VerifiedSong>,
    pub attempts: usize,
    pub report: Option<PublishReport>,
}

/// One full run: load the library and history, collect new songs from
/// the provider, and publish them.
pub async fn run(
    config: &AppConfig,
    catalog: &dyn Catalog,
    provider: &dyn SuggestionProvider,
) -> Result<RunSummary> {
    let pacing = &config.pacing;
    let settings = &config.loop_settings;

    let user = catalog
        .current_user()
        .await
        .context("Failed to fetch the current user")?;
    println!(
        "Logged in as {}",
        user.display_name.as_deref().unwrap_or(&user.id)
    );

    let liked = fetch_liked_songs(catalog, pacing).await;
    if liked.is_empty() {
        println!("No liked songs found. Add some songs to your library first.");
        return Ok(RunSummary::default());
    }
    let liked_keys = key_set(&liked);

    let history_playlist = match find_or_create_playlist(
        catalog,
        &user.id,
        &config.history_playlist_name,
        pacing,
    )
    .await
    {
        Ok(playlist) => Some(playlist),
        Err(e) => {
            tracing::error!(
                "Could not find or create playlist '{}': {:#}",
                config.history_playlist_name,
                e
            );
            None
        }
    };
    let history_keys = match &history_playlist {
        Some(playlist) => key_set(&fetch_playlist_songs(catalog, &playlist.id, pacing).await),
        None => Default::default(),
    };
    println!(
        "Loaded {} liked songs and {} previously recommended songs.",
        liked_keys.len(),
        history_keys.len()
    );

    let seed = sample_seed(&liked, settings.seed_sample_cap, &mut rand::thread_rng());
    let outcome = SessionBuilder::new(provider, catalog)
        .settings(settings)
        .pacing(pacing)
        .liked(liked_keys)
        .history(history_keys)
        .seed(seed)
        .build()?
        .run()
        .await;

    println!(
        "\nCollected {} new songs in {} attempts.",
        outcome.collected.len(),
        outcome.attempts
    );

    let report = publish(
        catalog,
        &user.id,
        &outcome.collected,
        &config.new_playlist_name,
        history_playlist.as_ref(),
        pacing,
    )
    .await;

    if let Some(report) = &report {
        if report.new_playlist_written {
            print_link(&config.new_playlist_name, report.new_playlist_url.as_deref());
        }
        if report.history_playlist_written {
            print_link(&config.history_playlist_name, report.history_playlist_url.as_deref());
        }
    }

    Ok(RunSummary {
        collected: outcome.collected,
        attempts: outcome.attempts,
        report,
    })
}

fn print_link(name: &str, url: Option<&str>) {
    match url {
        Some(url) => println!("'{}': {}", name, url),
        None => println!("'{}' was updated but has no public link.", name),
    }
}
