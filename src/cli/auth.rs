use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::io::{self, Write};

use crate::core::AppConfig;
use crate::spotify::oauth::{code_from_redirect, load_cached_token, save_cached_token};
use crate::spotify::{CachedToken, SpotifyOAuth};

/// Access token for the catalog. Reuses the cached token while it is
/// valid, refreshes it when it has expired, and otherwise walks the
/// user through the browser authorization.
pub async fn access_token(config: &AppConfig) -> Result<String> {
    let oauth = SpotifyOAuth::new(
        &config.spotify_client_id,
        &config.spotify_client_secret,
        &config.spotify_redirect_uri,
    );
    let cache_path = config.token_cache_path.as_path();

    if let Some(cached) = load_cached_token(cache_path)? {
        if !cached.is_expired(Utc::now()) {
            tracing::debug!("Using cached token from {}", cache_path.display());
            return Ok(cached.access_token);
        }
        if cached.refresh_token.is_some() {
            match oauth.refresh(&cached).await {
                Ok(token) => {
                    save_cached_token(cache_path, &token)?;
                    tracing::info!("Refreshed access token");
                    return Ok(token.access_token);
                }
                Err(e) => tracing::warn!("Token refresh failed, re-authorizing: {:#}", e),
            }
        }
    }

    let token = authorize_interactively(&oauth).await?;
    save_cached_token(cache_path, &token)?;
    println!("Authorization saved to {}", cache_path.display());
    Ok(token.access_token)
}

async fn authorize_interactively(oauth: &SpotifyOAuth) -> Result<CachedToken> {
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        oauth.authorize_url()
    );
    print!("Paste the URL you were redirected to here: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read redirect URL")?;

    let code = code_from_redirect(&input)
        .ok_or_else(|| anyhow!("No authorization code found in the pasted URL"))?;
    oauth.exchange_code(&code).await
}
