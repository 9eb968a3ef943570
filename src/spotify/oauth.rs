//! Spotify authorization code flow and the on-disk token cache.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const SCOPES: &str =
    "user-library-read playlist-modify-public playlist-read-private playlist-read-collaborative";

/// Refresh this long before the token actually expires.
const EXPIRY_LEEWAY_SECS: i64 = 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl TokenResponse {
    fn into_cached(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> CachedToken {
        CachedToken {
            access_token: self.access_token,
            token_type: self.token_type,
            // Spotify may omit the refresh token when refreshing
            refresh_token: self.refresh_token.or(previous_refresh),
            scope: self.scope,
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

pub struct SpotifyOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_url: String,
}

impl SpotifyOAuth {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self::with_accounts_url(client_id, client_secret, redirect_uri, SPOTIFY_ACCOUNTS_URL)
    }

    pub fn with_accounts_url(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        accounts_url: &str,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}",
            self.accounts_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES)
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<CachedToken> {
        let resp = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;
        Ok(resp.into_cached(Utc::now(), None))
    }

    pub async fn refresh(&self, token: &CachedToken) -> Result<CachedToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .context("Cached token has no refresh token")?;
        let resp = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        Ok(resp.into_cached(Utc::now(), token.refresh_token.clone()))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = format!("{}/api/token", self.accounts_url);
        let res = Client::new()
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("Token request failed: {} ({})", status, text);
        }
        serde_json::from_str(&text).context("Unexpected token response")
    }
}

/// Pulls the authorization code out of whatever the user pasted: the
/// full redirect URL or just the code itself.
pub fn code_from_redirect(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

pub fn load_cached_token(path: &Path) -> Result<Option<CachedToken>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token cache {}", path.display()))?;
    match serde_json::from_str(&text) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable token cache {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

pub fn save_cached_token(path: &Path, token: &CachedToken) -> Result<()> {
    let text = serde_json::to_string_pretty(token)?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write token cache {}", path.display()))?;
    Ok(())
}
