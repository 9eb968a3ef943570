//! Spotify Web API implementation of `Catalog`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::catalog::{Catalog, Page, Playlist, User};
use crate::core::{SongRef, VerifiedSong};

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    name: Option<String>,
    uri: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

impl TrackObject {
    /// Tracks without a name or artist (local files, removed tracks)
    /// are skipped. Only the first listed artist is used.
    fn song_ref(&self) -> Option<SongRef> {
        let name = self.name.as_deref().filter(|n| !n.is_empty())?;
        let artist = self.artists.first()?;
        Some(SongRef::new(name, &artist.name))
    }

    fn verified(&self) -> Option<VerifiedSong> {
        let song = self.song_ref()?;
        let uri = self.uri.as_deref()?;
        Some(VerifiedSong::new(uri, &song.track, &song.artist))
    }
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Paging<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct OwnerObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistObject {
    id: String,
    name: String,
    owner: OwnerObject,
    external_urls: Option<ExternalUrls>,
}

impl From<PlaylistObject> for Playlist {
    fn from(p: PlaylistObject) -> Self {
        Playlist {
            id: p.id,
            name: p.name,
            owner_id: p.owner.id,
            url: p.external_urls.and_then(|u| u.spotify),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    #[allow(dead_code)]
    snapshot_id: Option<String>,
}

fn song_page(paging: Paging<TrackItem>) -> Page<SongRef> {
    Page {
        has_next: paging.next.is_some(),
        items: paging
            .items
            .iter()
            .filter_map(|item| item.track.as_ref().and_then(TrackObject::song_ref))
            .collect(),
    }
}

/// Authenticated client for the Spotify Web API.
pub struct SpotifyClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, SPOTIFY_API_URL)
    }

    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let res = req.bearer_auth(&self.access_token).send().await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("{} failed: {} ({})", what, status, text);
        }
        serde_json::from_str(&text).with_context(|| format!("Unexpected {} response", what))
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn current_user(&self) -> Result<User> {
        let req = self.client.get(self.url("/me"));
        self.send(req, "Current user fetch").await
    }

    async fn saved_tracks(&self, offset: usize, limit: usize) -> Result<Page<SongRef>> {
        let req = self
            .client
            .get(self.url("/me/tracks"))
            .query(&[("limit", limit), ("offset", offset)]);
        let paging: Paging<TrackItem> = self.send(req, "Saved tracks fetch").await?;
        Ok(song_page(paging))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SongRef>> {
        let req = self
            .client
            .get(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("fields", "items(track(name,uri,artists(name))),next".to_string()),
            ]);
        let paging: Paging<TrackItem> = self.send(req, "Playlist tracks fetch").await?;
        Ok(song_page(paging))
    }

    async fn user_playlists(&self, offset: usize, limit: usize) -> Result<Page<Playlist>> {
        let req = self
            .client
            .get(self.url("/me/playlists"))
            .query(&[("limit", limit), ("offset", offset)]);
        let paging: Paging<PlaylistObject> = self.send(req, "Playlists fetch").await?;
        Ok(Page {
            has_next: paging.next.is_some(),
            items: paging.items.into_iter().map(Playlist::from).collect(),
        })
    }

    async fn create_playlist(&self, user_id: &str, name: &str, public: bool) -> Result<Playlist> {
        let req = self
            .client
            .post(self.url(&format!("/users/{}/playlists", user_id)))
            .json(&json!({"name": name, "public": public}));
        let playlist: PlaylistObject = self.send(req, "Playlist create").await?;
        Ok(playlist.into())
    }

    async fn search_track(&self, track: &str, artist: &str) -> Result<Option<VerifiedSong>> {
        let query = format!("track:{} artist:{}", track, artist);
        let req = self.client.get(self.url("/search")).query(&[
            ("q", query.as_str()),
            ("type", "track"),
            ("limit", "1"),
        ]);
        let resp: SearchResponse = self.send(req, "Track search").await?;
        Ok(resp.tracks.items.first().and_then(TrackObject::verified))
    }

    async fn replace_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let req = self
            .client
            .put(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&json!({"uris": uris}));
        let _: SnapshotResponse = self.send(req, "Playlist replace").await?;
        Ok(())
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let req = self
            .client
            .post(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&json!({"uris": uris}));
        let _: SnapshotResponse = self.send(req, "Playlist append").await?;
        Ok(())
    }
}
