//! The music catalog as seen by the rest of the app: the user's saved
//! songs, their playlists, track search and playlist writes.

pub mod library;

pub use library::{fetch_liked_songs, fetch_playlist_songs};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{SongRef, VerifiedSong};

/// Largest number of items a single playlist write may carry.
pub const MAX_ITEMS_PER_WRITE: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn current_user(&self) -> Result<User>;

    async fn saved_tracks(&self, offset: usize, limit: usize) -> Result<Page<SongRef>>;

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SongRef>>;

    async fn user_playlists(&self, offset: usize, limit: usize) -> Result<Page<Playlist>>;

    async fn create_playlist(&self, user_id: &str, name: &str, public: bool) -> Result<Playlist>;

    /// Best match for the given title and artist, if the catalog has one.
    async fn search_track(&self, track: &str, artist: &str) -> Result<Option<VerifiedSong>>;

    /// Sets the playlist's contents to exactly `uris`, at most
    /// `MAX_ITEMS_PER_WRITE` of them.
    async fn replace_items(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Appends `uris`, at most `MAX_ITEMS_PER_WRITE` of them.
    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
