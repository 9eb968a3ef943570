//! In-memory stand-ins for the catalog and the suggestion provider
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use mixtape::ai::Transcript;
use mixtape::ai::suggest::{SuggestionProvider, Suggestions};
use mixtape::catalog::{Catalog, Page, Playlist, User};
use mixtape::core::{AppConfig, LoopSettings, Pacing, SongKey, SongRef, VerifiedSong};

#[derive(Clone, Debug, PartialEq)]
pub enum WriteCall {
    Replace { playlist_id: String, uris: Vec<String> },
    Add { playlist_id: String, uris: Vec<String> },
}

struct FakePlaylist {
    playlist: Playlist,
    items: Vec<VerifiedSong>,
}

/// Catalog backed by vectors and maps. Searches resolve through the
/// tracks registered with `with_track`, keyed by normalized title and
/// artist.
pub struct FakeCatalog {
    user_id: String,
    liked: Vec<SongRef>,
    tracks: HashMap<SongKey, VerifiedSong>,
    failing_searches: HashSet<SongKey>,
    fail_writes: bool,
    links: bool,
    playlists: Mutex<Vec<FakePlaylist>>,
    pub searches: Mutex<Vec<(String, String)>>,
    pub writes: Mutex<Vec<WriteCall>>,
}

impl FakeCatalog {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            liked: Vec::new(),
            tracks: HashMap::new(),
            failing_searches: HashSet::new(),
            fail_writes: false,
            links: true,
            playlists: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_liked(mut self, songs: &[SongRef]) -> Self {
        self.liked.extend(songs.iter().cloned());
        self
    }

    pub fn with_track(mut self, song: VerifiedSong) -> Self {
        self.tracks.insert(song.key(), song);
        self
    }

    pub fn with_tracks(self, songs: &[VerifiedSong]) -> Self {
        songs.iter().cloned().fold(self, |c, s| c.with_track(s))
    }

    /// Searching for this title and artist returns an error.
    pub fn with_failing_search(mut self, track: &str, artist: &str) -> Self {
        self.failing_searches.insert(SongKey::new(track, artist));
        self
    }

    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Playlists added or created afterwards have no public url.
    pub fn without_links(mut self) -> Self {
        self.links = false;
        self
    }

    fn link(&self, id: &str) -> Option<String> {
        self.links
            .then(|| format!("https://open.example.com/playlist/{}", id))
    }

    pub fn with_playlist(self, id: &str, name: &str, owner_id: &str, items: &[VerifiedSong]) -> Self {
        self.playlists.lock().unwrap().push(FakePlaylist {
            playlist: Playlist {
                id: id.to_string(),
                name: name.to_string(),
                owner_id: owner_id.to_string(),
                url: self.link(id),
            },
            items: items.to_vec(),
        });
        self
    }

    pub fn playlist_named(&self, name: &str) -> Option<Playlist> {
        self.playlists
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.playlist.name == name && p.playlist.owner_id == self.user_id)
            .map(|p| p.playlist.clone())
    }

    pub fn playlist_uris(&self, playlist_id: &str) -> Vec<String> {
        self.playlists
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.playlist.id == playlist_id)
            .map(|p| p.items.iter().map(|s| s.uri.clone()).collect())
            .unwrap_or_default()
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn write_calls(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    fn resolve(&self, uri: &str) -> VerifiedSong {
        self.tracks
            .values()
            .find(|s| s.uri == uri)
            .cloned()
            .unwrap_or_else(|| VerifiedSong::new(uri, uri, "Unknown"))
    }

    fn with_playlist_mut<T>(&self, id: &str, f: impl FnOnce(&mut FakePlaylist) -> T) -> Result<T> {
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists
            .iter_mut()
            .find(|p| p.playlist.id == id)
            .ok_or_else(|| anyhow!("404 Not Found: playlist {}", id))?;
        Ok(f(playlist))
    }
}

fn page_of<T: Clone>(items: &[T], offset: usize, limit: usize) -> Page<T> {
    let end = (offset + limit).min(items.len());
    let slice = items.get(offset..end).unwrap_or(&[]);
    Page {
        items: slice.to_vec(),
        has_next: end < items.len(),
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn current_user(&self) -> Result<User> {
        Ok(User {
            id: self.user_id.clone(),
            display_name: Some("Test Listener".to_string()),
        })
    }

    async fn saved_tracks(&self, offset: usize, limit: usize) -> Result<Page<SongRef>> {
        Ok(page_of(&self.liked, offset, limit))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<SongRef>> {
        let songs = self.with_playlist_mut(playlist_id, |p| {
            p.items
                .iter()
                .map(|s| SongRef::new(&s.track, &s.artist))
                .collect::<Vec<_>>()
        })?;
        Ok(page_of(&songs, offset, limit))
    }

    async fn user_playlists(&self, offset: usize, limit: usize) -> Result<Page<Playlist>> {
        let all: Vec<Playlist> = self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.playlist.clone())
            .collect();
        Ok(page_of(&all, offset, limit))
    }

    async fn create_playlist(&self, user_id: &str, name: &str, _public: bool) -> Result<Playlist> {
        let mut playlists = self.playlists.lock().unwrap();
        let id = format!("created-{}", playlists.len() + 1);
        let playlist = Playlist {
            id: id.clone(),
            name: name.to_string(),
            owner_id: user_id.to_string(),
            url: self.link(&id),
        };
        playlists.push(FakePlaylist {
            playlist: playlist.clone(),
            items: Vec::new(),
        });
        Ok(playlist)
    }

    async fn search_track(&self, track: &str, artist: &str) -> Result<Option<VerifiedSong>> {
        self.searches
            .lock()
            .unwrap()
            .push((track.to_string(), artist.to_string()));
        let key = SongKey::new(track, artist);
        if self.failing_searches.contains(&key) {
            return Err(anyhow!("429 Too Many Requests"));
        }
        Ok(self.tracks.get(&key).cloned())
    }

    async fn replace_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("403 Forbidden"));
        }
        assert!(uris.len() <= 100, "write of {} items", uris.len());
        self.writes.lock().unwrap().push(WriteCall::Replace {
            playlist_id: playlist_id.to_string(),
            uris: uris.to_vec(),
        });
        let songs: Vec<VerifiedSong> = uris.iter().map(|u| self.resolve(u)).collect();
        self.with_playlist_mut(playlist_id, |p| p.items = songs)
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("403 Forbidden"));
        }
        assert!(uris.len() <= 100, "write of {} items", uris.len());
        self.writes.lock().unwrap().push(WriteCall::Add {
            playlist_id: playlist_id.to_string(),
            uris: uris.to_vec(),
        });
        let songs: Vec<VerifiedSong> = uris.iter().map(|u| self.resolve(u)).collect();
        self.with_playlist_mut(playlist_id, |p| p.items.extend(songs))
    }
}

/// Replays canned replies in order, then returns empty suggestions.
/// Every transcript it was called with is kept for inspection.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Suggestions>>,
    pub transcripts: Mutex<Vec<Transcript>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Suggestions>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }

    pub fn transcript(&self, call: usize) -> Transcript {
        self.transcripts.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl SuggestionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn request(&self, transcript: &Transcript) -> Suggestions {
        assert!(transcript.awaits_reply(), "provider called out of turn");
        self.transcripts.lock().unwrap().push(transcript.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or_default()
    }
}

/// A reply whose raw text is the JSON the model would have sent.
pub fn reply(songs: &[SongRef]) -> Suggestions {
    let entries: Vec<serde_json::Value> = songs
        .iter()
        .map(|s| serde_json::json!({"track": s.track, "artist": s.artist}))
        .collect();
    Suggestions {
        songs: songs.to_vec(),
        raw: Some(serde_json::json!({ "recommendations": entries }).to_string()),
    }
}

/// The provider call failed outright: no songs, no text.
pub fn failed_call() -> Suggestions {
    Suggestions::default()
}

pub fn song_ref(i: usize) -> SongRef {
    SongRef::new(&format!("Song {}", i), &format!("Artist {}", i))
}

pub fn verified(i: usize) -> VerifiedSong {
    VerifiedSong::new(
        &format!("spotify:track:{:04}", i),
        &format!("Song {}", i),
        &format!("Artist {}", i),
    )
}

pub fn song_refs(range: std::ops::Range<usize>) -> Vec<SongRef> {
    range.map(song_ref).collect()
}

pub fn verified_songs(range: std::ops::Range<usize>) -> Vec<VerifiedSong> {
    range.map(verified).collect()
}

pub fn fast_settings(target_count: usize, max_attempts: usize) -> LoopSettings {
    LoopSettings {
        target_count,
        max_attempts,
        seed_sample_cap: 200,
        retry_backoff: Duration::ZERO,
        attempt_pause: Duration::ZERO,
    }
}

/// Config with dummy credentials and no pacing delays.
pub fn test_config(target_count: usize, max_attempts: usize) -> AppConfig {
    let mut config = AppConfig::from_lookup(|key| match key {
        "SPOTIFY_CLIENT_ID" => Some("client-id".to_string()),
        "SPOTIFY_CLIENT_SECRET" => Some("client-secret".to_string()),
        "SPOTIFY_REDIRECT_URI" => Some("http://127.0.0.1:8888/callback".to_string()),
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        _ => None,
    })
    .expect("test config is complete");
    config.loop_settings = fast_settings(target_count, max_attempts);
    config.pacing = Pacing::none();
    config
}
