use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A song named by the user's library, a playlist, or the model. Not
/// yet checked against the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRef {
    pub track: String,
    pub artist: String,
}

impl SongRef {
    pub fn new(track: &str, artist: &str) -> Self {
        Self {
            track: track.to_string(),
            artist: artist.to_string(),
        }
    }

    /// Both fields are non-blank.
    pub fn is_complete(&self) -> bool {
        !self.track.trim().is_empty() && !self.artist.trim().is_empty()
    }

    pub fn key(&self) -> SongKey {
        SongKey::new(&self.track, &self.artist)
    }
}

impl fmt::Display for SongRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" by {}", self.track, self.artist)
    }
}

/// A song confirmed to exist in the catalog. `track` and `artist` use
/// the catalog's spelling, not whatever was searched for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSong {
    pub uri: String,
    pub track: String,
    pub artist: String,
}

impl VerifiedSong {
    pub fn new(uri: &str, track: &str, artist: &str) -> Self {
        Self {
            uri: uri.to_string(),
            track: track.to_string(),
            artist: artist.to_string(),
        }
    }

    pub fn key(&self) -> SongKey {
        SongKey::new(&self.track, &self.artist)
    }
}

/// Lowercased, trimmed `(track, artist)` pair used for every equality
/// check between songs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SongKey {
    pub track: String,
    pub artist: String,
}

impl SongKey {
    pub fn new(track: &str, artist: &str) -> Self {
        Self {
            track: track.trim().to_lowercase(),
            artist: artist.trim().to_lowercase(),
        }
    }
}

/// Builds the lookup set for a list of songs. Songs missing either
/// field don't contribute a key.
pub fn key_set<'a>(songs: impl IntoIterator<Item = &'a SongRef>) -> HashSet<SongKey> {
    songs
        .into_iter()
        .filter(|s| s.is_complete())
        .map(SongRef::key)
        .collect()
}
