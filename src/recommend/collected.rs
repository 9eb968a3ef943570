use std::collections::HashSet;
use std::fmt;

use crate::core::{SongKey, VerifiedSong};

/// Why a verified song was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Liked,
    InHistory,
    AlreadyCollected,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::Liked => write!(f, "is liked"),
            SkipReason::InHistory => write!(f, "in all recommendations history"),
            SkipReason::AlreadyCollected => write!(f, "already collected this session"),
        }
    }
}

/// Songs accepted this session, in acceptance order. A song's key and
/// uri are each unique within the collection.
#[derive(Clone, Debug, Default)]
pub struct Collected {
    songs: Vec<VerifiedSong>,
    keys: HashSet<SongKey>,
    uris: HashSet<String>,
}

impl Collected {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn songs(&self) -> &[VerifiedSong] {
        &self.songs
    }

    pub fn into_songs(self) -> Vec<VerifiedSong> {
        self.songs
    }

    /// Accepts `song` unless its canonical key is liked, already in the
    /// history playlist, or already collected (by key or by uri). All
    /// applicable reasons are returned on rejection.
    pub fn try_accept(
        &mut self,
        song: &VerifiedSong,
        liked: &HashSet<SongKey>,
        history: &HashSet<SongKey>,
    ) -> Result<(), Vec<SkipReason>> {
        let key = song.key();
        let mut reasons = Vec::new();
        if liked.contains(&key) {
            reasons.push(SkipReason::Liked);
        }
        if history.contains(&key) {
            reasons.push(SkipReason::InHistory);
        }
        if self.keys.contains(&key) || self.uris.contains(&song.uri) {
            reasons.push(SkipReason::AlreadyCollected);
        }
        if !reasons.is_empty() {
            return Err(reasons);
        }

        self.keys.insert(key);
        self.uris.insert(song.uri.clone());
        self.songs.push(song.clone());
        Ok(())
    }
}
