//! The recommendation loop: ask the model for songs, verify them
//! against the catalog, drop anything the user already knows, and
//! repeat until enough new songs are collected or attempts run out.

use std::collections::HashSet;

use anyhow::Result;
use rand::Rng;
use rand::seq::SliceRandom;

use super::collected::Collected;
use super::verify::verify;
use crate::ai::Transcript;
use crate::ai::prompt::{follow_up_prompt, seed_prompt};
use crate::ai::suggest::SuggestionProvider;
use crate::catalog::Catalog;
use crate::core::{LoopSettings, Pacing, SongKey, SongRef, VerifiedSong};

/// Random order, at most `cap` songs. Keeps the seed prompt bounded no
/// matter how large the library is.
pub fn sample_seed<R: Rng + ?Sized>(songs: &[SongRef], cap: usize, rng: &mut R) -> Vec<SongRef> {
    let mut sample = songs.to_vec();
    sample.shuffle(rng);
    sample.truncate(cap);
    sample
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub collected: Vec<VerifiedSong>,
    /// Attempts made. Every attempt makes exactly one provider call, so
    /// this is also the number of provider calls.
    pub attempts: usize,
    /// Everything the model suggested, as the model spelled it
    pub suggested: Vec<SongRef>,
    pub transcript: Transcript,
}

pub struct RecommendationSession<'a> {
    provider: &'a dyn SuggestionProvider,
    catalog: &'a dyn Catalog,
    settings: LoopSettings,
    pacing: Pacing,
    liked: HashSet<SongKey>,
    history: HashSet<SongKey>,
    transcript: Transcript,
}

impl<'a> RecommendationSession<'a> {
    pub async fn run(mut self) -> SessionOutcome {
        let target = self.settings.target_count;
        let max_attempts = self.settings.max_attempts;
        let mut collected = Collected::new();
        let mut suggested: Vec<SongRef> = Vec::new();
        let mut attempts = 0;

        for attempt in 0..max_attempts {
            if collected.len() >= target {
                println!("\nTarget number of new songs reached.");
                break;
            }
            let is_last = attempt + 1 == max_attempts;

            println!(
                "\n--- {} Request Attempt {}/{} ---",
                self.provider.name(),
                attempt + 1,
                max_attempts
            );

            if attempt > 0 {
                match follow_up_prompt(target, &suggested) {
                    Ok(prompt) => self.transcript.push_user(&prompt),
                    Err(e) => {
                        tracing::error!("Failed to render follow-up prompt: {:#}", e);
                        break;
                    }
                }
            }

            attempts += 1;
            let reply = self.provider.request(&self.transcript).await;
            if let Some(raw) = &reply.raw {
                self.transcript.push_assistant(raw);
            }

            if reply.songs.is_empty() {
                println!(
                    "{} returned no valid recommendations in this batch or there was an API error.",
                    self.provider.name()
                );
                if !is_last {
                    tokio::time::sleep(self.settings.retry_backoff).await;
                }
                continue;
            }

            suggested.extend(reply.songs.iter().cloned());
            println!(
                "{} suggested {} songs. Verifying and filtering...",
                self.provider.name(),
                reply.songs.len()
            );

            let verified = verify(self.catalog, &reply.songs, &self.pacing).await;
            let mut added = 0;
            for song in verified.iter() {
                if collected.len() >= target {
                    break;
                }
                match collected.try_accept(song, &self.liked, &self.history) {
                    Ok(()) => {
                        added += 1;
                        println!(
                            "  ++ Collected for new playlist: '{}' by '{}'",
                            song.track, song.artist
                        );
                    }
                    Err(reasons) => {
                        let reasons: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
                        println!(
                            "  -- Skipped '{}' by '{}' (Reason: {})",
                            song.track,
                            song.artist,
                            reasons.join(", ")
                        );
                    }
                }
            }

            println!("Added {} new songs this turn.", added);
            println!(
                "Total collected for new playlist so far: {}/{}",
                collected.len(),
                target
            );

            if collected.len() >= target {
                break;
            }
            if !is_last {
                tokio::time::sleep(self.settings.attempt_pause).await;
            }
        }

        SessionOutcome {
            collected: collected.into_songs(),
            attempts,
            suggested,
            transcript: self.transcript,
        }
    }
}

pub struct SessionBuilder<'a> {
    provider: &'a dyn SuggestionProvider,
    catalog: &'a dyn Catalog,
    settings: LoopSettings,
    pacing: Pacing,
    liked: HashSet<SongKey>,
    history: HashSet<SongKey>,
    seed: Vec<SongRef>,
}

impl<'a> SessionBuilder<'a> {
    pub fn new(provider: &'a dyn SuggestionProvider, catalog: &'a dyn Catalog) -> Self {
        Self {
            provider,
            catalog,
            settings: LoopSettings::default(),
            pacing: Pacing::default(),
            liked: HashSet::new(),
            history: HashSet::new(),
            seed: Vec::new(),
        }
    }

    pub fn settings(mut self, settings: &LoopSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    pub fn pacing(mut self, pacing: &Pacing) -> Self {
        self.pacing = pacing.clone();
        self
    }

    pub fn liked(mut self, liked: HashSet<SongKey>) -> Self {
        self.liked = liked;
        self
    }

    pub fn history(mut self, history: HashSet<SongKey>) -> Self {
        self.history = history;
        self
    }

    /// Songs shown to the model in the first message.
    pub fn seed(mut self, seed: Vec<SongRef>) -> Self {
        self.seed = seed;
        self
    }

    /// Renders the seed message so the transcript is ready for the
    /// first provider call.
    pub fn build(self) -> Result<RecommendationSession<'a>> {
        let mut transcript = Transcript::new();
        transcript.push_user(&seed_prompt(self.settings.target_count, &self.seed)?);

        Ok(RecommendationSession {
            provider: self.provider,
            catalog: self.catalog,
            settings: self.settings,
            pacing: self.pacing,
            liked: self.liked,
            history: self.history,
            transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::ai::suggest::Suggestions;
    use crate::catalog::{Page, Playlist, User};
    use crate::core::key_set;
    use crate::openai::Role;

    struct Scripted {
        replies: Mutex<VecDeque<Suggestions>>,
        calls: Mutex<Vec<Transcript>>,
    }

    impl Scripted {
        fn new(replies: Vec<Suggestions>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SuggestionProvider for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn request(&self, transcript: &Transcript) -> Suggestions {
            self.calls.lock().unwrap().push(transcript.clone());
            self.replies.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    /// Search-only catalog: every known key resolves to a uri derived
    /// from the title.
    struct SearchOnly {
        known: HashMap<SongKey, VerifiedSong>,
        searches: Mutex<usize>,
    }

    impl SearchOnly {
        fn new(songs: &[VerifiedSong]) -> Self {
            Self {
                known: songs.iter().map(|s| (s.key(), s.clone())).collect(),
                searches: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Catalog for SearchOnly {
        async fn current_user(&self) -> Result<User> {
            Err(anyhow!("unused"))
        }
        async fn saved_tracks(&self, _: usize, _: usize) -> Result<Page<SongRef>> {
            Err(anyhow!("unused"))
        }
        async fn playlist_tracks(&self, _: &str, _: usize, _: usize) -> Result<Page<SongRef>> {
            Err(anyhow!("unused"))
        }
        async fn user_playlists(&self, _: usize, _: usize) -> Result<Page<Playlist>> {
            Err(anyhow!("unused"))
        }
        async fn create_playlist(&self, _: &str, _: &str, _: bool) -> Result<Playlist> {
            Err(anyhow!("unused"))
        }
        async fn search_track(&self, track: &str, artist: &str) -> Result<Option<VerifiedSong>> {
            *self.searches.lock().unwrap() += 1;
            Ok(self.known.get(&SongKey::new(track, artist)).cloned())
        }
        async fn replace_items(&self, _: &str, _: &[String]) -> Result<()> {
            Err(anyhow!("unused"))
        }
        async fn add_items(&self, _: &str, _: &[String]) -> Result<()> {
            Err(anyhow!("unused"))
        }
    }

    fn song(i: usize) -> VerifiedSong {
        VerifiedSong::new(&format!("spotify:track:{}", i), &format!("Song {}", i), "Artist")
    }

    fn suggestions(range: std::ops::Range<usize>) -> Suggestions {
        Suggestions {
            songs: range.map(|i| SongRef::new(&format!("Song {}", i), "Artist")).collect(),
            raw: Some("{\"recommendations\": []}".to_string()),
        }
    }

    fn fast_settings(target: usize, max_attempts: usize) -> LoopSettings {
        LoopSettings {
            target_count: target,
            max_attempts,
            seed_sample_cap: 200,
            retry_backoff: Duration::ZERO,
            attempt_pause: Duration::ZERO,
        }
    }

    #[test]
    fn test_sample_seed_caps_and_keeps_members() {
        let songs: Vec<SongRef> = (0..10).map(|i| SongRef::new(&i.to_string(), "A")).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let sample = sample_seed(&songs, 4, &mut rng);
        assert_eq!(sample.len(), 4);
        assert!(sample.iter().all(|s| songs.contains(s)));

        let all = sample_seed(&songs, 200, &mut rng);
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn test_build_seeds_transcript_with_user_message() {
        let provider = Scripted::new(vec![]);
        let catalog = SearchOnly::new(&[]);
        let session = SessionBuilder::new(&provider, &catalog)
            .seed(vec![SongRef::new("Tadow", "Masego")])
            .build()
            .unwrap();

        assert_eq!(session.transcript.len(), 1);
        assert!(session.transcript.awaits_reply());
        let content = session.transcript.messages()[0].content.clone().unwrap();
        assert!(content.contains("\"Tadow\" by Masego"));
    }

    #[tokio::test]
    async fn test_run_stops_once_target_is_reached() {
        let provider = Scripted::new(vec![suggestions(0..5), suggestions(5..10)]);
        let catalog = SearchOnly::new(&(0..10).map(song).collect::<Vec<_>>());
        let outcome = SessionBuilder::new(&provider, &catalog)
            .settings(&fast_settings(3, 5))
            .pacing(&Pacing::none())
            .build()
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.collected, vec![song(0), song(1), song(2)]);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_skips_liked_and_history() {
        let provider = Scripted::new(vec![suggestions(0..4)]);
        let catalog = SearchOnly::new(&(0..4).map(song).collect::<Vec<_>>());
        let liked = key_set(&[SongRef::new("song 0", "ARTIST")]);
        let history = key_set(&[SongRef::new("Song 1", "Artist")]);

        let outcome = SessionBuilder::new(&provider, &catalog)
            .settings(&fast_settings(10, 1))
            .pacing(&Pacing::none())
            .liked(liked)
            .history(history)
            .build()
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.collected, vec![song(2), song(3)]);
    }

    #[tokio::test]
    async fn test_run_follow_up_lists_previous_suggestions() {
        let provider = Scripted::new(vec![suggestions(0..2), suggestions(2..3)]);
        let catalog = SearchOnly::new(&[]);

        let outcome = SessionBuilder::new(&provider, &catalog)
            .settings(&fast_settings(5, 2))
            .pacing(&Pacing::none())
            .build()
            .unwrap()
            .run()
            .await;

        assert!(outcome.collected.is_empty());
        assert_eq!(outcome.suggested.len(), 3);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let follow_up = calls[1].last().unwrap().content.clone().unwrap();
        assert!(follow_up.contains("\"Song 0\" by Artist"));
        assert!(follow_up.contains("\"Song 1\" by Artist"));
        assert!(!follow_up.contains("Song 2"));
    }

    #[tokio::test]
    async fn test_run_failed_call_still_counts_an_attempt() {
        let provider = Scripted::new(vec![Suggestions::default(), suggestions(0..1)]);
        let catalog = SearchOnly::new(&[song(0)]);

        let outcome = SessionBuilder::new(&provider, &catalog)
            .settings(&fast_settings(1, 3))
            .pacing(&Pacing::none())
            .build()
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.collected, vec![song(0)]);

        // No assistant turn for the failed call, so two user turns in a row
        let roles: Vec<Role> = outcome.transcript.iter().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_run_never_exceeds_max_attempts() {
        let provider = Scripted::new(vec![]);
        let catalog = SearchOnly::new(&[]);

        let outcome = SessionBuilder::new(&provider, &catalog)
            .settings(&fast_settings(20, 4))
            .pacing(&Pacing::none())
            .build()
            .unwrap()
            .run()
            .await;

        assert_eq!(outcome.attempts, 4);
        assert_eq!(provider.calls.lock().unwrap().len(), 4);
        assert_eq!(*catalog.searches.lock().unwrap(), 0);
    }
}
