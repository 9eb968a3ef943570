pub mod config;
pub mod song;

pub use config::{AppConfig, ConfigError, LoopSettings, Pacing, ProviderKind, ProviderSettings};
pub use song::{SongKey, SongRef, VerifiedSong, key_set};
