pub mod client;
pub mod oauth;

pub use client::SpotifyClient;
pub use oauth::{CachedToken, SpotifyOAuth};
