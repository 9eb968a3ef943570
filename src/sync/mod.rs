//! Writing results back to the user's playlists.

pub mod playlist;
pub mod publish;

pub use playlist::{WriteMode, find_or_create_playlist, find_playlist, update_playlist_items};
pub use publish::{PublishReport, publish};
