use super::playlist::{WriteMode, find_or_create_playlist, update_playlist_items};
use crate::catalog::{Catalog, Playlist};
use crate::core::{Pacing, VerifiedSong};

/// Where the session's songs ended up. The urls are whatever the
/// catalog reported for each playlist and may be missing even after a
/// successful write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PublishReport {
    pub new_playlist_written: bool,
    pub history_playlist_written: bool,
    pub new_playlist_url: Option<String>,
    pub history_playlist_url: Option<String>,
}

/// Replaces the "new recommendations" playlist with `songs` and appends
/// them to the history playlist. Does nothing and returns `None` when
/// there is nothing to publish. Failures on one playlist are logged and
/// don't stop the other.
pub async fn publish(
    catalog: &dyn Catalog,
    user_id: &str,
    songs: &[VerifiedSong],
    new_playlist_name: &str,
    history_playlist: Option<&Playlist>,
    pacing: &Pacing,
) -> Option<PublishReport> {
    if songs.is_empty() {
        println!("\nNo new, verifiable songs were collected after all attempts.");
        return None;
    }
    let uris: Vec<String> = songs.iter().map(|s| s.uri.clone()).collect();
    let mut report = PublishReport::default();

    match find_or_create_playlist(catalog, user_id, new_playlist_name, pacing).await {
        Ok(playlist) => {
            println!("\nUpdating playlist '{}' by replacing items...", playlist.name);
            match update_playlist_items(catalog, &playlist.id, &uris, WriteMode::Replace, pacing)
                .await
            {
                Ok(()) => {
                    println!("Successfully updated '{}'.", playlist.name);
                    report.new_playlist_written = true;
                    report.new_playlist_url = playlist.url.clone();
                }
                Err(e) => tracing::error!("Error updating playlist '{}': {:#}", playlist.name, e),
            }
        }
        Err(e) => tracing::error!(
            "Could not create or find playlist '{}': {:#}",
            new_playlist_name,
            e
        ),
    }

    match history_playlist {
        Some(playlist) => {
            println!("\nAppending {} songs to '{}'...", uris.len(), playlist.name);
            match update_playlist_items(catalog, &playlist.id, &uris, WriteMode::Append, pacing)
                .await
            {
                Ok(()) => {
                    println!("Successfully appended songs to '{}'.", playlist.name);
                    report.history_playlist_written = true;
                    report.history_playlist_url = playlist.url.clone();
                }
                Err(e) => tracing::error!("Error appending to playlist '{}': {:#}", playlist.name, e),
            }
        }
        None => println!("No history playlist available to append songs to."),
    }

    Some(report)
}
