use std::future::Future;

use anyhow::Result;

use super::{Catalog, Page};
use crate::core::{Pacing, SongRef};

const SAVED_TRACKS_PAGE_SIZE: usize = 50;
const PLAYLIST_TRACKS_PAGE_SIZE: usize = 100;

/// Every song in the user's saved library. A failed page ends the walk
/// early and keeps whatever was fetched before it.
pub async fn fetch_liked_songs(catalog: &dyn Catalog, pacing: &Pacing) -> Vec<SongRef> {
    println!("Fetching all liked songs...");
    let songs = collect_pages("liked songs", SAVED_TRACKS_PAGE_SIZE, pacing, |offset| {
        catalog.saved_tracks(offset, SAVED_TRACKS_PAGE_SIZE)
    })
    .await;
    println!("Total liked songs fetched: {}", songs.len());
    songs
}

/// Every song in a playlist, same failure handling as `fetch_liked_songs`.
pub async fn fetch_playlist_songs(
    catalog: &dyn Catalog,
    playlist_id: &str,
    pacing: &Pacing,
) -> Vec<SongRef> {
    println!("Fetching tracks from playlist ID: {}...", playlist_id);
    let label = format!("tracks from playlist {}", playlist_id);
    let songs = collect_pages(&label, PLAYLIST_TRACKS_PAGE_SIZE, pacing, |offset| {
        catalog.playlist_tracks(playlist_id, offset, PLAYLIST_TRACKS_PAGE_SIZE)
    })
    .await;
    println!(
        "Total tracks fetched from playlist ID {}: {}",
        playlist_id,
        songs.len()
    );
    songs
}

async fn collect_pages<F, Fut>(
    label: &str,
    page_size: usize,
    pacing: &Pacing,
    mut fetch: F,
) -> Vec<SongRef>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Page<SongRef>>>,
{
    let mut songs = Vec::new();
    let mut offset = 0;
    loop {
        let page = match fetch(offset).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Error fetching {} at offset {}: {:#}", label, offset, e);
                break;
            }
        };
        // Items are already filtered, so an empty page can still have
        // more after it. Only the continuation flag ends the walk.
        songs.extend(page.items);
        offset += page_size;
        println!("Fetched {} {} so far...", songs.len(), label);
        if !page.has_next {
            break;
        }
        tokio::time::sleep(pacing.page_delay).await;
    }
    songs
}
