use anyhow::Result;

use crate::catalog::{Catalog, MAX_ITEMS_PER_WRITE, Playlist};
use crate::core::Pacing;

const PLAYLISTS_PAGE_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// The playlist ends up holding exactly the given items
    Replace,
    /// The given items go after whatever is already there
    Append,
}

/// First playlist owned by `user_id` with exactly this name.
pub async fn find_playlist(
    catalog: &dyn Catalog,
    user_id: &str,
    name: &str,
    pacing: &Pacing,
) -> Result<Option<Playlist>> {
    let mut offset = 0;
    loop {
        let page = catalog.user_playlists(offset, PLAYLISTS_PAGE_SIZE).await?;
        if let Some(found) = page
            .items
            .iter()
            .find(|p| p.name == name && p.owner_id == user_id)
        {
            return Ok(Some(found.clone()));
        }
        if !page.has_next || page.items.is_empty() {
            return Ok(None);
        }
        offset += PLAYLISTS_PAGE_SIZE;
        tokio::time::sleep(pacing.page_delay).await;
    }
}

/// Looks the playlist up by name and owner, creating a public one if
/// it doesn't exist yet.
pub async fn find_or_create_playlist(
    catalog: &dyn Catalog,
    user_id: &str,
    name: &str,
    pacing: &Pacing,
) -> Result<Playlist> {
    if let Some(existing) = find_playlist(catalog, user_id, name, pacing).await? {
        println!("Found existing playlist '{}' with ID: {}", name, existing.id);
        return Ok(existing);
    }

    println!("Playlist '{}' not found. Creating it...", name);
    let created = catalog.create_playlist(user_id, name, true).await?;
    println!("Created playlist '{}' with ID: {}", name, created.id);
    Ok(created)
}

/// Writes `uris` to the playlist, splitting into batches the catalog
/// will accept. Order is preserved across batches.
pub async fn update_playlist_items(
    catalog: &dyn Catalog,
    playlist_id: &str,
    uris: &[String],
    mode: WriteMode,
    pacing: &Pacing,
) -> Result<()> {
    match mode {
        WriteMode::Replace if uris.len() <= MAX_ITEMS_PER_WRITE => {
            catalog.replace_items(playlist_id, uris).await?;
            tracing::debug!("Replaced playlist {} with {} items", playlist_id, uris.len());
        }
        WriteMode::Replace => {
            catalog.replace_items(playlist_id, &[]).await?;
            tracing::debug!("Cleared playlist {} before batched replace", playlist_id);
            append_batches(catalog, playlist_id, uris, pacing).await?;
        }
        WriteMode::Append => append_batches(catalog, playlist_id, uris, pacing).await?,
    }
    Ok(())
}

async fn append_batches(
    catalog: &dyn Catalog,
    playlist_id: &str,
    uris: &[String],
    pacing: &Pacing,
) -> Result<()> {
    for batch in uris.chunks(MAX_ITEMS_PER_WRITE) {
        catalog.add_items(playlist_id, batch).await?;
        tracing::debug!("Added {} items to playlist {}", batch.len(), playlist_id);
        tokio::time::sleep(pacing.write_delay).await;
    }
    Ok(())
}
