use crate::catalog::Catalog;
use crate::core::{Pacing, SongRef, VerifiedSong};

/// Looks up each candidate in the catalog and keeps the top match, in
/// candidate order. Candidates with a blank field are skipped without
/// searching, and a failed search only drops that one candidate.
pub async fn verify(
    catalog: &dyn Catalog,
    candidates: &[SongRef],
    pacing: &Pacing,
) -> Vec<VerifiedSong> {
    println!("\nVerifying recommended songs against the catalog...");
    let mut found = Vec::new();

    for candidate in candidates {
        if !candidate.is_complete() {
            tracing::warn!("Skipping incomplete suggestion: {:?}", candidate);
            continue;
        }

        let track = candidate.track.trim();
        let artist = candidate.artist.trim();
        match catalog.search_track(track, artist).await {
            Ok(Some(song)) => {
                println!("  Found in catalog: '{}' by {}", song.track, song.artist);
                found.push(song);
            }
            Ok(None) => println!("  Not found in catalog: '{}' by {}", track, artist),
            Err(e) => tracing::warn!("Error searching for '{}' by {}: {:#}", track, artist, e),
        }
        tokio::time::sleep(pacing.search_delay).await;
    }

    println!("Verified {} songs as available in the catalog.", found.len());
    found
}
