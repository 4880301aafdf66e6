//! Recommendation pipeline
//!
//! pace -> cadence -> candidate pool -> genre filter -> analysis -> playlist

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cadence_core::genre::{resolve_genres, SELECTABLE_GENRES};
use cadence_core::{
    analyze_tracks, assemble_playlist, filter_tracks_by_genres, section_targets,
    suggested_cadence, Cadence, PaceInput, Playlist, SectionTargets,
};

use crate::sourcing::{fetch_artist_genres, source_tracks};
use crate::spotify::Catalog;

/// Playlist request
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    pub pace: PaceInput,
    /// Explicit cadence; the pace suggestion is used when absent
    #[serde(default)]
    pub cadence: Option<u32>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

/// Playlist plus the parameters it was built for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub playlist: Playlist,
    pub metadata: RecommendMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendMetadata {
    pub pace: PaceInput,
    pub cadence: Cadence,
    pub section_targets: SectionTargets,
    pub genres: Vec<String>,
    /// Tracks in the sourced pool
    pub pool_size: usize,
    /// Tracks that passed the genre filter and admission gate
    pub analyzed_count: usize,
}

/// Explicit cadence if given, else the suggestion for the pace
pub fn resolve_cadence(pace: &PaceInput, cadence: Option<u32>) -> anyhow::Result<Cadence> {
    match cadence {
        Some(spm) => Ok(Cadence::new(spm)?),
        None => Ok(suggested_cadence(pace)),
    }
}

/// Build a playlist for a request
pub async fn recommend<C, R>(
    catalog: &C,
    request: RecommendRequest,
    rng: &mut R,
) -> anyhow::Result<RecommendResponse>
where
    C: Catalog + ?Sized,
    R: Rng + Send,
{
    let pace = request.pace;
    if !pace.is_valid() {
        anyhow::bail!("Invalid pace: {}:{:02}", pace.minutes, pace.seconds);
    }

    let cadence = resolve_cadence(&pace, request.cadence)?;
    if !cadence.is_typical() {
        warn!("Cadence {} is outside the usual running range", cadence);
    }

    let targets = section_targets(cadence.spm());
    let genres = resolve_genres(request.genres.as_deref());
    for genre in &genres {
        if !SELECTABLE_GENRES.contains(&genre.to_lowercase().as_str()) {
            debug!("Genre '{}' has no synonym list, matching by name only", genre);
        }
    }

    info!("Building playlist for {} at {} (genres: {})", pace, cadence, genres.join(", "));

    let pool = source_tracks(catalog, rng).await;
    let artist_genres = fetch_artist_genres(catalog, &pool).await;
    let filtered = filter_tracks_by_genres(&pool, &artist_genres, &genres);
    let analyzed = analyze_tracks(&filtered, cadence.as_bpm());
    let playlist = assemble_playlist(&analyzed, &targets);

    if playlist.is_empty() {
        warn!("No tracks matched {} from a pool of {}", cadence, pool.len());
    } else {
        info!(
            "Playlist ready: {} tracks ({} candidates analyzed)",
            playlist.total_tracks,
            analyzed.len()
        );
    }

    Ok(RecommendResponse {
        playlist,
        metadata: RecommendMetadata {
            pace,
            cadence,
            section_targets: targets,
            genres,
            pool_size: pool.len(),
            analyzed_count: analyzed.len(),
        },
    })
}
