//! Track analysis: estimate, map, admit
//!
//! Turns catalog tracks into `TrackData`. Each track is processed on its own;
//! one bad track is logged and skipped, never failing the batch.

use tracing::{debug, warn};

use crate::error::Result;
use crate::tempo::{estimate_tempo, map_tempo};
use crate::track::{RawTrack, TrackData};

/// Tracks whose best mapping is further than this from the cadence are dropped (percent)
pub const ADMISSION_ERROR_PCT: f64 = 10.0;

/// Fixed confidence attached to every estimate
pub const ESTIMATE_CONFIDENCE: f64 = 0.7;

/// Analyze a single track. `Ok(None)` means it failed the admission gate.
pub fn analyze_track(track: &RawTrack, target_cadence: f64) -> Result<Option<TrackData>> {
    let original_tempo = estimate_tempo(track, target_cadence)?;
    let tempo_match = map_tempo(original_tempo, target_cadence);

    if tempo_match.error_pct(target_cadence) > ADMISSION_ERROR_PCT {
        return Ok(None);
    }

    Ok(Some(TrackData {
        id: track.id.clone(),
        name: track.name.clone(),
        artist: track.artist_display(),
        preview_url: track.preview_url.clone(),
        original_tempo,
        mapped_bpm: tempo_match.mapped_bpm,
        mapping: tempo_match.mapping,
        confidence: ESTIMATE_CONFIDENCE,
        duration_ms: track.duration_ms,
        popularity: track.popularity,
    }))
}

/// Analyze a batch of tracks, keeping input order
pub fn analyze_tracks(tracks: &[RawTrack], target_cadence: f64) -> Vec<TrackData> {
    let mut analyzed = Vec::with_capacity(tracks.len());
    let mut rejected = 0usize;

    for track in tracks {
        match analyze_track(track, target_cadence) {
            Ok(Some(data)) => analyzed.push(data),
            Ok(None) => rejected += 1,
            Err(e) => warn!("Error processing track {}: {}", track.id, e),
        }
    }

    debug!(
        "Analyzed {} tracks: {} admitted, {} outside {}% of {} SPM",
        tracks.len(),
        analyzed.len(),
        rejected,
        ADMISSION_ERROR_PCT,
        target_cadence
    );

    analyzed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Artist, Mapping};

    fn make_track(id: &str, name: &str) -> RawTrack {
        RawTrack {
            id: id.into(),
            name: name.into(),
            artists: vec![
                Artist { id: "a1".into(), name: "First".into() },
                Artist { id: "a2".into(), name: "Second".into() },
            ],
            preview_url: Some("https://p.example/1".into()),
            duration_ms: 210_000,
            popularity: Some(64),
        }
    }

    #[test]
    fn test_analyze_track_fields() {
        // id "h" estimates 175 - 1.42 at cadence 175 (base candidate)
        let data = analyze_track(&make_track("h", "Song"), 175.0).unwrap().unwrap();
        assert_eq!(data.id, "h");
        assert_eq!(data.artist, "First, Second");
        assert_eq!(data.confidence, ESTIMATE_CONFIDENCE);
        assert_eq!(data.duration_ms, 210_000);
        assert_eq!(data.popularity, Some(64));
        assert_eq!(data.preview_url.as_deref(), Some("https://p.example/1"));
        assert_eq!(data.mapping, Mapping::Normal);
        assert_eq!(data.mapped_bpm, data.original_tempo);
        assert!((data.mapped_bpm - 175.0).abs() < 5.0);
    }

    #[test]
    fn test_double_candidate_maps_back_to_half() {
        // id "A" draws the double candidate (~353.03), which halves onto 175
        let data = analyze_track(&make_track("A", "Song"), 175.0).unwrap().unwrap();
        assert_eq!(data.mapping, Mapping::Half);
        assert!((data.mapped_bpm - data.original_tempo * 0.5).abs() < 1e-9);
        assert!((data.mapped_bpm - 176.5145).abs() < 1e-3);
    }

    #[test]
    fn test_admitted_tracks_are_within_gate() {
        let tracks: Vec<RawTrack> = (0..60)
            .map(|i| make_track(&format!("track-{}", i), "Song"))
            .collect();

        for data in analyze_tracks(&tracks, 170.0) {
            let error = (data.mapped_bpm - 170.0).abs();
            assert!(error / 170.0 * 100.0 <= ADMISSION_ERROR_PCT);
        }
    }

    #[test]
    fn test_bad_track_is_skipped_not_fatal() {
        let mut broken = make_track("broken", "Song");
        broken.artists.clear();

        let tracks = vec![make_track("A", "Song"), broken, make_track("B", "Song")];
        let analyzed = analyze_tracks(&tracks, 175.0);
        assert!(analyzed.iter().all(|t| t.id != "broken"));
        assert!(analyzed.iter().any(|t| t.id == "A"));
    }

    #[test]
    fn test_order_is_preserved() {
        let tracks: Vec<RawTrack> = ["A", "B", "C", "D"]
            .iter()
            .map(|id| make_track(id, "Song"))
            .collect();
        let analyzed = analyze_tracks(&tracks, 175.0);
        let positions: Vec<usize> = analyzed
            .iter()
            .map(|d| tracks.iter().position(|t| t.id == d.id).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_invalid_cadence_drops_everything() {
        let tracks = vec![make_track("A", "Song")];
        assert!(analyze_tracks(&tracks, 0.0).is_empty());
    }
}
