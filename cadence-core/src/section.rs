//! Section targets, suitability and candidate ranking
//!
//! Each playlist section has its own BPM target derived from the base cadence
//! and its own tolerance window around that target. Candidates inside the
//! window are ranked by a blend of tempo fit and catalog popularity.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::track::{SectionType, TrackData};

/// Warm-up runs this many SPM below the base cadence
const WARMUP_OFFSET: u32 = 5;
/// Cool-down runs at this fraction of the base cadence
const COOLDOWN_RATIO: f64 = 0.9;

/// Weight of tempo fit in the candidate score
const BPM_WEIGHT: f64 = 0.7;
/// Weight of popularity in the candidate score
const POPULARITY_WEIGHT: f64 = 0.3;
/// Error (as a fraction of target) at which the tempo score reaches zero
const SCORE_ERROR_RATIO: f64 = 0.08;

/// BPM targets for each workout phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTargets {
    pub warmup: u32,
    pub main: u32,
    pub cooldown: u32,
}

impl SectionTargets {
    pub fn for_section(&self, section: SectionType) -> u32 {
        match section {
            SectionType::Warmup => self.warmup,
            SectionType::Main => self.main,
            SectionType::Cooldown => self.cooldown,
        }
    }
}

/// Derive per-section targets from the base cadence.
///
/// Targets stay positive: a base cadence of 5 or less puts warm-up at 1.
pub fn section_targets(base_cadence: u32) -> SectionTargets {
    SectionTargets {
        warmup: base_cadence.saturating_sub(WARMUP_OFFSET).max(1),
        main: base_cadence,
        cooldown: ((base_cadence as f64 * COOLDOWN_RATIO).round() as u32).max(1),
    }
}

/// Whether a mapped tempo falls inside the section's tolerance window
pub fn is_track_suitable_for_section(mapped_bpm: f64, target_bpm: f64, section: SectionType) -> bool {
    let tolerance = target_bpm * section.tolerance_ratio();
    (mapped_bpm - target_bpm).abs() <= tolerance
}

/// Blended tempo-fit / popularity score in [0, 1]
pub fn bpm_match_score(track: &TrackData, target_bpm: f64) -> f64 {
    let bpm_error = (track.mapped_bpm - target_bpm).abs();
    let max_acceptable_error = (target_bpm * SCORE_ERROR_RATIO).max(1.0);
    let bpm_score = (1.0 - bpm_error / max_acceptable_error).max(0.0);
    let popularity_score = f64::from(track.popularity.unwrap_or(0)) / 100.0;
    BPM_WEIGHT * bpm_score + POPULARITY_WEIGHT * popularity_score
}

/// Sort tracks by descending score. Equal scores keep their input order.
pub fn sort_tracks_by_bpm_match<'a>(tracks: Vec<&'a TrackData>, target_bpm: f64) -> Vec<&'a TrackData> {
    let mut scored: Vec<(f64, &TrackData)> = tracks
        .into_iter()
        .map(|t| (bpm_match_score(t, target_bpm), t))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, t)| t).collect()
}

/// Suitable tracks for a section, best first
pub fn candidates_for_section(
    tracks: &[TrackData],
    target_bpm: u32,
    section: SectionType,
) -> Vec<&TrackData> {
    let target = f64::from(target_bpm);
    let suitable = tracks
        .iter()
        .filter(|t| is_track_suitable_for_section(t.mapped_bpm, target, section))
        .collect();
    sort_tracks_by_bpm_match(suitable, target)
}
