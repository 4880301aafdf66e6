//! Tempo estimation and cadence mapping
//!
//! There is no audio analysis here. A track's tempo is estimated from its
//! textual metadata: three candidates around the target cadence (base, half,
//! double) get a small jitter, and one is drawn using weights chosen by a
//! genre keyword scan. The draw is driven by a linear congruential step
//! seeded from the track ID, so the same track always estimates the same.

use crate::error::{Error, Result};
use crate::track::{Mapping, RawTrack};

/// LCG multiplier
const LCG_A: u64 = 9301;
/// LCG increment
const LCG_C: u64 = 49297;
/// LCG modulus
const LCG_M: u64 = 233280;

/// Candidates never drop below this
pub const MIN_ESTIMATED_TEMPO: f64 = 60.0;

/// Jitter span in BPM, centered on zero
const JITTER_SPAN: f64 = 10.0;

/// A multiplier only beats the unmapped tempo within this error (percent)
pub const MAPPING_TOLERANCE_PCT: f64 = 3.0;

/// Deterministic value in [0, 1) derived from a track ID.
///
/// The seed is the sum of the ID's UTF-16 code units.
pub fn track_random(id: &str) -> f64 {
    let seed: u64 = id.encode_utf16().map(u64::from).sum();
    let value = (seed.wrapping_mul(LCG_A).wrapping_add(LCG_C)) % LCG_M;
    value as f64 / LCG_M as f64
}

/// Genre family guessed from track/artist text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreProfile {
    Electronic,
    Rock,
    HipHop,
    Pop,
    Country,
    Default,
}

/// Keyword table, scanned in order. First family with a hit wins.
const GENRE_KEYWORDS: &[(GenreProfile, &[&str])] = &[
    (GenreProfile::Electronic, &["electronic", "dance", "edm", "house", "techno"]),
    (GenreProfile::Rock, &["rock", "metal", "punk"]),
    (GenreProfile::HipHop, &["hip hop", "rap", "r&b"]),
    (GenreProfile::Pop, &["pop", "top"]),
    (GenreProfile::Country, &["country", "folk"]),
];

impl GenreProfile {
    /// Classify lowercased text by keyword containment
    pub fn classify(text: &str) -> Self {
        GENRE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(profile, _)| *profile)
            .unwrap_or(GenreProfile::Default)
    }

    /// Weights over [base, half, double] candidates
    pub fn weights(self) -> [f64; 3] {
        match self {
            GenreProfile::Electronic => [0.4, 0.2, 0.4],
            GenreProfile::Rock => [0.5, 0.25, 0.25],
            GenreProfile::HipHop => [0.3, 0.4, 0.3],
            GenreProfile::Pop => [0.35, 0.3, 0.35],
            GenreProfile::Country => [0.6, 0.2, 0.2],
            GenreProfile::Default => [0.4, 0.3, 0.3],
        }
    }
}

/// Estimate the original tempo of a catalog track
pub fn estimate_tempo(track: &RawTrack, target_cadence: f64) -> Result<f64> {
    if !target_cadence.is_finite() || target_cadence <= 0.0 {
        return Err(Error::InvalidCadence(format!(
            "target cadence must be positive, got {}",
            target_cadence
        )));
    }
    if track.artists.is_empty() {
        return Err(Error::InvalidTrack(format!("track {} has no artists", track.id)));
    }

    let artist_names = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let combined = format!("{} {}", track.name, artist_names).to_lowercase();

    let random = track_random(&track.id);
    let jitter = (random - 0.5) * JITTER_SPAN;

    let candidates = [target_cadence, target_cadence * 0.5, target_cadence * 2.0]
        .map(|tempo| (tempo + jitter).max(MIN_ESTIMATED_TEMPO));

    let profile = GenreProfile::classify(&combined);
    Ok(select_weighted(&candidates, &profile.weights(), random))
}

/// Cumulative-probability draw: first item whose running weight reaches `random`
fn select_weighted(items: &[f64; 3], weights: &[f64; 3], random: f64) -> f64 {
    let mut cumulative = 0.0;
    for (item, weight) in items.iter().zip(weights) {
        cumulative += weight;
        if random <= cumulative {
            return *item;
        }
    }
    // float rounding can leave the last cumulative weight just under 1.0
    items[items.len() - 1]
}

/// Best multiplier mapping of a tempo onto a target cadence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoMatch {
    pub mapped_bpm: f64,
    pub mapping: Mapping,
    /// Absolute distance from the target, in BPM
    pub error: f64,
}

impl TempoMatch {
    /// Error relative to `target`, in percent
    pub fn error_pct(&self, target: f64) -> f64 {
        self.error / target * 100.0
    }
}

/// Pick the half/normal/double mapping that lands closest to the target.
///
/// The unmapped tempo is the fallback. A multiplier replaces the current best
/// only when it is within 3% of the target and strictly closer; ties keep the
/// earlier entry in half, normal, double order.
pub fn map_tempo(original_tempo: f64, target_cadence: f64) -> TempoMatch {
    let mut best = TempoMatch {
        mapped_bpm: original_tempo,
        mapping: Mapping::Normal,
        error: (original_tempo - target_cadence).abs(),
    };

    for mapping in Mapping::ALL {
        let mapped = original_tempo * mapping.multiplier();
        let error = (mapped - target_cadence).abs();
        let error_pct = error / target_cadence * 100.0;

        if error_pct <= MAPPING_TOLERANCE_PCT && error < best.error {
            best = TempoMatch {
                mapped_bpm: mapped,
                mapping,
                error,
            };
        }
    }

    best
}
