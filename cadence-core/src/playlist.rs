//! Playlist assembly
//!
//! Sections are filled one after another by a greedy pass over their ranked
//! candidates. The set of song names already used is threaded through the
//! passes as an explicit value, so a song picked for warm-up can never show
//! up again in the main section, even under a different track ID.
//!
//! Cool-down has a target but is not assembled.

use std::collections::{HashMap, HashSet};

use crate::section::{candidates_for_section, SectionTargets};
use crate::track::{Playlist, PlaylistSection, SectionType, TrackData};

/// Artist key used when a track has no artist text
const UNKNOWN_ARTIST: &str = "Unknown";

/// Limits for one section pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionPolicy {
    pub section: SectionType,
    pub max_tracks: usize,
    pub max_per_artist: usize,
}

pub const WARMUP_POLICY: SectionPolicy = SectionPolicy {
    section: SectionType::Warmup,
    max_tracks: 5,
    max_per_artist: 1,
};

pub const MAIN_POLICY: SectionPolicy = SectionPolicy {
    section: SectionType::Main,
    max_tracks: 20,
    max_per_artist: 2,
};

/// Normalized song names already placed in the playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedNames(HashSet<String>);

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed, case-folded name used for de-duplication
    pub fn normalize(name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&Self::normalize(name))
    }

    fn insert_key(&mut self, key: String) {
        self.0.insert(key);
    }
}

/// Greedily pick tracks from ranked candidates.
///
/// Takes the used-name set by value and hands it back with this section's
/// picks added. Tracks with an empty name, a name already used, or an artist
/// at the per-artist cap are skipped.
pub fn pick_tracks(
    candidates: &[&TrackData],
    used_names: UsedNames,
    policy: &SectionPolicy,
) -> (Vec<TrackData>, UsedNames) {
    let mut used_names = used_names;
    let mut artist_counts: HashMap<&str, usize> = HashMap::new();
    let mut picked = Vec::new();

    if policy.max_tracks == 0 {
        return (picked, used_names);
    }

    for track in candidates {
        let name_key = UsedNames::normalize(&track.name);
        if name_key.is_empty() || used_names.contains(&track.name) {
            continue;
        }

        let artist = if track.artist.is_empty() {
            UNKNOWN_ARTIST
        } else {
            track.artist.as_str()
        };
        let count = artist_counts.entry(artist).or_insert(0);
        if *count >= policy.max_per_artist {
            continue;
        }

        *count += 1;
        used_names.insert_key(name_key);
        picked.push((*track).clone());

        if picked.len() >= policy.max_tracks {
            break;
        }
    }

    (picked, used_names)
}

/// Assemble a single section, skipping IDs in `exclude_ids`
pub fn assemble_section(
    tracks: &[TrackData],
    targets: &SectionTargets,
    policy: &SectionPolicy,
    exclude_ids: &HashSet<&str>,
    used_names: UsedNames,
) -> (PlaylistSection, UsedNames) {
    let target_bpm = targets.for_section(policy.section);
    let candidates: Vec<&TrackData> = candidates_for_section(tracks, target_bpm, policy.section)
        .into_iter()
        .filter(|t| !exclude_ids.contains(t.id.as_str()))
        .collect();

    let (picked, used_names) = pick_tracks(&candidates, used_names, policy);

    let section = PlaylistSection {
        section_type: policy.section,
        target_bpm,
        tracks: picked,
    };
    (section, used_names)
}

/// Build the warm-up and main sections from analyzed tracks
pub fn assemble_playlist(tracks: &[TrackData], targets: &SectionTargets) -> Playlist {
    let (warmup, used_names) = assemble_section(
        tracks,
        targets,
        &WARMUP_POLICY,
        &HashSet::new(),
        UsedNames::new(),
    );

    let (main, _) = {
        let warmup_ids: HashSet<&str> = warmup.tracks.iter().map(|t| t.id.as_str()).collect();
        assemble_section(tracks, targets, &MAIN_POLICY, &warmup_ids, used_names)
    };

    Playlist::new(vec![warmup, main])
}
