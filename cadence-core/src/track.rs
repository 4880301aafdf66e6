//! Track and playlist data structures
//!
//! `RawTrack` is what the catalog hands us; `TrackData` is a track after
//! tempo estimation and mapping; `Playlist` is the final output of the
//! pipeline, handed to the presentation layer untouched.

use serde::{Deserialize, Serialize};

/// Artist credit on a catalog track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

/// Track as returned by the music catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    /// Catalog track ID (unique)
    pub id: String,
    /// Track title
    pub name: String,
    /// Credited artists, in catalog order
    pub artists: Vec<Artist>,
    /// 30 second preview, if the catalog provides one
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Track length in milliseconds
    pub duration_ms: u32,
    /// Catalog popularity (0-100)
    #[serde(default)]
    pub popularity: Option<u8>,
}

impl RawTrack {
    /// Artist names joined for display ("A, B")
    pub fn artist_display(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Popularity with missing values treated as 0
    pub fn popularity_or_zero(&self) -> u8 {
        self.popularity.unwrap_or(0)
    }
}

/// Multiplier applied to a track's tempo to line it up with the cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mapping {
    Half,
    Normal,
    Double,
}

impl Mapping {
    /// All mappings in the order they are tried
    pub const ALL: [Mapping; 3] = [Mapping::Half, Mapping::Normal, Mapping::Double];

    pub fn multiplier(self) -> f64 {
        match self {
            Mapping::Half => 0.5,
            Mapping::Normal => 1.0,
            Mapping::Double => 2.0,
        }
    }
}

/// A catalog track after tempo estimation and mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    pub id: String,
    pub name: String,
    /// Artist names joined with ", "
    pub artist: String,
    pub preview_url: Option<String>,
    /// Estimated tempo before mapping
    pub original_tempo: f64,
    /// Tempo after applying `mapping`
    pub mapped_bpm: f64,
    pub mapping: Mapping,
    pub confidence: f64,
    pub duration_ms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u8>,
}

/// Workout phase of a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Warmup,
    Main,
    Cooldown,
}

impl SectionType {
    /// Allowed deviation from the section target, as a fraction of the target
    pub fn tolerance_ratio(self) -> f64 {
        match self {
            SectionType::Main => 0.02,
            SectionType::Warmup => 0.05,
            SectionType::Cooldown => 0.08,
        }
    }
}

/// One phase of the playlist with its tracks in listening order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSection {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub target_bpm: u32,
    pub tracks: Vec<TrackData>,
}

/// Final ordered playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub sections: Vec<PlaylistSection>,
    pub total_tracks: usize,
}

impl Playlist {
    pub fn new(sections: Vec<PlaylistSection>) -> Self {
        let total_tracks = sections.iter().map(|s| s.tracks.len()).sum();
        Self {
            sections,
            total_tracks,
        }
    }

    pub fn section(&self, section_type: SectionType) -> Option<&PlaylistSection> {
        self.sections.iter().find(|s| s.section_type == section_type)
    }

    pub fn is_empty(&self) -> bool {
        self.total_tracks == 0
    }

    /// All tracks across sections, in playlist order
    pub fn tracks(&self) -> impl Iterator<Item = &TrackData> {
        self.sections.iter().flat_map(|s| s.tracks.iter())
    }
}
