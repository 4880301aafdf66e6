//! cadence-core: running-cadence playlist pipeline
//!
//! This crate turns catalog tracks into a workout playlist:
//! - tempo estimation from metadata and half/normal/double mapping
//! - per-section BPM targets, tolerance windows and candidate ranking
//! - greedy section assembly with name de-duplication and artist caps
//!
//! Everything here is synchronous and pure apart from the search cache.
//! Catalog I/O lives in the server crate.

pub mod analyze;
pub mod cache;
pub mod error;
pub mod genre;
pub mod pace;
pub mod playlist;
pub mod section;
pub mod tempo;
pub mod track;

pub use analyze::{analyze_track, analyze_tracks};
pub use cache::{CacheStats, SearchCache};
pub use error::{Error, Result};
pub use genre::filter_tracks_by_genres;
pub use pace::{suggested_cadence, Cadence, PaceInput, PaceUnit};
pub use playlist::assemble_playlist;
pub use section::{section_targets, SectionTargets};
pub use tempo::{estimate_tempo, map_tempo, TempoMatch};
pub use track::{Artist, Mapping, Playlist, PlaylistSection, RawTrack, SectionType, TrackData};

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw(id: &str, name: &str, artist: &str, popularity: u8) -> RawTrack {
        RawTrack {
            id: id.into(),
            name: name.into(),
            artists: vec![Artist { id: format!("{}-artist", id), name: artist.into() }],
            preview_url: None,
            duration_ms: 200_000,
            popularity: Some(popularity),
        }
    }

    #[test]
    fn test_end_to_end_targets() {
        let cadence = Cadence::new(175).unwrap();
        let targets = section_targets(cadence.spm());
        assert_eq!(targets, SectionTargets { warmup: 170, main: 175, cooldown: 158 });

        // a track at exactly the cadence passes the gate and fits main
        let m = map_tempo(175.0, cadence.as_bpm());
        assert_eq!(m.mapping, Mapping::Normal);
        assert_eq!(m.error, 0.0);
        assert!(section::is_track_suitable_for_section(m.mapped_bpm, 175.0, SectionType::Main));
    }

    #[test]
    fn test_end_to_end_pipeline_invariants() {
        let cadence = Cadence::new(172).unwrap();
        let raw: Vec<RawTrack> = (0..200)
            .map(|i| make_raw(&format!("id{}", i), &format!("Song {}", i % 150), &format!("Artist {}", i % 13), (i % 100) as u8))
            .collect();

        let analyzed = analyze_tracks(&raw, cadence.as_bpm());
        let targets = section_targets(cadence.spm());
        let playlist = assemble_playlist(&analyzed, &targets);

        assert!(playlist.sections[0].tracks.len() <= 5);
        assert!(playlist.sections[1].tracks.len() <= 20);
        assert_eq!(
            playlist.total_tracks,
            playlist.sections.iter().map(|s| s.tracks.len()).sum::<usize>()
        );

        let mut names = std::collections::HashSet::new();
        for track in playlist.tracks() {
            assert!(names.insert(playlist::UsedNames::normalize(&track.name)));
        }

        for section in &playlist.sections {
            let cap = match section.section_type {
                SectionType::Warmup => 1,
                _ => 2,
            };
            let mut counts = std::collections::HashMap::new();
            for t in &section.tracks {
                *counts.entry(t.artist.as_str()).or_insert(0) += 1;
            }
            assert!(counts.values().all(|&c| c <= cap));
        }
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let raw: Vec<RawTrack> = (0..50)
            .map(|i| make_raw(&format!("x{}", i), &format!("Tune {}", i), &format!("Band {}", i), 60))
            .collect();
        let a = assemble_playlist(&analyze_tracks(&raw, 170.0), &section_targets(170));
        let b = assemble_playlist(&analyze_tracks(&raw, 170.0), &section_targets(170));
        assert_eq!(a, b);
    }
}
