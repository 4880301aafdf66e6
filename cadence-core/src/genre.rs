//! Genre filtering of the candidate pool
//!
//! Artist genres from the catalog are free-form strings ("melodic rap",
//! "dance pop", ...). A requested genre matches when either string contains
//! the other, or through a hand-kept synonym list for the genres a runner
//! can pick.

use std::collections::HashMap;

use tracing::debug;

use crate::track::RawTrack;

/// Genres used when the request names none
pub const DEFAULT_GENRES: &[&str] = &["pop", "electronic", "hip-hop"];

/// Genres a runner can pick
pub const SELECTABLE_GENRES: &[&str] = &["pop", "electronic", "hip-hop", "rock", "dance", "indie"];

/// Backfill the filtered pool up to this many tracks
pub const MIN_FILTERED_TRACKS: usize = 20;

/// Synonym fragments per selectable genre, matched against artist genres
const GENRE_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "hip-hop",
        &["hip hop", "rap", "trap", "drill", "conscious hip hop", "gangster rap", "melodic rap"],
    ),
    (
        "electronic",
        &["electronic", "edm", "house", "techno", "electro", "synthpop", "dance", "dubstep"],
    ),
    (
        "pop",
        &["pop", "contemporary r&b", "electropop", "dance pop", "art pop", "indie pop"],
    ),
    (
        "rock",
        &["rock", "alternative", "indie rock", "pop rock", "modern rock"],
    ),
    (
        "dance",
        &["dance", "house", "edm", "electronic dance", "club"],
    ),
    (
        "indie",
        &[
            "indie", "alternative", "art pop", "chamber pop", "indie rock", "indie pop",
            "indie folk", "bedroom pop", "dream pop", "shoegaze", "lo-fi", "alternative rock",
            "alternative pop", "alt-pop", "new wave", "post-punk", "synthwave", "chillwave",
        ],
    ),
];

/// Whether an artist genre satisfies a requested genre
pub fn genre_matches(selected: &str, artist_genre: &str) -> bool {
    let genre = artist_genre.to_lowercase();
    let selected = selected.to_lowercase();

    if genre.contains(&selected) || selected.contains(&genre) {
        return true;
    }

    GENRE_SYNONYMS
        .iter()
        .find(|(name, _)| *name == selected)
        .map(|(_, synonyms)| synonyms.iter().any(|s| genre.contains(s)))
        .unwrap_or(false)
}

/// Whether any of the track's artists has a genre matching any selected genre
pub fn track_matches_genres(
    track: &RawTrack,
    artist_genres: &HashMap<String, Vec<String>>,
    selected: &[String],
) -> bool {
    track.artists.iter().any(|artist| {
        let genres = match artist_genres.get(&artist.id) {
            Some(g) => g,
            None => return false,
        };
        selected
            .iter()
            .any(|sel| genres.iter().any(|g| genre_matches(sel, g)))
    })
}

/// Keep tracks matching the selected genres.
///
/// When fewer than `MIN_FILTERED_TRACKS` match, the most popular remaining
/// tracks are appended until that count is reached.
pub fn filter_tracks_by_genres(
    tracks: &[RawTrack],
    artist_genres: &HashMap<String, Vec<String>>,
    selected: &[String],
) -> Vec<RawTrack> {
    let (matching, mut extra): (Vec<&RawTrack>, Vec<&RawTrack>) = tracks
        .iter()
        .partition(|t| track_matches_genres(t, artist_genres, selected));
    let mut filtered: Vec<RawTrack> = matching.into_iter().cloned().collect();

    if filtered.len() >= MIN_FILTERED_TRACKS {
        return filtered;
    }

    extra.sort_by(|a, b| b.popularity_or_zero().cmp(&a.popularity_or_zero()));

    let needed = MIN_FILTERED_TRACKS - filtered.len();
    debug!(
        "Genre filter kept {} tracks, backfilling up to {} more",
        filtered.len(),
        needed
    );
    filtered.extend(extra.into_iter().take(needed).cloned());
    filtered
}

/// Requested genres, or the defaults when the request has no genre list.
///
/// An explicit empty list stays empty: nothing matches and the filter falls
/// back to the most popular tracks.
pub fn resolve_genres(requested: Option<&[String]>) -> Vec<String> {
    match requested {
        Some(genres) => genres.to_vec(),
        None => DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
    }
}
