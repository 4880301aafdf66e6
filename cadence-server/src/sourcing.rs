//! Candidate pool sourcing
//!
//! Runs a fixed set of catalog searches (general terms, then groups of
//! popular and indie artists), de-duplicates the results and trims them to a
//! popularity-biased, shuffled pool. A failed search is logged and skipped;
//! the pool is built from whatever succeeded.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use cadence_core::RawTrack;

use crate::spotify::Catalog;

/// General searches, `TERM_LIMIT` results each
pub const SEARCH_TERMS: &[&str] = &[
    "year:2023-2024",
    "year:2022-2024",
    "year:2021-2024",
    "top hits 2024",
    "top hits 2023",
    "billboard hot 100",
    "global top 50",
    "viral 50",
    "workout",
    "running",
    "cardio",
    "gym",
    "energetic",
    "upbeat",
    "dance hits",
    "pop hits",
    "rock hits",
    "hip hop hits",
    "electronic hits",
];
const TERM_LIMIT: u32 = 15;

pub const POPULAR_ARTISTS: &[&str] = &[
    "Dua Lipa", "The Weeknd", "Harry Styles", "Taylor Swift", "Ed Sheeran",
    "Drake", "Bad Bunny", "Post Malone", "Travis Scott", "Kendrick Lamar",
    "Calvin Harris", "David Guetta", "Marshmello", "Zedd", "Martin Garrix",
    "Imagine Dragons", "OneRepublic", "Coldplay", "Maroon 5", "The Killers",
    "Ariana Grande", "Billie Eilish", "Olivia Rodrigo", "Doja Cat", "SZA",
];
const POPULAR_GROUP_SIZE: usize = 3;
const POPULAR_LIMIT: u32 = 8;

pub const INDIE_ARTISTS: &[&str] = &[
    "Tame Impala", "Arctic Monkeys", "The Strokes", "Foster the People",
    "MGMT", "Vampire Weekend", "Two Door Cinema Club", "Phoenix",
    "Cage the Elephant", "Portugal. The Man", "Glass Animals", "Alt-J",
    "The Killers", "Franz Ferdinand", "Interpol", "Yeah Yeah Yeahs",
    "Modest Mouse", "The Shins", "Death Cab for Cutie", "Bloc Party",
    "Grizzly Bear", "Animal Collective", "Panda Bear", "Beach House",
    "Real Estate", "Mac DeMarco", "Clairo", "Rex Orange County",
];
const INDIE_GROUP_SIZE: usize = 4;
const INDIE_LIMIT: u32 = 12;

/// Used only when every other search came back empty
const FALLBACK_QUERY: &str = "popular music 2024";
const FALLBACK_LIMIT: u32 = 30;

/// Tracks above this popularity are preferred
pub const POPULARITY_THRESHOLD: u8 = 30;
/// Low-popularity tracks are only added until the pool reaches this size
pub const MIN_POOL_SIZE: usize = 50;

/// `artist:"A" OR artist:"B"` query for a group of artists
pub fn artist_query(group: &[&str]) -> String {
    group
        .iter()
        .map(|a| format!("artist:\"{}\"", a))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Every (query, limit) pair, in search order
pub fn build_queries() -> Vec<(String, u32)> {
    let mut queries: Vec<(String, u32)> = SEARCH_TERMS
        .iter()
        .map(|t| (t.to_string(), TERM_LIMIT))
        .collect();

    queries.extend(
        POPULAR_ARTISTS
            .chunks(POPULAR_GROUP_SIZE)
            .map(|g| (artist_query(g), POPULAR_LIMIT)),
    );
    queries.extend(
        INDIE_ARTISTS
            .chunks(INDIE_GROUP_SIZE)
            .map(|g| (artist_query(g), INDIE_LIMIT)),
    );

    queries
}

/// Run all searches, skipping failures
pub async fn gather_tracks<C: Catalog + ?Sized>(catalog: &C) -> Vec<RawTrack> {
    let mut all = Vec::new();
    let mut failures = 0usize;

    for (query, limit) in build_queries() {
        match catalog.search(&query, limit).await {
            Ok(tracks) => all.extend(tracks),
            Err(e) => {
                failures += 1;
                warn!("Search failed for \"{}\": {}", query, e);
            }
        }
    }

    if all.is_empty() {
        warn!("All searches came back empty, trying fallback query");
        match catalog.search(FALLBACK_QUERY, FALLBACK_LIMIT).await {
            Ok(tracks) => all.extend(tracks),
            Err(e) => warn!("Fallback search also failed: {}", e),
        }
    }

    debug!("Gathered {} raw tracks ({} searches failed)", all.len(), failures);
    all
}

/// Drop repeated IDs, keeping the first occurrence
pub fn dedupe_by_id(tracks: Vec<RawTrack>) -> Vec<RawTrack> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

/// Popular tracks first (most popular leading), backfilled with the rest
/// until the pool reaches `MIN_POOL_SIZE`
pub fn select_pool(tracks: Vec<RawTrack>) -> Vec<RawTrack> {
    let (mut popular, rest): (Vec<RawTrack>, Vec<RawTrack>) = tracks
        .into_iter()
        .partition(|t| t.popularity.map(|p| p > POPULARITY_THRESHOLD).unwrap_or(false));

    popular.sort_by(|a, b| b.popularity_or_zero().cmp(&a.popularity_or_zero()));

    if popular.len() < MIN_POOL_SIZE {
        let needed = MIN_POOL_SIZE - popular.len();
        popular.extend(rest.into_iter().take(needed));
    }
    popular
}

/// Search, de-duplicate, trim and shuffle
pub async fn source_tracks<C, R>(catalog: &C, rng: &mut R) -> Vec<RawTrack>
where
    C: Catalog + ?Sized,
    R: Rng + Send,
{
    let gathered = gather_tracks(catalog).await;
    let unique = dedupe_by_id(gathered);
    let mut pool = select_pool(unique);
    pool.shuffle(rng);

    info!("Sourced a pool of {} candidate tracks", pool.len());
    pool
}

/// Unique non-empty artist IDs across tracks, in first-seen order
pub fn artist_ids(tracks: &[RawTrack]) -> Vec<String> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter(|a| !a.id.is_empty() && seen.insert(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect()
}

/// Artist ID -> genres for every artist on the given tracks
pub async fn fetch_artist_genres<C: Catalog + ?Sized>(
    catalog: &C,
    tracks: &[RawTrack],
) -> HashMap<String, Vec<String>> {
    let ids = artist_ids(tracks);
    match catalog.artist_genres(&ids).await {
        Ok(artists) => artists.into_iter().map(|a| (a.id, a.genres)).collect(),
        Err(e) => {
            warn!("Failed to fetch artist genres: {}", e);
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Artist;

    fn make_track(id: &str, popularity: Option<u8>) -> RawTrack {
        RawTrack {
            id: id.into(),
            name: format!("Song {}", id),
            artists: vec![Artist {
                id: format!("artist-{}", id),
                name: "Someone".into(),
            }],
            preview_url: None,
            duration_ms: 200_000,
            popularity,
        }
    }

    #[test]
    fn test_artist_query() {
        assert_eq!(
            artist_query(&["Dua Lipa", "Drake"]),
            "artist:\"Dua Lipa\" OR artist:\"Drake\""
        );
    }

    #[test]
    fn test_build_queries() {
        let queries = build_queries();
        // 19 terms + 9 popular groups + 7 indie groups
        assert_eq!(queries.len(), 19 + 9 + 7);
        assert_eq!(queries[0], ("year:2023-2024".to_string(), 15));
        assert_eq!(
            queries[19],
            ("artist:\"Dua Lipa\" OR artist:\"The Weeknd\" OR artist:\"Harry Styles\"".to_string(), 8)
        );
        // last popular group holds the remaining single artist
        assert_eq!(queries[27], ("artist:\"SZA\"".to_string(), 8));
        assert_eq!(queries[28].1, 12);
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut second = make_track("a", Some(10));
        second.name = "Other".into();
        let tracks = vec![make_track("a", Some(90)), make_track("b", None), second];

        let unique = dedupe_by_id(tracks);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].popularity, Some(90));
    }

    #[test]
    fn test_select_pool_sorts_and_backfills() {
        let tracks = vec![
            make_track("low", Some(30)),
            make_track("mid", Some(50)),
            make_track("none", None),
            make_track("high", Some(80)),
        ];
        let pool = select_pool(tracks);
        let ids: Vec<&str> = pool.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low", "none"]);
    }

    #[test]
    fn test_select_pool_skips_backfill_when_full() {
        let mut tracks: Vec<RawTrack> = (0..60).map(|i| make_track(&i.to_string(), Some(40 + (i % 50) as u8))).collect();
        tracks.push(make_track("unpopular", Some(5)));

        let pool = select_pool(tracks);
        assert_eq!(pool.len(), 60);
        assert!(pool.iter().all(|t| t.id != "unpopular"));
    }

    #[test]
    fn test_backfill_stops_at_min_pool_size() {
        let tracks: Vec<RawTrack> = (0..80).map(|i| make_track(&i.to_string(), None)).collect();
        assert_eq!(select_pool(tracks).len(), MIN_POOL_SIZE);
    }

    #[test]
    fn test_artist_ids_unique_in_order() {
        let mut t1 = make_track("1", None);
        t1.artists.push(Artist { id: "shared".into(), name: "S".into() });
        let mut t2 = make_track("2", None);
        t2.artists.insert(0, Artist { id: "shared".into(), name: "S".into() });
        t2.artists.push(Artist { id: String::new(), name: "No ID".into() });

        assert_eq!(
            artist_ids(&[t1, t2]),
            vec!["artist-1", "shared", "artist-2"]
        );
    }
}
