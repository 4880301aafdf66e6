//! Spotify Web API client for track sourcing
//!
//! Uses the client-credentials flow: no user login, just an app token good
//! for catalog search and artist lookups.
//!
//! Reference: https://developer.spotify.com/documentation/web-api

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use cadence_core::{Artist, RawTrack, SearchCache};

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The artists endpoint takes at most this many IDs per call
pub const ARTIST_BATCH_SIZE: usize = 50;

/// Refresh the token this long before Spotify says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Genres reported for one artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistGenres {
    pub id: String,
    pub genres: Vec<String>,
}

/// Catalog operations the recommendation pipeline needs
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search tracks. An error here only loses this one query.
    async fn search(&self, query: &str, limit: u32) -> anyhow::Result<Vec<RawTrack>>;

    /// Genres for the given artists. Best effort: failed batches are skipped.
    async fn artist_genres(&self, ids: &[String]) -> anyhow::Result<Vec<ArtistGenres>>;
}

/// Spotify client with an optional on-disk search cache
pub struct SpotifyClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    client: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
    cache: Option<SearchCache>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

// Spotify API response structures
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Option<TrackObject>>,
}

#[derive(Deserialize)]
struct TrackObject {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    preview_url: Option<String>,
    #[serde(default)]
    duration_ms: u32,
    popularity: Option<u8>,
}

#[derive(Deserialize)]
struct ArtistObject {
    id: Option<String>,
    name: String,
}

#[derive(Deserialize)]
struct ArtistsResponse {
    #[serde(default)]
    artists: Vec<Option<FullArtistObject>>,
}

#[derive(Deserialize)]
struct FullArtistObject {
    id: String,
    #[serde(default)]
    genres: Vec<String>,
}

impl TrackObject {
    /// Local files and unavailable tracks come back without IDs; drop them.
    /// Artists without an ID keep their name with an empty ID.
    fn into_raw(self) -> Option<RawTrack> {
        let id = self.id?;
        let artists: Vec<Artist> = self
            .artists
            .into_iter()
            .map(|a| Artist {
                id: a.id.unwrap_or_default(),
                name: a.name,
            })
            .collect();
        if artists.is_empty() {
            return None;
        }

        Some(RawTrack {
            id,
            name: self.name,
            artists,
            preview_url: self.preview_url,
            duration_ms: self.duration_ms,
            popularity: self.popularity,
        })
    }
}

impl SpotifyClient {
    /// Create a new client. Missing credentials only fail once a request needs a token.
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        cache: Option<SearchCache>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client_id,
            client_secret,
            client,
            token: Mutex::new(None),
            cache,
        })
    }

    /// Current app token, fetching a new one when missing or about to expire
    async fn access_token(&self) -> anyhow::Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => anyhow::bail!("Spotify credentials not configured"),
        };

        debug!("Requesting Spotify access token");

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Failed to get Spotify access token: {} - {}", status, body);
        }

        let body: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(AccessToken {
            value: body.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(body.access_token)
    }

    async fn fetch_search(&self, query: &str, limit: u32) -> anyhow::Result<Vec<RawTrack>> {
        let token = self.access_token().await?;
        let url = format!("{}/search", API_BASE);
        let limit_param = limit.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("q", query), ("type", "track"), ("limit", limit_param.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to search tracks: HTTP {}", response.status());
        }

        let body: SearchResponse = response.json().await?;
        let tracks: Vec<RawTrack> = body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(TrackObject::into_raw)
            .collect();

        debug!("Search '{}' returned {} tracks", query, tracks.len());
        Ok(tracks)
    }

    async fn fetch_artist_batch(&self, token: &str, batch: &[String]) -> anyhow::Result<Vec<ArtistGenres>> {
        let url = format!("{}/artists", API_BASE);
        let ids = batch.join(",");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("ids", ids.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }

        let body: ArtistsResponse = response.json().await?;
        Ok(body
            .artists
            .into_iter()
            .flatten()
            .map(|a| ArtistGenres {
                id: a.id,
                genres: a.genres,
            })
            .collect())
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search(&self, query: &str, limit: u32) -> anyhow::Result<Vec<RawTrack>> {
        if let Some(cache) = &self.cache {
            if let Some(tracks) = cache.get(query, limit) {
                debug!("Cache hit for search '{}'", query);
                return Ok(tracks);
            }
        }

        let tracks = self.fetch_search(query, limit).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(query, limit, &tracks) {
                warn!("Failed to cache search '{}': {}", query, e);
            }
        }

        Ok(tracks)
    }

    async fn artist_genres(&self, ids: &[String]) -> anyhow::Result<Vec<ArtistGenres>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.access_token().await?;
        let mut result = Vec::with_capacity(ids.len());

        for batch in ids.chunks(ARTIST_BATCH_SIZE) {
            match self.fetch_artist_batch(&token, batch).await {
                Ok(artists) => result.extend(artists),
                Err(e) => warn!("Failed to get artists batch of {}: {}", batch.len(), e),
            }
        }

        debug!("Fetched genres for {} of {} artists", result.len(), ids.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "tracks": {
                "items": [
                    {
                        "id": "t1",
                        "name": "Levitating",
                        "artists": [{"id": "a1", "name": "Dua Lipa"}],
                        "preview_url": null,
                        "duration_ms": 203064,
                        "popularity": 85
                    },
                    null,
                    {
                        "id": null,
                        "name": "Local file",
                        "artists": [{"id": null, "name": "Me"}],
                        "duration_ms": 1000
                    },
                    {
                        "id": "t2",
                        "name": "No artists",
                        "artists": [],
                        "duration_ms": 1000
                    },
                    {
                        "id": "t3",
                        "name": "Feature",
                        "artists": [{"id": "a3", "name": "Lead"}, {"id": null, "name": "Guest"}],
                        "duration_ms": 1000
                    }
                ]
            }
        }"#;

        let body: SearchResponse = serde_json::from_str(json).unwrap();
        let tracks: Vec<RawTrack> = body
            .tracks
            .unwrap()
            .items
            .into_iter()
            .flatten()
            .filter_map(TrackObject::into_raw)
            .collect();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "t1");
        assert_eq!(tracks[0].artists[0].name, "Dua Lipa");
        assert_eq!(tracks[0].popularity, Some(85));
        assert_eq!(tracks[0].duration_ms, 203064);

        // an artist without an ID still counts toward the display name
        assert_eq!(tracks[1].id, "t3");
        assert_eq!(tracks[1].artist_display(), "Lead, Guest");
        assert_eq!(tracks[1].artists[1].id, "");
    }

    #[test]
    fn test_artists_response_parsing() {
        let json = r#"{"artists": [
            {"id": "a1", "name": "X", "genres": ["dance pop", "pop"]},
            null,
            {"id": "a2", "name": "Y"}
        ]}"#;
        let body: ArtistsResponse = serde_json::from_str(json).unwrap();
        let artists: Vec<FullArtistObject> = body.artists.into_iter().flatten().collect();
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].genres, vec!["dance pop", "pop"]);
        assert!(artists[1].genres.is_empty());
    }

    #[test]
    fn test_token_response_default_expiry() {
        let body: TokenResponse = serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer"}"#).unwrap();
        assert_eq!(body.access_token, "abc");
        assert_eq!(body.expires_in, 3600);
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = SpotifyClient::new(None, None, None).unwrap();
        let err = client.search("workout", 15).await.unwrap_err();
        assert!(err.to_string().contains("credentials"));
    }

    #[tokio::test]
    async fn test_empty_artist_lookup_needs_no_token() {
        let client = SpotifyClient::new(None, None, None).unwrap();
        assert!(client.artist_genres(&[]).await.unwrap().is_empty());
    }
}
