//! TCP server for CLI communication
//!
//! Provides a simple JSON-RPC style interface for the lightweight CLI client:
//! one JSON request per line, one JSON response per line.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use cadence_core::pace::CADENCE_RANGE;
use cadence_core::{section_targets, suggested_cadence, Cadence, PaceInput, PaceUnit, SearchCache};

use crate::config::Config;
use crate::recommend::{recommend, RecommendRequest};
use crate::spotify::Catalog;

/// Server state
pub struct ServerState<C> {
    config: Config,
    catalog: C,
    cache: Option<SearchCache>,
}

impl<C: Catalog> ServerState<C> {
    pub fn new(config: Config, catalog: C, cache: Option<SearchCache>) -> Self {
        Self { config, catalog, cache }
    }
}

/// Request from CLI client
#[derive(Debug, Deserialize)]
#[serde(tag = "method")]
#[serde(rename_all = "snake_case")]
enum Request {
    Recommend {
        pace: String,
        #[serde(default)]
        unit: PaceUnit,
        #[serde(default)]
        cadence: Option<u32>,
        #[serde(default)]
        genres: Option<Vec<String>>,
    },
    Targets { cadence: u32 },
    Suggest {
        pace: String,
        #[serde(default)]
        unit: PaceUnit,
    },
    Status,
    CacheStats,
    CacheClear,
}

/// Response to CLI client
#[derive(Debug, Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl Response {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Run the server
pub async fn run<C: Catalog + 'static>(state: ServerState<C>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&state.config.bind_addr).await?;
    info!("Server listening on {}", state.config.bind_addr);

    let state = Arc::new(state);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("Client connected from {}", addr);
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, state).await {
                        error!("Client error: {}", e);
                    }
                });
            }
            Err(e) => {
                warn!("Accept error: {}", e);
            }
        }
    }
}

/// Handle a single client connection
async fn handle_client<C: Catalog>(
    stream: TcpStream,
    state: Arc<ServerState<C>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        debug!("Received: {}", line.trim());

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request, &state).await,
            Err(e) => Response::error(format!("Invalid request: {}", e)),
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        line.clear();
    }

    Ok(())
}

/// Process a request
async fn handle_request<C: Catalog>(request: Request, state: &ServerState<C>) -> Response {
    match request {
        Request::Recommend { pace, unit, cadence, genres } => {
            let pace = match PaceInput::parse(&pace, unit) {
                Ok(p) => p,
                Err(e) => return Response::error(e.to_string()),
            };
            let request = RecommendRequest { pace, cadence, genres };

            let mut rng = StdRng::from_entropy();
            match recommend(&state.catalog, request, &mut rng).await {
                Ok(result) => match serde_json::to_value(&result) {
                    Ok(data) => Response::ok_with_data(
                        format!(
                            "{} tracks for {} at {}",
                            result.playlist.total_tracks, result.metadata.pace, result.metadata.cadence
                        ),
                        data,
                    ),
                    Err(e) => Response::error(format!("Failed to encode playlist: {}", e)),
                },
                Err(e) => Response::error(format!("Recommendation failed: {}", e)),
            }
        }

        Request::Targets { cadence } => match Cadence::new(cadence) {
            Ok(cadence) => {
                let targets = section_targets(cadence.spm());
                Response::ok_with_data(
                    format!("Section targets for {}", cadence),
                    serde_json::json!({
                        "cadence": cadence,
                        "targets": targets,
                    }),
                )
            }
            Err(e) => Response::error(e.to_string()),
        },

        Request::Suggest { pace, unit } => match PaceInput::parse(&pace, unit) {
            Ok(pace) => {
                let cadence = suggested_cadence(&pace);
                Response::ok_with_data(
                    format!("Suggested cadence for {}: {}", pace, cadence),
                    serde_json::json!({
                        "pace": pace,
                        "cadence": cadence,
                        "range": [CADENCE_RANGE.start(), CADENCE_RANGE.end()],
                    }),
                )
            }
            Err(e) => Response::error(e.to_string()),
        },

        Request::Status => Response::ok_with_data(
            "Server running",
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "credentials": state.config.has_credentials(),
                "cache": state.cache.is_some(),
            }),
        ),

        Request::CacheStats => match &state.cache {
            Some(cache) => match cache.stats() {
                Ok(stats) => Response::ok_with_data(
                    "Cache statistics",
                    serde_json::json!({
                        "entries": stats.entry_count,
                        "size_bytes": stats.total_size_bytes,
                        "size_mb": stats.total_size_bytes as f64 / 1024.0 / 1024.0,
                    }),
                ),
                Err(e) => Response::error(format!("Failed to get cache stats: {}", e)),
            },
            None => Response::error("Search cache is disabled"),
        },

        Request::CacheClear => match &state.cache {
            Some(cache) => match cache.clear() {
                Ok(()) => Response::ok("Cache cleared"),
                Err(e) => Response::error(format!("Failed to clear cache: {}", e)),
            },
            None => Response::error("Search cache is disabled"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cadence_core::RawTrack;
    use tempfile::TempDir;

    use crate::recommend::tests::{make_tracks, FakeCatalog};

    fn make_config() -> Config {
        Config {
            bind_addr: "127.0.0.1:0".into(),
            client_id: None,
            client_secret: None,
            cache_dir: None,
            cache_max_age: Duration::from_secs(3600),
        }
    }

    fn make_state(cache: Option<SearchCache>) -> ServerState<FakeCatalog> {
        ServerState::new(make_config(), FakeCatalog::new(make_tracks(60)), cache)
    }

    async fn call(state: &ServerState<FakeCatalog>, json: &str) -> Response {
        let request: Request = serde_json::from_str(json).unwrap();
        handle_request(request, state).await
    }

    #[test]
    fn test_request_parsing() {
        let req: Request = serde_json::from_str(r#"{"method":"recommend","pace":"5:30"}"#).unwrap();
        match req {
            Request::Recommend { pace, unit, cadence, genres } => {
                assert_eq!(pace, "5:30");
                assert_eq!(unit, PaceUnit::Km);
                assert!(cadence.is_none());
                assert!(genres.is_none());
            }
            other => panic!("unexpected request {:?}", other),
        }

        let req: Request = serde_json::from_str(r#"{"method":"cache_clear"}"#).unwrap();
        assert!(matches!(req, Request::CacheClear));

        assert!(serde_json::from_str::<Request>(r#"{"method":"export"}"#).is_err());
    }

    #[tokio::test]
    async fn test_targets() {
        let state = make_state(None);
        let resp = call(&state, r#"{"method":"targets","cadence":175}"#).await;
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data["targets"]["warmup"], 170);
        assert_eq!(data["targets"]["main"], 175);
        assert_eq!(data["targets"]["cooldown"], 158);

        let resp = call(&state, r#"{"method":"targets","cadence":0}"#).await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn test_suggest() {
        let state = make_state(None);
        let resp = call(&state, r#"{"method":"suggest","pace":"8:00","unit":"mi"}"#).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["cadence"], 174);

        let resp = call(&state, r#"{"method":"suggest","pace":"5:75"}"#).await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn test_recommend() {
        let state = make_state(None);
        let resp = call(&state, r#"{"method":"recommend","pace":"5:00","cadence":176,"genres":["rock"]}"#).await;
        assert!(resp.success);

        let data = resp.data.unwrap();
        assert_eq!(data["metadata"]["cadence"], 176);
        assert_eq!(data["metadata"]["sectionTargets"]["warmup"], 171);
        let sections = data["playlist"]["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["type"], "warmup");
        assert_eq!(sections[1]["targetBpm"], 176);
    }

    #[tokio::test]
    async fn test_recommend_bad_pace() {
        let state = make_state(None);
        let resp = call(&state, r#"{"method":"recommend","pace":"fast"}"#).await;
        assert!(!resp.success);
        assert!(resp.message.unwrap().contains("M:SS"));
    }

    #[tokio::test]
    async fn test_cache_requests() {
        let state = make_state(None);
        assert!(!call(&state, r#"{"method":"cache_stats"}"#).await.success);

        let tmp = TempDir::new().unwrap();
        let cache = SearchCache::new(tmp.path(), Duration::from_secs(3600)).unwrap();
        cache.put("workout", 15, &Vec::<RawTrack>::new()).unwrap();
        let state = make_state(Some(cache));

        let resp = call(&state, r#"{"method":"cache_stats"}"#).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["entries"], 1);

        assert!(call(&state, r#"{"method":"cache_clear"}"#).await.success);
        let resp = call(&state, r#"{"method":"cache_stats"}"#).await;
        assert_eq!(resp.data.unwrap()["entries"], 0);
    }

    #[tokio::test]
    async fn test_status() {
        let state = make_state(None);
        let resp = call(&state, r#"{"method":"status"}"#).await;
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["credentials"], false);
    }
}
