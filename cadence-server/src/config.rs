//! Server configuration

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address the CLI connects to
    pub bind_addr: String,
    /// Spotify app credentials (client-credentials flow)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Search cache directory; caching is off when unset
    pub cache_dir: Option<PathBuf>,
    /// Age after which cached searches are refetched
    pub cache_max_age: Duration,
}

impl Config {
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}
