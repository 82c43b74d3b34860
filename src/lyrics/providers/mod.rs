pub mod lrclib;
pub mod musixmatch;

use crate::lyrics::types::{LyricsDocument, LyricsError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use lrclib::LrclibProvider;
pub use musixmatch::MusixmatchProvider;

/// Track information used to search for lyrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsQuery {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Track duration in seconds.
    pub duration: Option<f64>,
}

/// A remote lyrics service returning zero or more candidate documents.
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Short, stable name, also used as the document's source label.
    fn name(&self) -> &'static str;

    async fn search(&self, query: &LyricsQuery) -> Result<Vec<LyricsDocument>, LyricsError>;
}

/// Shared HTTP client with reasonable defaults for timeouts.
pub fn http_client() -> Result<Client, LyricsError> {
    Ok(Client::builder()
        .user_agent(concat!("lyrictui/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?)
}

/// Instantiate providers by name, in the given order. Unknown names are skipped.
pub fn from_names(names: &[String], client: &Client) -> Vec<Arc<dyn LyricsProvider>> {
    let mut providers: Vec<Arc<dyn LyricsProvider>> = Vec::new();
    for name in names {
        match name.trim().to_lowercase().as_str() {
            "lrclib" => providers.push(Arc::new(LrclibProvider::new(client.clone()))),
            "musixmatch" => providers.push(Arc::new(MusixmatchProvider::from_env(client.clone()))),
            other => warn!(provider = other, "unknown lyrics provider, ignoring"),
        }
    }
    providers
}
