//! Aggregates every configured provider into one ranked candidate set.

use crate::lyrics::providers::{LyricsProvider, LyricsQuery};
use crate::lyrics::types::CandidateSet;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LyricsSource {
    providers: Vec<Arc<dyn LyricsProvider>>,
}

impl LyricsSource {
    pub fn new(providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Query all providers concurrently and rank whatever comes back.
    ///
    /// Never fails: a provider error contributes no candidates. Documents are
    /// collected in the order their provider answered, which decides ties.
    /// Dropping the returned future cancels every in-flight request.
    pub async fn fetch(&self, query: &LyricsQuery) -> CandidateSet {
        let mut pending: FuturesUnordered<_> = self
            .providers
            .iter()
            .map(|provider| async move { (provider.name(), provider.search(query).await) })
            .collect();

        let mut docs = Vec::new();
        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(found) => {
                    debug!(provider = name, count = found.len(), "provider answered");
                    docs.extend(found.into_iter().filter(|d| !d.is_empty()));
                }
                Err(e) => warn!(provider = name, error = %e, "provider failed"),
            }
        }
        let ranked = CandidateSet::ranked(docs);
        debug!(
            ranking = ?ranked.iter().map(|d| (d.source.as_str(), d.quality)).collect::<Vec<_>>(),
            "candidates ranked"
        );
        ranked
    }
}
