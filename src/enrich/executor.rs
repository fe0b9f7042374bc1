//! Single enrichment attempt: fetch the page, then extract its metadata

use crate::enrich::extractor::{extract_metadata, PageMetadata};
use crate::enrich::fetcher::PageFetcher;
use std::sync::Arc;
use uuid::Uuid;

/// Signature of the HTML metadata extractor
pub type ExtractFn = fn(&str) -> PageMetadata;

/// Result of one enrichment attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The page was fetched; either field may still be absent
    Success(PageMetadata),

    /// The page could not be fetched
    Failure { reason: String },
}

/// Runs one attempt of the pipeline without retrying or persisting anything
#[derive(Clone)]
pub struct Executor {
    fetcher: Arc<dyn PageFetcher>,
    extract: ExtractFn,
}

impl Executor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_extractor(fetcher, extract_metadata)
    }

    /// Uses a custom extractor in place of [`extract_metadata`]
    pub fn with_extractor(fetcher: Arc<dyn PageFetcher>, extract: ExtractFn) -> Self {
        Self { fetcher, extract }
    }

    /// Fetches `url` and extracts its metadata
    ///
    /// A fetch error short-circuits into `Outcome::Failure` and the extractor
    /// is never called. A fetched page always yields `Outcome::Success`, even
    /// when it carries no metadata at all.
    pub async fn run(&self, bookmark_id: Uuid, url: &str) -> Outcome {
        match self.fetcher.fetch(url).await {
            Ok(body) => {
                let metadata = (self.extract)(&body);
                tracing::debug!(
                    %bookmark_id,
                    url,
                    has_title = metadata.title.is_some(),
                    has_description = metadata.description.is_some(),
                    "Extracted page metadata"
                );
                Outcome::Success(metadata)
            }
            Err(e) => Outcome::Failure {
                reason: format!("Error fetching metadata: {}", e),
            },
        }
    }
}
