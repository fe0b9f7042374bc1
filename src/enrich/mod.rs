//! Background metadata enrichment
//!
//! A bookmark is enriched by a retry cycle:
//! - [`fetcher`] downloads the page
//! - [`extractor`] pulls the title and description out of the HTML
//! - [`executor`] runs one fetch-then-extract attempt
//! - [`scheduler`] retries failed attempts and writes the final outcome
//! - [`queue`] accepts jobs and runs one cycle per bookmark concurrently

pub mod executor;
pub mod extractor;
pub mod fetcher;
pub mod queue;
pub mod scheduler;

pub use executor::{Executor, Outcome};
pub use extractor::{extract_metadata, PageMetadata};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use queue::{start, EnrichmentJob, EnrichmentQueue, WorkerHandle, WorkerStats};
pub use scheduler::{Decision, RetryPolicy, RetryScheduler};
