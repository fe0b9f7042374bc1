//! Retry scheduler for enrichment attempts
//!
//! This module drives one bookmark through a bounded retry cycle:
//! - `Attempting(1)` starts immediately, with no initial delay
//! - A failed attempt below the limit is logged, then retried after a fixed backoff
//! - Success writes the `Completed` transition
//! - A failure on the last attempt writes the `Failed` transition
//!
//! HTTP status errors and transport errors consume attempts alike; a 404 is
//! retried just like a timeout.
//!
//! The decision for each attempt is a pure function ([`RetryPolicy::decide`]);
//! [`RetryScheduler`] only adds the executor call, the timer and the store write.

use crate::config::RetryConfig;
use crate::enrich::executor::{Executor, Outcome};
use crate::enrich::extractor::PageMetadata;
use crate::state::{AttemptState, EnrichmentAttempt};
use crate::storage::{StatusStore, StorageError, Transition};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Bounded-attempt, fixed-backoff retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per cycle, including the first
    pub max_attempts: u32,

    /// Delay between consecutive attempts (not exponential)
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(60),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(config.backoff_secs),
        }
    }
}

/// What to do after an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Write the metadata and stop
    Complete(PageMetadata),

    /// Wait, then run the next attempt
    RetryAfter(Duration),

    /// Out of attempts: record the failure and stop
    GiveUp { last_error: String },
}

impl RetryPolicy {
    /// Decides the next step after attempt number `attempt` (1-based)
    pub fn decide(&self, attempt: u32, outcome: &Outcome) -> Decision {
        match outcome {
            Outcome::Success(metadata) => Decision::Complete(metadata.clone()),
            Outcome::Failure { reason } if attempt >= self.max_attempts => Decision::GiveUp {
                last_error: reason.clone(),
            },
            Outcome::Failure { .. } => Decision::RetryAfter(self.backoff),
        }
    }

    /// Upper bound on a cycle's wall-clock time, given the fetch timeout
    ///
    /// Saturates at `Duration::MAX` for very large configured values.
    pub fn worst_case_duration(&self, fetch_timeout: Duration) -> Duration {
        fetch_timeout
            .checked_add(self.backoff)
            .and_then(|per_attempt| per_attempt.checked_mul(self.max_attempts))
            .unwrap_or(Duration::MAX)
    }
}

/// Runs enrichment cycles and writes their terminal outcome to the store
#[derive(Clone)]
pub struct RetryScheduler {
    executor: Executor,
    store: Arc<dyn StatusStore>,
    policy: RetryPolicy,
}

impl RetryScheduler {
    pub fn new(executor: Executor, store: Arc<dyn StatusStore>, policy: RetryPolicy) -> Self {
        Self {
            executor,
            store,
            policy,
        }
    }

    /// Starts a fresh cycle at attempt 1
    pub async fn run(
        &self,
        bookmark_id: Uuid,
        url: impl Into<String>,
    ) -> Result<AttemptState, StorageError> {
        self.run_cycle(EnrichmentAttempt::first(bookmark_id, url))
            .await
    }

    /// Drives `attempt` until the cycle reaches a terminal state
    ///
    /// Intermediate failures are only logged. The store is written once, when
    /// the cycle ends; an error from that write is returned to the caller.
    pub async fn run_cycle(
        &self,
        mut attempt: EnrichmentAttempt,
    ) -> Result<AttemptState, StorageError> {
        loop {
            tracing::debug!(
                bookmark_id = %attempt.bookmark_id,
                url = %attempt.url,
                state = %AttemptState::Attempting(attempt.attempt_number),
                "Starting enrichment attempt"
            );

            let outcome = self
                .executor
                .run(attempt.bookmark_id, &attempt.url)
                .await;

            match self.policy.decide(attempt.attempt_number, &outcome) {
                Decision::Complete(metadata) => {
                    self.store.apply_transition(
                        attempt.bookmark_id,
                        &Transition::Completed {
                            title: metadata.title,
                            description: metadata.description,
                            enriched_at: Utc::now(),
                        },
                    )?;

                    tracing::info!(
                        bookmark_id = %attempt.bookmark_id,
                        url = %attempt.url,
                        attempt = attempt.attempt_number,
                        "Bookmark metadata fetched successfully"
                    );
                    return Ok(AttemptState::Succeeded);
                }

                Decision::RetryAfter(delay) => {
                    if let Outcome::Failure { reason } = &outcome {
                        tracing::warn!(
                            bookmark_id = %attempt.bookmark_id,
                            url = %attempt.url,
                            attempt = attempt.attempt_number,
                            max_attempts = self.policy.max_attempts,
                            error = %reason,
                            "Enrichment attempt failed, retrying in {:?}",
                            delay
                        );
                    }

                    tokio::time::sleep(delay).await;
                    attempt = attempt.next();
                }

                Decision::GiveUp { last_error } => {
                    self.store.apply_transition(
                        attempt.bookmark_id,
                        &Transition::Failed {
                            last_error: last_error.clone(),
                        },
                    )?;

                    tracing::error!(
                        bookmark_id = %attempt.bookmark_id,
                        url = %attempt.url,
                        attempts = attempt.attempt_number,
                        error = %last_error,
                        "Bookmark metadata fetch failed after all retries"
                    );
                    return Ok(AttemptState::ExhaustedFailure);
                }
            }
        }
    }
}
