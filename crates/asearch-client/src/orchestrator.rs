//! Fetch orchestrator: owns the current result set and the search lifecycle.
//!
//! ```text
//!  Idle / Settled --issue--> Loading --settle(current ticket)--> Settled
//!                               |
//!                               +--issue (newer)--> Loading (older ticket now stale)
//! ```
//!
//! Every issued search gets a generation number. Only the ticket carrying
//! the latest generation can change the result set or the loading flag;
//! anything older that resolves later is discarded. Searches may overlap
//! freely on a single thread: issue returns a ticket, the caller awaits the
//! fetch however it likes, then hands the ticket back to
//! [`FetchOrchestrator::settle`].

use std::future::Future;

use asearch_core::{build_query, derive_values, DisplayResult, RegionCode, RequestDescriptor, SearchQuery};
use chrono::{DateTime, Utc};

use crate::error::ClientError;

/// Where raw search records come from.
///
/// Implemented by [`SearchClient`](crate::SearchClient); tests substitute
/// scripted backends.
pub trait SearchBackend {
    fn fetch(
        &self,
        request: &RequestDescriptor,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, ClientError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Nothing searched yet.
    Idle,
    /// The latest issued search has not resolved.
    Loading,
    /// The latest issued search resolved, successfully or not.
    Settled,
}

/// Handle for one issued search. Consumed by [`FetchOrchestrator::settle`].
#[derive(Debug)]
pub struct SearchTicket {
    generation: u64,
    request: RequestDescriptor,
}

impl SearchTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }
}

/// What [`FetchOrchestrator::settle`] did with a resolved fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Records were derived and installed as the current result set.
    Applied {
        generation: u64,
        results: usize,
        rejected: usize,
    },
    /// The fetch failed; the result set stays empty.
    Failed { generation: u64, message: String },
    /// A newer search was issued after this one; the outcome was discarded.
    Stale { generation: u64, latest: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query text was blank; nothing was fetched and nothing changed.
    NoQuery,
    Settled(Settlement),
}

#[derive(Debug)]
pub struct FetchOrchestrator {
    state: FetchState,
    latest_generation: u64,
    results: Vec<DisplayResult>,
    query: Option<SearchQuery>,
    last_error: Option<String>,
    settled_at: Option<DateTime<Utc>>,
}

impl Default for FetchOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FetchState::Idle,
            latest_generation: 0,
            results: Vec::new(),
            query: None,
            last_error: None,
            settled_at: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> FetchState {
        self.state
    }

    /// True exactly while the latest issued search is outstanding.
    #[must_use]
    pub fn results_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    /// The current result set, in API relevance order.
    #[must_use]
    pub fn results(&self) -> &[DisplayResult] {
        &self.results
    }

    /// The query of the latest issued search.
    #[must_use]
    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    /// Failure message of the latest search, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// Starts a new search.
    ///
    /// The previous result set is dropped immediately so stale rows are never
    /// shown while the new search is pending. Any ticket issued earlier
    /// becomes stale.
    pub fn issue(&mut self, request: RequestDescriptor) -> SearchTicket {
        self.latest_generation += 1;
        let generation = self.latest_generation;

        self.results = Vec::new();
        self.state = FetchState::Loading;
        self.last_error = None;
        self.query = Some(request.query().clone());

        tracing::debug!(generation, request = %request, "search issued");

        SearchTicket {
            generation,
            request,
        }
    }

    /// Applies the outcome of a fetch started by [`issue`](Self::issue).
    ///
    /// For the latest ticket the loading flag is cleared first, on success
    /// and failure alike. Results of an older ticket leave all state untouched.
    pub fn settle<E>(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<serde_json::Value>, E>,
    ) -> Settlement
    where
        E: std::fmt::Display,
    {
        let generation = ticket.generation;
        if generation != self.latest_generation || self.state != FetchState::Loading {
            tracing::debug!(
                generation,
                latest = self.latest_generation,
                "discarding result of superseded search"
            );
            return Settlement::Stale {
                generation,
                latest: self.latest_generation,
            };
        }

        self.state = FetchState::Settled;
        self.settled_at = Some(Utc::now());

        match outcome {
            Ok(records) => {
                let derived = derive_values(records);
                let rejected = derived.rejected.len();
                self.results = derived.results;
                tracing::info!(
                    generation,
                    query = %ticket.request.query().text,
                    region = %ticket.request.query().region,
                    results = self.results.len(),
                    rejected,
                    "search settled"
                );
                Settlement::Applied {
                    generation,
                    results: self.results.len(),
                    rejected,
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    generation,
                    query = %ticket.request.query().text,
                    error = %message,
                    "search failed"
                );
                self.last_error = Some(message.clone());
                Settlement::Failed {
                    generation,
                    message,
                }
            }
        }
    }

    /// Builds, issues, fetches and settles one search against `backend`.
    ///
    /// Blank `text` returns [`SearchOutcome::NoQuery`] without touching the
    /// backend or the current result set.
    pub async fn search<B: SearchBackend>(
        &mut self,
        backend: &B,
        text: &str,
        region: &RegionCode,
    ) -> SearchOutcome {
        let Some(request) = build_query(text, region) else {
            tracing::debug!("blank query, nothing to search");
            return SearchOutcome::NoQuery;
        };

        let ticket = self.issue(request);
        let outcome = backend.fetch(ticket.request()).await;
        SearchOutcome::Settled(self.settle(ticket, outcome))
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
