//! Encyclopedia lookup
//!
//! Wraps the summarization service behind [`SummaryProvider`] and normalizes
//! its outcomes into a tagged [`LookupResult`].

/// MediaWiki Action API provider
pub mod mediawiki;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::MAX_CANDIDATES;

pub use mediawiki::MediaWikiProvider;

/// Errors that can occur while asking the service for a summary
#[derive(Debug, Error)]
pub enum LookupError {
    /// The title matches several articles
    #[error("Ambiguous title, {} candidates", options.len())]
    Ambiguous {
        /// Candidate titles in the order the service returned them
        options: Vec<String>,
    },
    /// No article matches the title
    #[error("Article not found")]
    NotFound,
    /// Error during network communication
    #[error("Network error: {0}")]
    Network(String),
    /// Error returned by the service's API
    #[error("API error: {0}")]
    Api(String),
    /// Unexpected response shape
    #[error("JSON error: {0}")]
    Json(String),
    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

/// A summarized article as returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Resolved article title
    pub title: String,
    /// Plain-text summary
    pub summary: String,
    /// Canonical article URL
    pub url: String,
}

/// Interface for summarization services
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Summarize the article best matching `title`
    async fn summarize(
        &self,
        title: &str,
        language: &str,
        sentences: u32,
    ) -> Result<Article, LookupError>;
}

/// A trimmed, non-empty user query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Trims `raw`; returns `None` when nothing is left.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiki_lookup_bot::wiki::Query;
    ///
    /// assert_eq!(Query::parse("  Rust  ").map(|q| q.to_string()), Some("Rust".to_string()));
    /// assert!(Query::parse(" \n\t").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The query text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized outcome of a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// A single matching article
    Found {
        /// Summary text
        text: String,
        /// Article URL
        source_url: String,
    },
    /// Several matching articles
    Ambiguous {
        /// Up to [`MAX_CANDIDATES`] titles in service order
        candidate_titles: Vec<String>,
    },
    /// Nothing matches
    NotFound,
    /// The service failed; not retried
    TransientError,
}

/// Looks up summaries with a fixed language and sentence count
#[derive(Clone)]
pub struct LookupClient {
    provider: Arc<dyn SummaryProvider>,
    language: String,
    sentences: u32,
}

impl LookupClient {
    /// Create a new lookup client
    #[must_use]
    pub fn new(provider: Arc<dyn SummaryProvider>, language: &str, sentences: u32) -> Self {
        Self {
            provider,
            language: language.to_string(),
            sentences,
        }
    }

    /// Sentence count requested from the provider
    #[must_use]
    pub const fn sentences(&self) -> u32 {
        self.sentences
    }

    /// Parse raw user text and look it up.
    ///
    /// Returns `None` without calling the provider when the text trims to
    /// empty; such input gets no reply at all.
    pub async fn lookup_text(&self, raw: &str) -> Option<(Query, LookupResult)> {
        let query = Query::parse(raw)?;
        let result = self.lookup(&query).await;
        Some((query, result))
    }

    /// Look up `query` and normalize the outcome.
    ///
    /// Failures are logged here; `NotFound` and `TransientError` look the same
    /// to the user, so this is the only place they are told apart.
    #[instrument(skip(self), fields(language = %self.language, sentences = self.sentences))]
    pub async fn lookup(&self, query: &Query) -> LookupResult {
        match self
            .provider
            .summarize(query.as_str(), &self.language, self.sentences)
            .await
        {
            Ok(article) => {
                info!("Found article '{}' for query '{}'", article.title, query);
                LookupResult::Found {
                    text: article.summary,
                    source_url: article.url,
                }
            }
            Err(LookupError::Ambiguous { mut options }) => {
                info!(
                    "Query '{}' is ambiguous ({} candidates)",
                    query,
                    options.len()
                );
                options.truncate(MAX_CANDIDATES);
                LookupResult::Ambiguous {
                    candidate_titles: options,
                }
            }
            Err(LookupError::NotFound) => {
                info!("No article found for query '{}'", query);
                LookupResult::NotFound
            }
            Err(e) => {
                error!("Lookup failed for query '{}': {}", query, e);
                LookupResult::TransientError
            }
        }
    }
}
