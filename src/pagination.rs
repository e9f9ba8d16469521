//! Per-user reading cursors for paginated articles
//!
//! Each user holds at most one cursor over the last article they looked up.
//! Cursors live in a bounded cache with idle expiry, and every cursor sits
//! behind its own async mutex so concurrent "more" presses from one user are
//! served one after another.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::CHUNK_SIZE;

/// Errors returned by [`PaginationStore`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    /// The user has no stored article (never looked one up, or it expired)
    #[error("No active article for user {0}")]
    NoActiveArticle(u64),
}

/// One slice of an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The slice text; empty once the article is exhausted
    pub text: String,
    /// Whether this slice starts the article
    pub is_first: bool,
    /// Whether a "more" button should be attached
    pub has_more: bool,
}

/// Reading position inside one article.
///
/// `offset` is a byte index that always lies on a `char` boundary, with
/// `0 <= offset <= full_text.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingCursor {
    full_text: String,
    offset: usize,
}

impl ReadingCursor {
    /// Start reading `full_text` from the beginning
    #[must_use]
    pub const fn new(full_text: String) -> Self {
        Self {
            full_text,
            offset: 0,
        }
    }

    /// Current byte offset
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The article text
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Whether every chunk has been emitted
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.offset == self.full_text.len()
    }

    /// Emit up to `chunk_size` chars from the current offset.
    ///
    /// A `chunk_size` of zero is treated as one.
    ///
    /// The last chunk leaves the cursor at the end of the text; from then on
    /// every call yields an empty chunk without "more".
    ///
    /// # Examples
    ///
    /// ```
    /// use wiki_lookup_bot::pagination::ReadingCursor;
    ///
    /// let mut cursor = ReadingCursor::new("abcde".to_string());
    /// let first = cursor.next_chunk(2);
    /// assert_eq!(first.text, "ab");
    /// assert!(first.has_more);
    /// ```
    pub fn next_chunk(&mut self, chunk_size: usize) -> Chunk {
        let chunk_size = chunk_size.max(1);
        let rest = &self.full_text[self.offset..];
        let chunk_len = rest
            .char_indices()
            .nth(chunk_size)
            .map_or(rest.len(), |(pos, _)| pos);
        let chunk_end = self.offset + chunk_len;

        let chunk = Chunk {
            text: rest[..chunk_len].to_string(),
            is_first: self.offset == 0,
            has_more: chunk_end < self.full_text.len(),
        };
        if chunk.has_more {
            self.offset = chunk_end;
        } else {
            self.offset = self.full_text.len();
        }
        chunk
    }
}

/// Bounded store of reading cursors keyed by user id
#[derive(Clone)]
pub struct PaginationStore {
    cache: Cache<u64, Arc<Mutex<ReadingCursor>>>,
    chunk_size: usize,
}

impl PaginationStore {
    /// Creates a new `PaginationStore`
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - Idle time after which a cursor is dropped
    /// * `max_capacity` - Maximum number of cursors kept
    ///
    /// # Examples
    ///
    /// ```
    /// use wiki_lookup_bot::pagination::PaginationStore;
    ///
    /// let store = PaginationStore::new(
    ///     86_400, // 24 hours idle
    ///     10_000, // max 10k readers
    /// );
    /// ```
    #[must_use]
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        Self::with_chunk_size(ttl_secs, max_capacity, CHUNK_SIZE)
    }

    /// Same as [`PaginationStore::new`] with an explicit chunk size
    #[must_use]
    pub fn with_chunk_size(ttl_secs: u64, max_capacity: u64, chunk_size: usize) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Replace the user's cursor with a fresh one over `full_text`
    pub async fn store_article(&self, user_id: u64, full_text: String) {
        debug!(
            "Storing article for user {} ({} chars)",
            user_id,
            full_text.chars().count()
        );
        self.cache
            .insert(user_id, Arc::new(Mutex::new(ReadingCursor::new(full_text))))
            .await;
    }

    /// Emit the next chunk of the user's article.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::NoActiveArticle`] if the user has no cursor.
    pub async fn deliver_next_chunk(&self, user_id: u64) -> Result<Chunk, PaginationError> {
        let cursor = self
            .cache
            .get(&user_id)
            .await
            .ok_or(PaginationError::NoActiveArticle(user_id))?;

        let mut cursor = cursor.lock().await;
        let chunk = cursor.next_chunk(self.chunk_size);
        debug!(
            "Delivered chunk to user {} (offset {}, more: {})",
            user_id,
            cursor.offset(),
            chunk.has_more
        );
        Ok(chunk)
    }

    /// Returns the current number of stored cursors
    ///
    /// Useful for monitoring.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Run pending cache maintenance (eviction, counters)
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}
