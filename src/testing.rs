//! Testing helpers and mock utilities.
//!
//! Provides convenient constructors for mocked summary providers.

use crate::wiki::{Article, LookupError, MockSummaryProvider};

/// Create a mock provider that returns the same article for every call.
///
/// # Example
///
/// ```rust,ignore
/// use wiki_lookup_bot::testing::mock_provider_article;
///
/// let provider = mock_provider_article("Rust", "Rust is a language.", "https://w/Rust");
/// ```
#[must_use]
pub fn mock_provider_article(
    title: &'static str,
    summary: &'static str,
    url: &'static str,
) -> MockSummaryProvider {
    let mut mock = MockSummaryProvider::new();
    mock.expect_summarize().returning(move |_, _, _| {
        Ok(Article {
            title: title.to_string(),
            summary: summary.to_string(),
            url: url.to_string(),
        })
    });
    mock
}

/// Create a mock provider that fails every call with the error built by `make`.
#[must_use]
pub fn mock_provider_error<F>(make: F) -> MockSummaryProvider
where
    F: Fn() -> LookupError + Send + Sync + 'static,
{
    let mut mock = MockSummaryProvider::new();
    mock.expect_summarize().returning(move |_, _, _| Err(make()));
    mock
}

/// Create a mock provider that must never be called.
#[must_use]
pub fn mock_provider_unused() -> MockSummaryProvider {
    let mut mock = MockSummaryProvider::new();
    mock.expect_summarize().never();
    mock
}
