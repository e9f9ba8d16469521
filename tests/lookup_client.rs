use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiki_lookup_bot::bot::Lookups;
use wiki_lookup_bot::config::Settings;
use wiki_lookup_bot::pagination::PaginationStore;
use wiki_lookup_bot::wiki::{Article, LookupError, LookupResult, SummaryProvider};

fn test_settings() -> Settings {
    Settings {
        telegram_token: "dummy".to_string(),
        wiki_language: "ru".to_string(),
        wiki_api_endpoint: "http://127.0.0.1:9/w/api.php".to_string(),
        wiki_user_agent: "wiki-lookup-bot-tests".to_string(),
        wiki_http_timeout_secs: 1,
        inline_summary_sentences: 3,
        paged_summary_sentences: 5,
        include_source_link: true,
        inline_cache_time_secs: 0,
        session_ttl_secs: 60,
        session_max_size: 100,
    }
}

/// Records every call and answers with a summary sized by the sentence count.
#[derive(Default)]
struct RecordingProvider {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String, u32)>>,
}

#[async_trait]
impl SummaryProvider for RecordingProvider {
    async fn summarize(
        &self,
        title: &str,
        language: &str,
        sentences: u32,
    ) -> Result<Article, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((title.to_string(), language.to_string(), sentences));
        }
        Ok(Article {
            title: title.to_string(),
            summary: "Ж".repeat(500 * sentences as usize),
            url: format!("https://{language}.wikipedia.org/wiki/{title}"),
        })
    }
}

struct FailingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl SummaryProvider for FailingProvider {
    async fn summarize(&self, _: &str, _: &str, _: u32) -> Result<Article, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LookupError::Network("connection refused".to_string()))
    }
}

#[tokio::test]
async fn inline_and_paged_modes_request_their_own_sentence_counts() {
    let provider = Arc::new(RecordingProvider::default());
    let lookups = Lookups::new(provider.clone(), &test_settings());

    let _ = lookups.inline.lookup_text("Москва").await;
    let _ = lookups.paged.lookup_text("  Москва  ").await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    let seen = provider.seen.lock().expect("lock").clone();
    assert_eq!(
        seen,
        vec![
            ("Москва".to_string(), "ru".to_string(), 3),
            ("Москва".to_string(), "ru".to_string(), 5),
        ]
    );
}

#[tokio::test]
async fn blank_text_is_never_looked_up() {
    let provider = Arc::new(RecordingProvider::default());
    let lookups = Lookups::new(provider.clone(), &test_settings());

    for raw in ["", "   ", "\n\t"] {
        assert!(lookups.inline.lookup_text(raw).await.is_none());
        assert!(lookups.paged.lookup_text(raw).await.is_none());
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transient_failure_shows_the_not_found_notice() {
    let provider = Arc::new(FailingProvider {
        calls: AtomicUsize::new(0),
    });
    let lookups = Lookups::new(provider.clone(), &test_settings());

    let (query, result) = lookups
        .paged
        .lookup_text("Rust")
        .await
        .expect("non-blank query");
    assert_eq!(result, LookupResult::TransientError);
    // No retries
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let transient = lookups.formatter.format(&result, &query);
    let not_found = lookups.formatter.format(&LookupResult::NotFound, &query);
    assert_eq!(transient, not_found);
}

#[tokio::test]
async fn paged_lookup_feeds_pagination() {
    let lookups = Lookups::new(Arc::new(RecordingProvider::default()), &test_settings());
    let sessions = PaginationStore::new(60, 100);

    let (_, result) = lookups
        .paged
        .lookup_text("Пушкин")
        .await
        .expect("non-blank query");
    let LookupResult::Found { text, source_url } = result else {
        panic!("expected a found article");
    };
    assert_eq!(text.chars().count(), 2500);
    assert!(source_url.ends_with("/wiki/Пушкин"));

    sessions.store_article(7, text).await;
    let mut deliveries = 0;
    loop {
        let chunk = sessions.deliver_next_chunk(7).await.expect("chunk");
        deliveries += 1;
        if !chunk.has_more {
            break;
        }
    }
    assert_eq!(deliveries, 3);
}
