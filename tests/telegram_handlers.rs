//! Handler behaviour against a fake Bot API served by wiremock.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use teloxide::prelude::*;
use wiki_lookup_bot::bot::handlers::{handle_more, handle_text};
use wiki_lookup_bot::bot::views::{
    AMBIGUOUS_NOTICE, ARTICLE_FINISHED_NOTICE, MORE_CALLBACK, NO_ACTIVE_ARTICLE_NOTICE,
};
use wiki_lookup_bot::bot::Lookups;
use wiki_lookup_bot::config::Settings;
use wiki_lookup_bot::pagination::{PaginationError, PaginationStore};
use wiki_lookup_bot::wiki::{Article, LookupError, SummaryProvider};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: u64 = 42;

fn test_settings() -> Settings {
    Settings {
        telegram_token: "123456789:TEST".to_string(),
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

/// Answers every lookup with the same summary.
struct ArticleProvider(String);

#[async_trait]
impl SummaryProvider for ArticleProvider {
    async fn summarize(&self, title: &str, _: &str, _: u32) -> Result<Article, LookupError> {
        Ok(Article {
            title: title.to_string(),
            summary: self.0.clone(),
            url: format!("https://ru.wikipedia.org/wiki/{title}"),
        })
    }
}

/// Reports every lookup as a disambiguation page.
struct AmbiguousProvider(Vec<String>);

#[async_trait]
impl SummaryProvider for AmbiguousProvider {
    async fn summarize(&self, _: &str, _: &str, _: u32) -> Result<Article, LookupError> {
        Err(LookupError::Ambiguous {
            options: self.0.clone(),
        })
    }
}

fn chat() -> Value {
    json!({"id": USER_ID, "type": "private", "first_name": "Иван"})
}

fn user() -> Value {
    json!({"id": USER_ID, "is_bot": false, "first_name": "Иван", "username": "ivan"})
}

fn bot_message(message_id: i32, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": chat(),
        "from": {"id": 1, "is_bot": true, "first_name": "Wiki", "username": "wiki_bot"},
        "text": text
    })
}

fn user_message(text: &str) -> Message {
    serde_json::from_value(json!({
        "message_id": 7,
        "date": 1_700_000_000,
        "chat": chat(),
        "from": user(),
        "text": text
    }))
    .expect("valid message")
}

fn more_press() -> CallbackQuery {
    serde_json::from_value(json!({
        "id": "cb-1",
        "from": user(),
        "chat_instance": "instance",
        "data": MORE_CALLBACK,
        "message": bot_message(10, "previous chunk")
    }))
    .expect("valid callback query")
}

/// Fake Bot API accepting every method the handlers use.
async fn fake_bot_api() -> (MockServer, Bot) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"(?i)/sendmessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": bot_message(11, "sent")
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"(?i)/editmessagereplymarkup$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": bot_message(10, "previous chunk")
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"(?i)/(answercallbackquery|sendchataction)$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
        )
        .mount(&server)
        .await;

    let url = reqwest::Url::parse(&server.uri()).expect("mock server url");
    let bot = Bot::new("123456789:TEST").set_api_url(url);
    (server, bot)
}

/// JSON bodies of every request sent to `api_method`, in order.
async fn sent(server: &MockServer, api_method: &str) -> Vec<Value> {
    let suffix = format!("/{}", api_method.to_lowercase());
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path().to_lowercase().ends_with(&suffix))
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}

fn more_button(body: &Value) -> Option<&Value> {
    body.get("reply_markup")
        .and_then(|markup| markup.pointer("/inline_keyboard/0/0/callback_data"))
}

#[tokio::test]
async fn found_article_sends_first_chunk_with_header_and_button() {
    let (server, bot) = fake_bot_api().await;
    let lookups = Arc::new(Lookups::new(
        Arc::new(ArticleProvider("Ж".repeat(2500))),
        &test_settings(),
    ));
    let sessions = Arc::new(PaginationStore::new(60, 100));

    handle_text(bot, user_message("  Пушкин "), lookups, sessions.clone())
        .await
        .expect("handler");

    let messages = sent(&server, "sendMessage").await;
    assert_eq!(messages.len(), 1);
    let text = messages[0]["text"].as_str().expect("text");
    assert_eq!(text, format!("Пушкин\n\n{}", "Ж".repeat(1000)));
    assert_eq!(messages[0]["chat_id"], json!(USER_ID));
    assert_eq!(more_button(&messages[0]), Some(&json!(MORE_CALLBACK)));

    let next = sessions.deliver_next_chunk(USER_ID).await.expect("stored");
    assert!(!next.is_first);
    assert_eq!(next.text.chars().count(), 1000);
}

#[tokio::test]
async fn short_article_has_no_more_button() {
    let (server, bot) = fake_bot_api().await;
    let lookups = Arc::new(Lookups::new(
        Arc::new(ArticleProvider("Короткая статья.".to_string())),
        &test_settings(),
    ));
    let sessions = Arc::new(PaginationStore::new(60, 100));

    handle_text(bot, user_message("Пушкин"), lookups, sessions)
        .await
        .expect("handler");

    let messages = sent(&server, "sendMessage").await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], json!("Пушкин\n\nКороткая статья."));
    assert!(messages[0].get("reply_markup").is_none());
}

#[tokio::test]
async fn ambiguous_query_lists_candidates_and_stores_nothing() {
    let (server, bot) = fake_bot_api().await;
    let options: Vec<String> = (1..=7).map(|i| format!("Меркурий ({i})")).collect();
    let lookups = Arc::new(Lookups::new(
        Arc::new(AmbiguousProvider(options)),
        &test_settings(),
    ));
    let sessions = Arc::new(PaginationStore::new(60, 100));

    handle_text(bot, user_message("Меркурий"), lookups, sessions.clone())
        .await
        .expect("handler");

    let messages = sent(&server, "sendMessage").await;
    assert_eq!(messages.len(), 1);
    let text = messages[0]["text"].as_str().expect("text");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(AMBIGUOUS_NOTICE));
    assert_eq!(lines.count(), 5);
    assert!(messages[0].get("reply_markup").is_none());

    assert_eq!(
        sessions.deliver_next_chunk(USER_ID).await,
        Err(PaginationError::NoActiveArticle(USER_ID))
    );
}

#[tokio::test]
async fn more_continues_without_header_until_the_last_chunk() {
    let (server, bot) = fake_bot_api().await;
    let sessions = Arc::new(PaginationStore::new(60, 100));
    sessions.store_article(USER_ID, "Ж".repeat(2500)).await;
    let _ = sessions.deliver_next_chunk(USER_ID).await;

    handle_more(bot.clone(), more_press(), sessions.clone())
        .await
        .expect("second chunk");
    handle_more(bot, more_press(), sessions)
        .await
        .expect("third chunk");

    let messages = sent(&server, "sendMessage").await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["text"], json!("Ж".repeat(1000)));
    assert_eq!(more_button(&messages[0]), Some(&json!(MORE_CALLBACK)));
    assert_eq!(messages[1]["text"], json!("Ж".repeat(500)));
    assert!(messages[1].get("reply_markup").is_none());

    let answers = sent(&server, "answerCallbackQuery").await;
    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|body| body.get("text").is_none()));

    // The pressed button is removed each time
    assert_eq!(sent(&server, "editMessageReplyMarkup").await.len(), 2);
}

#[tokio::test]
async fn more_after_the_end_shows_toast_and_sends_nothing() {
    let (server, bot) = fake_bot_api().await;
    let sessions = Arc::new(PaginationStore::new(60, 100));
    sessions.store_article(USER_ID, "Короткая статья.".to_string()).await;
    let _ = sessions.deliver_next_chunk(USER_ID).await;

    handle_more(bot, more_press(), sessions)
        .await
        .expect("handler");

    assert!(sent(&server, "sendMessage").await.is_empty());
    let answers = sent(&server, "answerCallbackQuery").await;
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0]["callback_query_id"], json!("cb-1"));
    assert_eq!(answers[0]["text"], json!(ARTICLE_FINISHED_NOTICE));
}

#[tokio::test]
async fn more_without_article_sends_neutral_notice() {
    let (server, bot) = fake_bot_api().await;
    let sessions = Arc::new(PaginationStore::new(60, 100));

    handle_more(bot, more_press(), sessions)
        .await
        .expect("handler");

    let answers = sent(&server, "answerCallbackQuery").await;
    assert_eq!(answers.len(), 1);
    assert!(answers[0].get("text").is_none());

    let messages = sent(&server, "sendMessage").await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], json!(NO_ACTIVE_ARTICLE_NOTICE));
    assert_eq!(messages[0]["chat_id"], json!(USER_ID));
}

#[tokio::test]
async fn blank_text_sends_nothing() {
    let (server, bot) = fake_bot_api().await;
    let lookups = Arc::new(Lookups::new(
        Arc::new(ArticleProvider("unused".to_string())),
        &test_settings(),
    ));
    let sessions = Arc::new(PaginationStore::new(60, 100));

    handle_text(bot, user_message("   "), lookups, sessions)
        .await
        .expect("handler");

    assert!(server
        .received_requests()
        .await
        .unwrap_or_default()
        .is_empty());
}
