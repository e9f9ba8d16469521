//! View layer for bot replies
//!
//! Turns lookup results into the texts, inline results and keyboards that
//! are sent back to Telegram.

use sha2::{Digest, Sha256};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle,
    InputMessageContent, InputMessageContentText,
};

use crate::config::INLINE_DESCRIPTION_LIMIT;
use crate::utils::truncate_str;
use crate::wiki::{LookupResult, Query};

/// Callback data carried by the "more" button
pub const MORE_CALLBACK: &str = "more";

/// Header of the disambiguation reply
pub const AMBIGUOUS_NOTICE: &str = "❗ Запрос неоднозначен. Возможные варианты:";
/// Shown for both "not found" and lookup failures
pub const NOT_FOUND_NOTICE: &str = "❌ Не удалось найти статью в Википедии.";
/// Reply to "more" when there is nothing to continue
pub const NO_ACTIVE_ARTICLE_NOTICE: &str =
    "Нет активной статьи. Отправьте запрос, чтобы начать чтение.";
/// Callback toast once the article has been read to the end
pub const ARTICLE_FINISHED_NOTICE: &str = "Статья закончилась.";

/// Plain-text reply built from a lookup result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPayload {
    /// Message text
    pub text: String,
}

/// One inline-query answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArticle {
    /// Stable id derived from the query
    pub id: String,
    /// Result title shown in the picker
    pub title: String,
    /// Message sent when the result is chosen
    pub text: String,
    /// Short description shown in the picker
    pub description: String,
}

/// Builds reply payloads
#[derive(Debug, Clone, Copy)]
pub struct ResponseFormatter {
    include_source_link: bool,
}

impl ResponseFormatter {
    /// Create a formatter; `include_source_link` appends the article URL
    #[must_use]
    pub const fn new(include_source_link: bool) -> Self {
        Self {
            include_source_link,
        }
    }

    /// Format a lookup result for a direct reply.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiki_lookup_bot::bot::views::ResponseFormatter;
    /// use wiki_lookup_bot::wiki::{LookupResult, Query};
    ///
    /// let query = Query::parse("Rust").expect("query");
    /// let result = LookupResult::Found {
    ///     text: "A language.".to_string(),
    ///     source_url: "https://en.wikipedia.org/wiki/Rust".to_string(),
    /// };
    /// let payload = ResponseFormatter::new(false).format(&result, &query);
    /// assert_eq!(payload.text, "Rust\n\nA language.");
    /// ```
    #[must_use]
    pub fn format(&self, result: &LookupResult, query: &Query) -> DisplayPayload {
        let text = match result {
            LookupResult::Found { text, source_url } => {
                let mut body = found_text(query, text);
                if self.include_source_link {
                    body.push_str("\n\n🔗 ");
                    body.push_str(source_url);
                }
                body
            }
            LookupResult::Ambiguous { candidate_titles } => ambiguous_text(candidate_titles),
            LookupResult::NotFound | LookupResult::TransientError => NOT_FOUND_NOTICE.to_string(),
        };
        DisplayPayload { text }
    }

    /// Format a lookup result as an inline-query article
    #[must_use]
    pub fn inline_article(&self, result: &LookupResult, query: &Query) -> InlineArticle {
        let payload = self.format(result, query);
        let description_source = match result {
            LookupResult::Found { text, .. } => text.as_str(),
            _ => payload.text.as_str(),
        };

        InlineArticle {
            id: inline_result_id(query),
            title: format!("Результат: {query}"),
            description: describe(description_source),
            text: payload.text,
        }
    }
}

/// `"{query}\n\n{summary}"`
#[must_use]
pub fn found_text(query: &Query, summary: &str) -> String {
    format!("{query}\n\n{summary}")
}

fn ambiguous_text(candidates: &[String]) -> String {
    let mut text = AMBIGUOUS_NOTICE.to_string();
    for candidate in candidates {
        text.push('\n');
        text.push_str(candidate);
    }
    text
}

fn describe(text: &str) -> String {
    if text.chars().count() > INLINE_DESCRIPTION_LIMIT {
        format!("{}...", truncate_str(text, INLINE_DESCRIPTION_LIMIT))
    } else {
        text.to_string()
    }
}

/// Lowercase hex SHA-256 of the query text.
///
/// Identical queries map to the same id, so Telegram's result cache does not
/// show duplicates.
#[must_use]
pub fn inline_result_id(query: &Query) -> String {
    Sha256::digest(query.as_str().as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Convert an [`InlineArticle`] to the Telegram result type
#[must_use]
pub fn to_inline_result(article: InlineArticle) -> InlineQueryResult {
    let content = InputMessageContent::Text(InputMessageContentText::new(article.text));
    InlineQueryResult::Article(
        InlineQueryResultArticle::new(article.id, article.title, content)
            .description(article.description),
    )
}

/// Keyboard with the single "more" button
#[must_use]
pub fn more_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Читать дальше ▶️",
        MORE_CALLBACK,
    )]])
}

/// Text of a paginated message; the first chunk carries the query header
#[must_use]
pub fn chunk_text(query: Option<&Query>, chunk: &str) -> String {
    match query {
        Some(query) => found_text(query, chunk),
        None => chunk.to_string(),
    }
}

/// Welcome text for `/start`
#[must_use]
pub fn start_text(bot_username: &str) -> String {
    format!(
        "👋 Привет! Я бот для поиска в Википедии.\n\n\
         Отправьте мне название статьи, и я пришлю её краткое содержание.\n\
         Также можно написать в любом чате:\n\
         @{bot_username} [ваш запрос]"
    )
}

/// Help text for `/help`
#[must_use]
pub fn help_text(bot_username: &str) -> String {
    format!(
        "Напишите: @{bot_username} [ваш запрос], и я покажу краткое содержание статьи.\n\
         В личных сообщениях длинные статьи приходят частями: нажмите «Читать дальше», \
         чтобы получить продолжение."
    )
}
