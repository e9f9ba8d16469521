use crate::bot::views::{
    chunk_text, help_text, more_keyboard, start_text, to_inline_result, ARTICLE_FINISHED_NOTICE,
    NO_ACTIVE_ARTICLE_NOTICE,
};
use crate::bot::Lookups;
use crate::config::Settings;
use crate::pagination::{Chunk, PaginationError, PaginationStore};
use crate::utils::user_label;
use crate::wiki::{LookupResult, Query};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{ChatAction, InlineQuery, Me},
    utils::command::BotCommands,
};
use tracing::{info, warn};

// Helper function to get user name from Message
fn get_user_name(msg: &Message) -> String {
    msg.from.as_ref().map_or_else(
        || "Unknown".to_string(),
        |user| user_label(user.username.as_deref(), &user.first_name),
    )
}

/// Telegram id of the message author, if any.
#[must_use]
pub fn get_user_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|u| u.id.0)
}

/// Plain text that is not a command.
#[must_use]
pub fn is_free_text(msg: &Message) -> bool {
    msg.text().is_some_and(|text| !text.starts_with('/'))
}

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Поддерживаемые команды:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Начать работу с ботом.")]
    Start,
    /// Show usage help
    #[command(description = "Как пользоваться ботом.")]
    Help,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message, me: Me) -> Result<()> {
    info!("User {} initiated /start command.", get_user_name(&msg));
    bot.send_message(msg.chat.id, start_text(me.username()))
        .await?;
    Ok(())
}

/// Help handler
///
/// # Errors
///
/// Returns an error if the help message cannot be sent.
pub async fn help(bot: Bot, msg: Message, me: Me) -> Result<()> {
    bot.send_message(msg.chat.id, help_text(me.username()))
        .await?;
    Ok(())
}

/// Inline query handler: one article result per query.
///
/// Empty queries are ignored without an answer.
///
/// # Errors
///
/// Returns an error if the answer cannot be sent.
pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    lookups: Arc<Lookups>,
    settings: Arc<Settings>,
) -> Result<()> {
    let Some((query, result)) = lookups.inline.lookup_text(&q.query).await else {
        return Ok(());
    };

    info!("Inline search from user {}: {}", q.from.id.0, query);

    let article = lookups.formatter.inline_article(&result, &query);

    bot.answer_inline_query(q.id.clone(), vec![to_inline_result(article)])
        .cache_time(settings.inline_cache_time_secs)
        .await?;
    Ok(())
}

/// Free-text handler: looks the text up and starts paginated reading.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn handle_text(
    bot: Bot,
    msg: Message,
    lookups: Arc<Lookups>,
    sessions: Arc<PaginationStore>,
) -> Result<()> {
    let Some(user_id) = get_user_id(&msg) else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }

    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

    let Some((query, result)) = lookups.paged.lookup_text(text).await else {
        return Ok(());
    };
    info!(
        "Search from user {} ({}): {}",
        user_id,
        get_user_name(&msg),
        query
    );

    match result {
        LookupResult::Found { text, .. } => {
            sessions.store_article(user_id, text).await;
            let chunk = sessions.deliver_next_chunk(user_id).await?;
            send_chunk(&bot, msg.chat.id, Some(&query), &chunk).await?;
        }
        LookupResult::Ambiguous { .. } | LookupResult::NotFound | LookupResult::TransientError => {
            let payload = lookups.formatter.format(&result, &query);
            bot.send_message(msg.chat.id, payload.text).await?;
        }
    }
    Ok(())
}

/// "more" button handler: sends the next chunk of the user's article.
///
/// # Errors
///
/// Returns an error if the callback answer or the reply cannot be sent.
pub async fn handle_more(
    bot: Bot,
    q: CallbackQuery,
    sessions: Arc<PaginationStore>,
) -> Result<()> {
    let user_id = q.from.id.0;
    let chat_id = q
        .message
        .as_ref()
        .map_or_else(|| ChatId::from(q.from.id), |message| message.chat().id);

    // The button has served its purpose on the message it was attached to
    if let Some(message) = &q.message {
        if let Err(e) = bot
            .edit_message_reply_markup(message.chat().id, message.id())
            .await
        {
            warn!("Failed to remove 'more' button for user {}: {}", user_id, e);
        }
    }

    match sessions.deliver_next_chunk(user_id).await {
        Ok(chunk) if chunk.text.is_empty() => {
            bot.answer_callback_query(q.id.clone())
                .text(ARTICLE_FINISHED_NOTICE)
                .await?;
        }
        Ok(chunk) => {
            bot.answer_callback_query(q.id.clone()).await?;
            send_chunk(&bot, chat_id, None, &chunk).await?;
        }
        Err(PaginationError::NoActiveArticle(_)) => {
            info!("User {} pressed 'more' without an active article.", user_id);
            bot.answer_callback_query(q.id.clone()).await?;
            bot.send_message(chat_id, NO_ACTIVE_ARTICLE_NOTICE).await?;
        }
    }
    Ok(())
}

async fn send_chunk(
    bot: &Bot,
    chat_id: ChatId,
    query: Option<&Query>,
    chunk: &Chunk,
) -> Result<()> {
    let header = query.filter(|_| chunk.is_first);
    let request = bot.send_message(chat_id, chunk_text(header, &chunk.text));
    if chunk.has_more {
        request.reply_markup(more_keyboard()).await?;
    } else {
        request.await?;
    }
    Ok(())
}
