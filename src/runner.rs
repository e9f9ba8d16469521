use crate::bot::handlers::{self, is_free_text, Command};
use crate::bot::views::MORE_CALLBACK;
use crate::bot::Lookups;
use crate::config::Settings;
use crate::pagination::PaginationStore;
use crate::wiki::MediaWikiProvider;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineQuery, Me};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

/// Run the Telegram bot until Ctrl-C.
pub async fn run_bot(settings: Arc<Settings>) {
    let provider = Arc::new(MediaWikiProvider::new(&settings));
    let lookups = Arc::new(Lookups::new(provider, &settings));
    info!(
        "Lookup clients initialized (language: {}, endpoint: {}).",
        settings.wiki_language,
        settings.wiki_endpoint()
    );

    let sessions = init_sessions(&settings);

    let bot = Bot::new(settings.telegram_token.clone());
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![lookups, sessions, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_sessions(settings: &Settings) -> Arc<PaginationStore> {
    info!(
        "Initializing PaginationStore (idle ttl: {}s, max_size: {})",
        settings.session_ttl_secs, settings.session_max_size
    );

    Arc::new(PaginationStore::new(
        settings.session_ttl_secs,
        settings.session_max_size,
    ))
}

/// Build the update routing tree.
#[must_use]
pub fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_inline_query().endpoint(handle_inline_query))
        .branch(
            Update::filter_callback_query()
                .branch(
                    dptree::filter(|q: CallbackQuery| q.data.as_deref() == Some(MORE_CALLBACK))
                        .endpoint(handle_more_callback),
                )
                .branch(dptree::endpoint(handle_unknown_callback)),
        )
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::filter(|msg: Message| is_free_text(&msg)).endpoint(handle_text)),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    me: Me,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg, me).await,
        Command::Help => handlers::help(bot, msg, me).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    lookups: Arc<Lookups>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_inline_query(bot, q, lookups, settings).await {
        error!("Inline query handler error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    lookups: Arc<Lookups>,
    sessions: Arc<PaginationStore>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, lookups, sessions).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_more_callback(
    bot: Bot,
    q: CallbackQuery,
    sessions: Arc<PaginationStore>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_more(bot, q, sessions).await {
        error!("More callback handler error: {}", e);
    }
    respond(())
}

async fn handle_unknown_callback(
    bot: Bot,
    q: CallbackQuery,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error!("Failed to answer unknown callback: {}", e);
    }
    respond(())
}
