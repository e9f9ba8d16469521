/// Command, message, inline and callback handlers
pub mod handlers;
/// Reply formatting and keyboards
pub mod views;

use std::sync::Arc;

use crate::config::Settings;
use crate::wiki::{LookupClient, SummaryProvider};
use views::ResponseFormatter;

/// Lookup clients for each reply mode, shared by the handlers
pub struct Lookups {
    /// Used for inline queries
    pub inline: LookupClient,
    /// Used for paginated direct messages
    pub paged: LookupClient,
    /// Reply formatter
    pub formatter: ResponseFormatter,
}

impl Lookups {
    /// Build both lookup clients over one provider
    #[must_use]
    pub fn new(provider: Arc<dyn SummaryProvider>, settings: &Settings) -> Self {
        Self {
            inline: LookupClient::new(
                provider.clone(),
                &settings.wiki_language,
                settings.inline_summary_sentences,
            ),
            paged: LookupClient::new(
                provider,
                &settings.wiki_language,
                settings.paged_summary_sentences,
            ),
            formatter: ResponseFormatter::new(settings.include_source_link),
        }
    }
}
