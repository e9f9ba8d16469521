//! MediaWiki Action API provider
//!
//! Resolves a free-form query to an article title with a full-text search,
//! then fetches a plain-text extract of the first sentences. Disambiguation
//! pages are reported with the first article link of every list entry, in
//! the order the entries appear on the page.

use std::time::Duration;

use async_trait::async_trait;
use lazy_regex::lazy_regex;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::wiki::{Article, LookupError, SummaryProvider};

static RE_LIST_ITEM: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"<li\b([^>]*)>|</li>"#);
static RE_ARTICLE_LINK: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"<a\s[^>]*?href="/wiki/[^"]*"[^>]*?\btitle="([^"]*)""#);

#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    query: Option<T>,
}

#[derive(Deserialize, Debug)]
struct SearchQuery {
    #[serde(default)]
    searchinfo: Option<SearchInfo>,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize, Debug)]
struct SearchInfo {
    suggestion: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize, Debug)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize, Debug)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    fullurl: Option<String>,
    pageprops: Option<PageProps>,
}

#[derive(Deserialize, Debug)]
struct PageProps {
    disambiguation: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct ParseResponse {
    parse: Option<ParsedPage>,
}

#[derive(Deserialize, Debug)]
struct ParsedPage {
    text: String,
}

impl Page {
    fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .is_some_and(|props| props.disambiguation.is_some())
    }
}

/// Article titles linked from the list entries of a disambiguation page.
///
/// Takes the first `/wiki/` link of every `<li>`, in document order. Table of
/// contents entries are skipped and repeated titles are kept once.
fn disambiguation_options(html: &str) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    let tags: Vec<_> = RE_LIST_ITEM.captures_iter(html).collect();

    for (i, tag) in tags.iter().enumerate() {
        let Some(attrs) = tag.get(1) else {
            continue;
        };
        if attrs.as_str().contains("tocsection") {
            continue;
        }
        let start = tag.get(0).map_or(0, |m| m.end());
        let end = tags
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(html.len(), |m| m.start());

        let Some(title) = RE_ARTICLE_LINK
            .captures(&html[start..end])
            .and_then(|link| link.get(1))
        else {
            continue;
        };
        let title = html_escape::decode_html_entities(title.as_str()).into_owned();
        if !options.contains(&title) {
            options.push(title);
        }
    }
    options
}

/// Creates an HTTP client with the given timeout and User-Agent.
///
/// Wikimedia rejects anonymous clients, so the User-Agent is always set.
#[must_use]
pub fn create_http_client(timeout_secs: u64, user_agent: &str) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent.to_string())
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Summary provider backed by the MediaWiki Action API
pub struct MediaWikiProvider {
    http_client: HttpClient,
    endpoint_template: String,
}

impl MediaWikiProvider {
    /// Create a provider from the application settings
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self::with_endpoint(
            settings.wiki_api_endpoint.clone(),
            create_http_client(settings.wiki_http_timeout_secs, &settings.wiki_user_agent),
        )
    }

    /// Create a provider for an explicit endpoint.
    ///
    /// `{lang}` in the endpoint is replaced with the requested language.
    #[must_use]
    pub fn with_endpoint(endpoint_template: impl Into<String>, http_client: HttpClient) -> Self {
        Self {
            http_client,
            endpoint_template: endpoint_template.into(),
        }
    }

    fn endpoint(&self, language: &str) -> String {
        self.endpoint_template.replace("{lang}", language)
    }

    async fn get_api<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let response = self
            .http_client
            .get(endpoint)
            .query(&[("action", action), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::RateLimit(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(LookupError::Api(format!("HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LookupError::Json(e.to_string()))?;

        if let Some(error) = body.get("error") {
            let info = error
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("unknown API error");
            return Err(LookupError::Api(info.to_string()));
        }

        serde_json::from_value(body).map_err(|e| LookupError::Json(e.to_string()))
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let parsed: ApiResponse<T> = self.get_api(endpoint, "query", params).await?;
        parsed
            .query
            .ok_or_else(|| LookupError::Json("response has no `query` object".to_string()))
    }

    /// Best title for `query`: the search suggestion if any, else the top hit.
    async fn resolve_title(&self, endpoint: &str, query: &str) -> Result<String, LookupError> {
        let search: SearchQuery = self
            .get_query(
                endpoint,
                &[
                    ("list", "search"),
                    ("srsearch", query),
                    ("srlimit", "1"),
                    ("srinfo", "suggestion"),
                    ("srprop", ""),
                ],
            )
            .await?;

        let suggestion = search.searchinfo.and_then(|info| info.suggestion);
        suggestion
            .or_else(|| search.search.into_iter().next().map(|hit| hit.title))
            .ok_or(LookupError::NotFound)
    }

    async fn fetch_page(
        &self,
        endpoint: &str,
        title: &str,
        sentences: u32,
    ) -> Result<Page, LookupError> {
        let sentences = sentences.to_string();
        let pages: PagesQuery = self
            .get_query(
                endpoint,
                &[
                    ("prop", "extracts|info|pageprops"),
                    ("explaintext", "1"),
                    ("exsentences", sentences.as_str()),
                    ("inprop", "url"),
                    ("ppprop", "disambiguation"),
                    ("redirects", "1"),
                    ("titles", title),
                ],
            )
            .await?;

        pages.pages.into_iter().next().ok_or(LookupError::NotFound)
    }

    async fn fetch_candidates(
        &self,
        endpoint: &str,
        title: &str,
    ) -> Result<Vec<String>, LookupError> {
        let parsed: ParseResponse = self
            .get_api(
                endpoint,
                "parse",
                &[
                    ("page", title),
                    ("prop", "text"),
                    ("redirects", "1"),
                    ("disableeditsection", "1"),
                    ("disabletoc", "1"),
                ],
            )
            .await?;
        let page = parsed
            .parse
            .ok_or_else(|| LookupError::Json("response has no `parse` object".to_string()))?;

        Ok(disambiguation_options(&page.text))
    }
}

#[async_trait]
impl SummaryProvider for MediaWikiProvider {
    #[instrument(skip(self))]
    async fn summarize(
        &self,
        title: &str,
        language: &str,
        sentences: u32,
    ) -> Result<Article, LookupError> {
        let endpoint = self.endpoint(language);

        let resolved = self.resolve_title(&endpoint, title).await?;
        debug!("Query '{}' resolved to title '{}'", title, resolved);

        let page = self.fetch_page(&endpoint, &resolved, sentences).await?;
        if page.missing || page.invalid {
            return Err(LookupError::NotFound);
        }
        if page.is_disambiguation() {
            let options = self.fetch_candidates(&endpoint, &page.title).await?;
            return Err(LookupError::Ambiguous { options });
        }

        let summary = page.extract.unwrap_or_default().trim().to_string();
        if summary.is_empty() {
            return Err(LookupError::NotFound);
        }
        let url = page.fullurl.ok_or_else(|| {
            LookupError::Json(format!("page '{}' has no `fullurl`", page.title))
        })?;

        Ok(Article {
            title: page.title,
            summary,
            url,
        })
    }
}
