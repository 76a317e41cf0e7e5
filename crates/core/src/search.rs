//! Web search for candidate reference articles.
//!
//! [`SearchClient`] issues one GET against a search engine's HTML surface,
//! unwraps redirect-wrapped result links and filters out destinations that
//! cannot serve as independent long-form references. It never fails: any
//! transport or parse problem degrades to an empty result list.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::article::SearchResult;
use crate::fetch::PageFetcher;
use crate::parse::Document;
use crate::{RepriseError, Result};

/// Search client configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// HTML search endpoint; the query goes in the `q` parameter.
    pub endpoint: String,
    /// Appended to every query to bias results toward long-form content.
    pub qualifier: String,
    /// Domain of the site whose articles are being improved.
    pub own_domain: Option<String>,
    /// Video and social platforms that never host usable articles.
    pub blocked_domains: Vec<String>,
    /// Selector for one result block.
    pub result_selector: String,
    /// Selector for the title link inside a result block.
    pub link_selector: String,
    /// Selector for the snippet inside a result block.
    pub snippet_selector: String,
    /// Query parameter carrying the real destination on redirect links.
    pub redirect_param: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            qualifier: "blog article".to_string(),
            own_domain: Some("beyondchats.com".to_string()),
            blocked_domains: ["youtube.com", "youtu.be", "facebook.com", "twitter.com", "x.com", "instagram.com", "tiktok.com"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            result_selector: ".result".to_string(),
            link_selector: "a.result__a".to_string(),
            snippet_selector: ".result__snippet".to_string(),
            redirect_param: "uddg".to_string(),
        }
    }
}

/// Finds candidate reference articles for a query.
pub struct SearchClient {
    fetcher: Arc<dyn PageFetcher>,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: SearchConfig) -> Self {
        Self { fetcher, config }
    }

    /// Returns up to `n` acceptable results in backend order.
    ///
    /// Never fails; errors are logged and yield an empty list.
    pub async fn search(&self, query: &str, n: usize) -> Vec<SearchResult> {
        if n == 0 {
            return Vec::new();
        }

        info!(query, "searching for reference articles");

        match self.try_search(query, n).await {
            Ok(results) => {
                info!(count = results.len(), "search finished");
                results
            }
            Err(e) => {
                warn!(query, error = %e, "search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str, n: usize) -> Result<Vec<SearchResult>> {
        let url = build_search_url(query, &self.config)?;
        let html = self.fetcher.fetch(url.as_str()).await?;
        parse_results(&html, n, &self.config)
    }
}

/// Builds the search URL with the qualifier appended to `query`.
pub fn build_search_url(query: &str, config: &SearchConfig) -> Result<Url> {
    let full_query = if config.qualifier.is_empty() {
        query.trim().to_string()
    } else {
        format!("{} {}", query.trim(), config.qualifier)
    };

    Url::parse_with_params(&config.endpoint, &[("q", full_query.as_str())])
        .map_err(|e| RepriseError::InvalidUrl(format!("{}: {}", config.endpoint, e)))
}

/// Parses a search results page, keeping the first `n` acceptable results.
pub fn parse_results(html: &str, n: usize, config: &SearchConfig) -> Result<Vec<SearchResult>> {
    let base = Url::parse(&config.endpoint).map_err(|e| RepriseError::InvalidUrl(format!("{}: {}", config.endpoint, e)))?;
    let doc = Document::parse(html);
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for block in doc.select(&config.result_selector)? {
        if results.len() >= n {
            break;
        }

        let Some(link) = block.select_first(&config.link_selector)? else {
            continue;
        };

        let title = crate::text::collapse_whitespace(&link.text());
        let Some(href) = link.attr("href") else {
            continue;
        };
        let url = unwrap_redirect(href, &config.redirect_param, &base);

        if title.is_empty() || !is_acceptable(&url, config) {
            debug!(url, "skipping search result");
            continue;
        }

        if !seen.insert(url.clone()) {
            continue;
        }

        let snippet = block
            .select_first(&config.snippet_selector)?
            .map(|el| crate::text::collapse_whitespace(&el.text()))
            .unwrap_or_default();

        results.push(SearchResult { title, url, snippet });
    }

    Ok(results)
}

/// Extracts the destination from a redirect link such as
/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`.
///
/// Scheme- and root-relative links are resolved against `base` first.
/// Links without the parameter are returned unchanged.
pub fn unwrap_redirect(href: &str, param: &str, base: &Url) -> String {
    if let Ok(parsed) = base.join(href)
        && let Some((_, target)) = parsed.query_pairs().find(|(key, _)| key == param)
        && !target.is_empty()
    {
        return target.into_owned();
    }

    href.to_string()
}

/// Whether `url` can serve as an independent article reference.
pub fn is_acceptable(url: &str, config: &SearchConfig) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    if parsed.path().to_ascii_lowercase().ends_with(".pdf") {
        return false;
    }

    let Some(host) = parsed.host_str() else {
        return false;
    };

    let own = config.own_domain.iter();
    !own.chain(config.blocked_domains.iter()).any(|domain| host_matches(host, domain))
}

fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.trim().to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}
