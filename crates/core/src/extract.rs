//! Best-effort article extraction from arbitrary pages.
//!
//! Pages share no DOM contract, so both fields are resolved by an ordered
//! chain of strategies where the first qualifying result wins. Length
//! thresholds reject navigation and boilerplate matches without any
//! semantic understanding of the page.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::article::{ReferenceArticle, SearchResult};
use crate::fetch::PageFetcher;
use crate::pace::Pacer;
use crate::parse::Document;
use crate::preprocess::PreprocessConfig;
use crate::text::{char_len, normalize_whitespace, truncate_chars};
use crate::{RepriseError, Result};

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Title selectors, most specific first
    pub title_selectors: Vec<String>,
    /// Content container selectors, most likely first
    pub content_selectors: Vec<String>,
    /// A container is accepted once its text exceeds this many characters
    pub container_threshold: usize,
    /// Fallback paragraphs must exceed this many characters
    pub min_paragraph_len: usize,
    /// Extracted content is cut to this many characters
    pub max_content_len: usize,
    /// Content shorter than this is treated as boilerplate
    pub min_content_len: usize,
    /// Wait between consecutive fetches
    pub politeness_delay: Duration,
    /// Non-content stripping applied before extraction
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            title_selectors: ["h1.entry-title", "h1.post-title", "article h1", "main h1", "h1", "title"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_selectors: [
                "article",
                "[role=\"main\"]",
                "main",
                ".post-content",
                ".entry-content",
                ".article-content",
                ".content",
                ".blog-post",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            container_threshold: 500,
            min_paragraph_len: 30,
            max_content_len: 8000,
            min_content_len: 200,
            politeness_delay: Duration::from_millis(1500),
            preprocess: PreprocessConfig::default(),
        }
    }
}

/// Title and body text isolated from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
}

/// A field resolver; returns `None` to pass to the next strategy.
type Strategy = fn(&Document, &ExtractConfig) -> Option<String>;

const TITLE_STRATEGIES: &[Strategy] = &[title_from_selectors, title_from_meta];
const BODY_STRATEGIES: &[Strategy] = &[body_from_containers, body_from_paragraphs];

/// Extract title and body from raw HTML
///
/// This is the synchronous core of the extractor. It:
/// 1. Strips non-content subtrees
/// 2. Resolves the title through the title chain
/// 3. Resolves the body through the container chain, then the paragraph fallback
/// 4. Normalizes whitespace and truncates to the content cap
/// 5. Rejects results below the quality floor
pub fn extract_page(html: &str, config: &ExtractConfig) -> Result<ExtractedPage> {
    let doc = Document::parse_with_preprocessing(html, &config.preprocess);

    let title = first_match(TITLE_STRATEGIES, &doc, config).unwrap_or_default();
    let body = first_match(BODY_STRATEGIES, &doc, config).unwrap_or_default();
    let content = truncate_chars(&normalize_whitespace(&body), config.max_content_len).to_string();

    check_quality(&title, &content, config)?;

    Ok(ExtractedPage { title, content })
}

/// Applies the quality floor: a title and at least `min_content_len` characters.
pub fn check_quality(title: &str, content: &str, config: &ExtractConfig) -> Result<()> {
    let length = char_len(content);

    if title.trim().is_empty() || length < config.min_content_len {
        return Err(RepriseError::ExtractionQuality { length, minimum: config.min_content_len });
    }

    Ok(())
}

fn first_match(strategies: &[Strategy], doc: &Document, config: &ExtractConfig) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(doc, config))
}

fn title_from_selectors(doc: &Document, config: &ExtractConfig) -> Option<String> {
    config.title_selectors.iter().find_map(|selector| {
        let element = doc.select_first(selector).ok().flatten()?;
        let text = crate::text::collapse_whitespace(&element.text());
        (!text.is_empty()).then_some(text)
    })
}

fn title_from_meta(doc: &Document, _config: &ExtractConfig) -> Option<String> {
    doc.meta_content("og:title")
}

fn body_from_containers(doc: &Document, config: &ExtractConfig) -> Option<String> {
    config.content_selectors.iter().find_map(|selector| {
        let element = doc.select_first(selector).ok().flatten()?;
        let text = normalize_whitespace(&element.text());
        (char_len(&text) > config.container_threshold).then_some(text)
    })
}

fn body_from_paragraphs(doc: &Document, config: &ExtractConfig) -> Option<String> {
    let paragraphs: Vec<String> = doc
        .select("p")
        .ok()?
        .iter()
        .map(|p| crate::text::collapse_whitespace(&p.text()))
        .filter(|text| char_len(text) > config.min_paragraph_len)
        .collect();

    (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
}

/// Fetches pages and extracts reference articles from them.
pub struct ContentExtractor {
    fetcher: Arc<dyn PageFetcher>,
    pacer: Arc<dyn Pacer>,
    config: ExtractConfig,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, pacer: Arc<dyn Pacer>, config: ExtractConfig) -> Self {
        Self { fetcher, pacer, config }
    }

    /// Fetches `url` and extracts its article, or `None` on any failure.
    pub async fn extract(&self, url: &str) -> Option<ExtractedPage> {
        match self.try_extract(url).await {
            Ok(page) => {
                info!(url, title = %page.title, chars = char_len(&page.content), "extracted reference");
                Some(page)
            }
            Err(e) => {
                warn!(url, error = %e, "skipping reference");
                None
            }
        }
    }

    /// Like [`extract`](Self::extract) but reports why extraction failed.
    pub async fn try_extract(&self, url: &str) -> Result<ExtractedPage> {
        let html = self.fetcher.fetch(url).await?;
        extract_page(&html, &self.config)
    }

    /// Extracts each search result in order, one request at a time.
    ///
    /// Waits `politeness_delay` between consecutive fetches. Failed results
    /// are skipped; the returned list holds only successful extractions.
    pub async fn extract_all(&self, results: &[SearchResult]) -> Vec<ReferenceArticle> {
        let mut references = Vec::with_capacity(results.len());

        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                debug!(delay_ms = self.config.politeness_delay.as_millis() as u64, "pausing between fetches");
                self.pacer.pause(self.config.politeness_delay).await;
            }

            if let Some(page) = self.extract(&result.url).await {
                let title = if page.title.is_empty() { result.title.clone() } else { page.title };
                references.push(ReferenceArticle { title, url: result.url.clone(), content: page.content });
            }
        }

        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(word: &str, chars: usize) -> String {
        let mut text = String::new();
        while char_len(&text) < chars {
            text.push_str(word);
            text.push(' ');
        }
        truncate_chars(text.trim_end(), chars).to_string()
    }

    #[test]
    fn test_title_chain_prefers_entry_title() {
        let html = format!(
            "<html><head><title>Doc title</title></head><body><h1>Generic</h1><h1 class=\"entry-title\">Entry</h1><article><p>{}</p></article></body></html>",
            long_text("body", 600)
        );
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();
        assert_eq!(page.title, "Entry");
    }

    #[test]
    fn test_title_falls_back_to_document_title() {
        let html = format!(
            "<html><head><title> Only   title </title></head><body><p>{}</p></body></html>",
            long_text("paragraph", 300)
        );
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();
        assert_eq!(page.title, "Only title");
    }

    #[test]
    fn test_title_falls_back_to_og_title() {
        let html = format!(
            r#"<html><head><meta property="og:title" content="Social title"></head><body><p>{}</p></body></html>"#,
            long_text("paragraph", 300)
        );
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();
        assert_eq!(page.title, "Social title");
    }

    #[test]
    fn test_first_container_over_threshold_wins() {
        let html = format!(
            "<html><body><h1>T</h1><article>{}</article><div class=\"entry-content\">{}</div></body></html>",
            long_text("short", 100),
            long_text("entry", 700)
        );
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();
        assert!(page.content.starts_with("entry"));
    }

    #[test]
    fn test_paragraph_fallback_skips_short_labels() {
        let html = format!(
            "<html><body><h1>T</h1><div><p>Share</p><p>{}</p><p>Subscribe now!</p><p>{}</p></div></body></html>",
            long_text("alpha", 150),
            long_text("omega", 150)
        );
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();

        assert!(!page.content.contains("Share"));
        assert!(!page.content.contains("Subscribe"));
        let parts: Vec<&str> = page.content.split("\n\n").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("alpha"));
        assert!(parts[1].starts_with("omega"));
    }

    #[test]
    fn test_content_is_truncated_to_cap() {
        let html = format!("<html><body><h1>T</h1><article>{}</article></body></html>", long_text("word", 9000));
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();
        assert_eq!(char_len(&page.content), 8000);
    }

    #[test]
    fn test_stripped_subtrees_do_not_leak() {
        let html = format!(
            "<html><body><h1>T</h1><article><p>{}</p><div class=\"related-posts\">RELATED LINKS</div><script>var tracker = 1;</script></article></body></html>",
            long_text("story", 600)
        );
        let page = extract_page(&html, &ExtractConfig::default()).unwrap();
        assert!(!page.content.contains("RELATED"));
        assert!(!page.content.contains("tracker"));
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let html = format!("<html><body><article>{}</article></body></html>", long_text("body", 600));
        let err = extract_page(&html, &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, RepriseError::ExtractionQuality { .. }));
    }

    #[test]
    fn test_quality_floor_boundary() {
        let config = ExtractConfig::default();
        assert!(check_quality("Title", &"x".repeat(199), &config).is_err());
        assert!(check_quality("Title", &"x".repeat(200), &config).is_ok());
        assert!(check_quality("  ", &"x".repeat(500), &config).is_err());
    }

    #[test]
    fn test_page_at_floor_boundary() {
        let config = ExtractConfig::default();
        let at_floor = format!("<html><body><h1>T</h1><p>{}</p></body></html>", "y".repeat(200));
        let below_floor = format!("<html><body><h1>T</h1><p>{}</p></body></html>", "y".repeat(199));

        assert_eq!(char_len(&extract_page(&at_floor, &config).unwrap().content), 200);
        assert!(matches!(
            extract_page(&below_floor, &config),
            Err(RepriseError::ExtractionQuality { length: 199, minimum: 200 })
        ));
    }
}
