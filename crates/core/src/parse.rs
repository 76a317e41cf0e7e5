//! HTML parsing and DOM querying.
//!
//! This module provides the [`Document`] and [`Element`] types used by the
//! search and extraction stages to query pages with CSS selectors.
//!
//! # Example
//!
//! ```rust
//! use reprise_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{Html, Selector};

use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::{RepriseError, Result};

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    ///
    /// Parsing is lenient: malformed markup still yields a document.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Parses HTML after stripping non-content subtrees.
    ///
    /// Scripts, navigation, sidebars, comment threads and share widgets are
    /// removed first so their text cannot leak into extracted content.
    pub fn parse_with_preprocessing(html: &str, config: &PreprocessConfig) -> Self {
        let cleaned = preprocess_html(html, config);
        Self::parse(&cleaned)
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::HtmlParse`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        self.select_first("title").ok().flatten().map(|el| el.text())
    }

    /// Gets the `content` of a `<meta>` tag matched by `property` or `name`.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        let selector = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
        self.select_first(&selector)
            .ok()
            .flatten()
            .and_then(|el| el.attr("content").map(|v| v.trim().to_string()))
            .filter(|v| !v.is_empty())
    }
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the concatenated text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Selects descendant elements using a CSS selector.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first descendant matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).next().map(|el| Element { element: el }))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| RepriseError::HtmlParse(format!("Invalid selector {}: {}", selector, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta property="og:title" content=" Open Graph Title ">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML);
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML);
        let link = doc.select_first("a").unwrap().unwrap();

        assert_eq!(link.attr("href"), Some("https://example.com"));
        assert_eq!(link.text(), "Link");
    }

    #[test]
    fn test_meta_content() {
        let doc = Document::parse(SAMPLE_HTML);
        assert_eq!(doc.meta_content("og:title"), Some("Open Graph Title".to_string()));
        assert_eq!(doc.meta_content("description"), None);
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML);
        assert!(matches!(doc.select("[[invalid"), Err(RepriseError::HtmlParse(_))));
    }
}
