use std::cell::Cell;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid regex"));

/// Elements whose `header`/`footer` descendants belong to the article.
const CONTENT_CONTAINERS: &[&str] = &["article", "main"];

/// Subtrees that never hold article text.
const NON_CONTENT_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "svg",
    "nav",
    "aside",
    "[role=\"navigation\"]",
    "[role=\"complementary\"]",
    ".sidebar",
    ".comments",
    "#comments",
    ".ads",
    ".advertisement",
    ".social-share",
    ".share-buttons",
    ".related-posts",
];

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Selectors whose elements are removed together with their content
    pub strip_selectors: Vec<String>,
    /// Whether to remove HTML comments
    pub remove_comments: bool,
    /// Whether to remove elements hidden with inline styles
    pub remove_hidden: bool,
    /// Whether to remove `header`/`footer` elements outside `article` and `main`
    pub remove_page_chrome: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            strip_selectors: NON_CONTENT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            remove_comments: true,
            remove_hidden: true,
            remove_page_chrome: true,
        }
    }
}

/// Strip non-content subtrees so they cannot leak into extracted text
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = if config.remove_comments { remove_comments(html) } else { html.to_string() };

    if !config.strip_selectors.is_empty() {
        processed = remove_matching(&processed, &config.strip_selectors);
    }

    if config.remove_page_chrome {
        processed = remove_page_chrome(&processed);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    processed
}

/// Remove every element matching one of `selectors`, content included
fn remove_matching(html: &str, selectors: &[String]) -> String {
    let valid: Vec<&str> = selectors
        .iter()
        .map(String::as_str)
        .filter(|sel| match sel.parse::<lol_html::Selector>() {
            Ok(_) => true,
            Err(e) => {
                warn!(selector = %sel, error = %e, "skipping unsupported strip selector");
                false
            }
        })
        .collect();

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: valid
                .into_iter()
                .map(|sel| {
                    lol_html::element!(sel, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

/// Remove site-level `header` and `footer` elements
///
/// The rewriter sees no implied `<body>`, so nesting is tracked by hand: a
/// `header` or `footer` is kept only while an `article` or `main` is open.
fn remove_page_chrome(html: &str) -> String {
    let depth = Rc::new(Cell::new(0usize));
    let mut handlers = Vec::new();

    for container in CONTENT_CONTAINERS {
        let depth = depth.clone();
        handlers.push(lol_html::element!(container, move |el| {
            depth.set(depth.get() + 1);
            if let Some(end_handlers) = el.end_tag_handlers() {
                let depth = depth.clone();
                let on_end: lol_html::EndTagHandler<'static> = Box::new(move |_end| {
                    depth.set(depth.get().saturating_sub(1));
                    Ok(())
                });
                end_handlers.push(on_end);
            }
            Ok(())
        }));
    }

    for chrome in ["header", "footer"] {
        let depth = depth.clone();
        handlers.push(lol_html::element!(chrome, move |el| {
            if depth.get() == 0 {
                el.remove();
            }
            Ok(())
        }));
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENT.replace_all(html, "").to_string()
}

/// Remove elements with display:none or visibility:hidden styles
fn remove_hidden_elements(html: &str) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("[style]", |el| {
                if let Some(style) = el.get_attribute("style")
                    && HIDDEN_STYLE.is_match(&style)
                {
                    el.remove();
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_non_content_subtrees() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <header>Site banner</header>
                    <nav><a href="/">Home</a></nav>
                    <article>
                        <header><h1>Kept heading</h1></header>
                        <p>Content</p>
                        <div class="social-share">Share on X</div>
                        <div class="related-posts">You may also like</div>
                    </article>
                    <aside>Popular posts</aside>
                    <div id="comments">Nice post!</div>
                    <footer>Copyright</footer>
                </body>
            </html>
        "#;

        let result = preprocess_html(html, &PreprocessConfig::default());
        assert!(!result.contains("alert"));
        assert!(!result.contains("color:red"));
        assert!(!result.contains("Site banner"));
        assert!(!result.contains("Home"));
        assert!(!result.contains("Share on X"));
        assert!(!result.contains("You may also like"));
        assert!(!result.contains("Popular posts"));
        assert!(!result.contains("Nice post!"));
        assert!(!result.contains("Copyright"));
        assert!(result.contains("Kept heading"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_page_chrome_removed_without_body_tag() {
        let html = "<header>SITE BANNER</header><h1>T</h1><p>Story text</p><footer>SITE FOOTER</footer>";
        let result = preprocess_html(html, &PreprocessConfig::default());
        assert!(!result.contains("SITE BANNER"));
        assert!(!result.contains("SITE FOOTER"));
        assert!(result.contains("Story text"));
    }

    #[test]
    fn test_page_chrome_inside_containers_is_kept() {
        let html = "<main><header>Section intro</header><article><header><h1>Title</h1></header><p>Body</p><footer>Byline</footer></article></main><footer>Copyright</footer>";
        let result = remove_page_chrome(html);
        assert!(result.contains("Section intro"));
        assert!(result.contains("Title"));
        assert!(result.contains("Byline"));
        assert!(!result.contains("Copyright"));
    }

    #[test]
    fn test_page_chrome_after_closed_article_is_removed() {
        let html = "<article><p>Body</p></article><header>Late banner</header>";
        let result = remove_page_chrome(html);
        assert!(result.contains("Body"));
        assert!(!result.contains("Late banner"));
    }

    #[test]
    fn test_remove_comments() {
        let html = "<body><!-- a\nmultiline comment --><p>Visible content</p></body>";
        let result = remove_comments(html);
        assert!(!result.contains("<!--"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <div style="display:none">Hidden content</div>
            <div style="visibility: hidden">Invisible content</div>
            <div style="color: blue">Visible content</div>
        "#;

        let result = remove_hidden_elements(html);
        assert!(!result.contains("Hidden content"));
        assert!(!result.contains("Invisible content"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let config =
            PreprocessConfig { strip_selectors: vec!["[[bad".to_string(), "nav".to_string()], ..Default::default() };
        let result = preprocess_html("<nav>menu</nav><p>text</p>", &config);
        assert!(!result.contains("menu"));
        assert!(result.contains("text"));
    }

    #[test]
    fn test_disabled_passes_keep_input() {
        let config = PreprocessConfig {
            strip_selectors: Vec::new(),
            remove_comments: false,
            remove_hidden: false,
            remove_page_chrome: false,
        };
        let html = "<!-- c --><nav>menu</nav>";
        assert_eq!(preprocess_html(html, &config), html);
    }
}
