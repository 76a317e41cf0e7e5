//! Rewriting an article from its references with a language model.
//!
//! The prompt is instructional: a fixed system instruction pins format,
//! tone and length, and the user instruction carries the original plus
//! every reference and demands a `TITLE:` / `EXCERPT:` / `CONTENT:` reply.
//! Parsing that reply is best-effort with explicit defaults, and the
//! citation list is appended locally from what was actually fetched.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::article::{GeneratedArticle, ReferenceArticle};
use crate::llm::{CompletionRequest, DEFAULT_MODEL, GenerationBackend};
use crate::text::{strip_markup, truncate_chars};

const TITLE_LABEL: &str = "TITLE:";
const EXCERPT_LABEL: &str = "EXCERPT:";
const CONTENT_LABEL: &str = "CONTENT:";

/// System instruction sent with every rewrite.
pub const SYSTEM_PROMPT: &str = "You are an expert content writer and SEO specialist. Your task is to improve an existing article by:
1. Making it more comprehensive and well-structured
2. Incorporating relevant insights from reference articles
3. Improving readability with proper headings and formatting
4. Keeping the core message intact
5. Making it more engaging and informative

IMPORTANT:
- Write in Markdown format
- Use ## for main headings, ### for subheadings
- Include bullet points and lists where appropriate
- Keep a professional but approachable tone
- Do NOT copy content directly - rewrite and improve
- Aim for 800-1200 words";

/// Synthesizer configuration.
#[derive(Debug, Clone)]
pub struct SynthesizeConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Cap on the markup-stripped original, in characters.
    pub original_cap: usize,
    /// Cap on each reference body, in characters.
    pub reference_cap: usize,
}

impl Default for SynthesizeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 3000,
            temperature: 0.7,
            original_cap: 4000,
            reference_cap: 2000,
        }
    }
}

/// Fields recovered from a model reply, before the references section is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub title: String,
    pub excerpt: String,
    pub content: String,
}

/// Produces a rewritten article from an original and its references.
pub struct Synthesizer {
    backend: Arc<dyn GenerationBackend>,
    config: SynthesizeConfig,
}

impl Synthesizer {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: SynthesizeConfig) -> Self {
        Self { backend, config }
    }

    /// Builds the request the backend would receive for these inputs.
    pub fn build_request(
        &self, original_title: &str, original_content: &str, references: &[ReferenceArticle],
    ) -> CompletionRequest {
        let clean_original = strip_markup(original_content);
        let clean_original = truncate_chars(&clean_original, self.config.original_cap);

        CompletionRequest {
            model: self.config.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user: build_user_prompt(original_title, clean_original, references, self.config.reference_cap),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Generates the rewrite.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::Generation`](crate::RepriseError::Generation)
    /// when the backend call fails. Malformed replies are not errors.
    pub async fn synthesize(
        &self, original_title: &str, original_content: &str, references: &[ReferenceArticle],
    ) -> Result<GeneratedArticle> {
        let request = self.build_request(original_title, original_content, references);
        info!(model = %request.model, references = references.len(), "generating article");

        let reply = self.backend.complete(&request).await?;
        let parsed = parse_reply(&reply, original_title);

        let mut content = parsed.content;
        content.push_str(&references_section(references));

        info!(title = %parsed.title, "generated article");

        Ok(GeneratedArticle { title: parsed.title, content, excerpt: parsed.excerpt })
    }
}

/// Composes the user instruction.
///
/// `original` is expected to be cleaned already; each reference body is cut
/// to `reference_cap` characters here.
pub fn build_user_prompt(title: &str, original: &str, references: &[ReferenceArticle], reference_cap: usize) -> String {
    let summaries: Vec<String> = references
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "\n### Reference {}: \"{}\"\nSource: {}\nContent:\n{}\n",
                i + 1,
                r.title,
                r.url,
                truncate_chars(&r.content, reference_cap)
            )
        })
        .collect();

    format!(
        "Please improve this article based on the reference articles.

## Original Article
Title: {title}

Content:
{original}

---

## Reference Articles (Top Search Results)
{references}

---

Please provide your response in this EXACT format:

TITLE: [Your improved title here]

EXCERPT: [A 2-3 sentence summary/excerpt]

CONTENT:
[Your full improved article in Markdown format]",
        references = summaries.join("\n---\n")
    )
}

/// Recovers title, excerpt and content from a reply.
///
/// Missing fields fall back to the original title, an empty excerpt, and
/// the whole reply respectively; this never fails.
pub fn parse_reply(reply: &str, original_title: &str) -> ParsedReply {
    let title = parse_title(reply).unwrap_or_else(|| original_title.trim().to_string());
    let excerpt = parse_excerpt(reply).unwrap_or_default();
    let content = parse_content(reply).unwrap_or_else(|| reply.trim().to_string());

    ParsedReply { title, excerpt, content }
}

/// Text after `TITLE:` up to the end of its line or an inline `EXCERPT:`.
fn parse_title(reply: &str) -> Option<String> {
    let after = after_label(reply, TITLE_LABEL)?;
    let after = after.trim_start();
    let end = [after.find('\n'), after.find(EXCERPT_LABEL)].into_iter().flatten().min().unwrap_or(after.len());
    non_empty(&after[..end])
}

/// Text between `EXCERPT:` and the following `CONTENT:`.
fn parse_excerpt(reply: &str) -> Option<String> {
    let after = after_label(reply, EXCERPT_LABEL)?;
    let end = after.find(CONTENT_LABEL)?;
    non_empty(&after[..end])
}

/// Everything after the first `CONTENT:`.
fn parse_content(reply: &str) -> Option<String> {
    non_empty(after_label(reply, CONTENT_LABEL)?)
}

fn after_label<'a>(reply: &'a str, label: &str) -> Option<&'a str> {
    reply.find(label).map(|idx| &reply[idx + label.len()..])
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The citation list appended to every generated article.
pub fn references_section(references: &[ReferenceArticle]) -> String {
    let mut section = String::from("\n\n---\n\n## References\n\nThis article was enhanced using insights from:\n\n");

    for (i, r) in references.iter().enumerate() {
        let _ = writeln!(section, "{}. [{}]({})", i + 1, r.title, r.url);
    }

    section
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{GenerationError, GenerationErrorKind, RepriseError};

    struct ScriptedBackend {
        reply: std::result::Result<String, GenerationError>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn backend(reply: std::result::Result<String, GenerationError>) -> Arc<ScriptedBackend> {
        Arc::new(ScriptedBackend { reply, seen: Mutex::new(Vec::new()) })
    }

    fn reference(n: usize, content: &str) -> ReferenceArticle {
        ReferenceArticle {
            title: format!("Ref {}", n),
            url: format!("https://ref{}.example/post", n),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_parse_well_formed_reply() {
        let reply = "TITLE: A Better Title\n\nEXCERPT: First sentence.\nSecond sentence.\n\nCONTENT:\n## Intro\n\nBody text.\n";
        let parsed = parse_reply(reply, "Original");

        assert_eq!(parsed.title, "A Better Title");
        assert_eq!(parsed.excerpt, "First sentence.\nSecond sentence.");
        assert_eq!(parsed.content, "## Intro\n\nBody text.");
    }

    #[test]
    fn test_parse_inline_labels() {
        let parsed = parse_reply("TITLE: Inline EXCERPT: Short CONTENT: Body", "Original");
        assert_eq!(parsed.title, "Inline");
        assert_eq!(parsed.excerpt, "Short");
        assert_eq!(parsed.content, "Body");
    }

    #[test]
    fn test_parse_missing_excerpt_uses_defaults() {
        let reply = "TITLE: Kept\n\nCONTENT:\nThe body.";
        let parsed = parse_reply(reply, "Original");

        assert_eq!(parsed.title, "Kept");
        assert_eq!(parsed.excerpt, "");
        assert_eq!(parsed.content, "The body.");
    }

    #[test]
    fn test_parse_free_prose_falls_back_to_raw_reply() {
        let reply = "  Here is a rewritten article without any labels.  ";
        let parsed = parse_reply(reply, "Original title");

        assert_eq!(parsed.title, "Original title");
        assert_eq!(parsed.excerpt, "");
        assert_eq!(parsed.content, "Here is a rewritten article without any labels.");
    }

    #[test]
    fn test_parse_empty_title_falls_back() {
        let parsed = parse_reply("TITLE:\nEXCERPT: e\nCONTENT: c", "Original");
        assert_eq!(parsed.title, "Original");
    }

    #[test]
    fn test_references_section_numbers_every_reference() {
        let section = references_section(&[reference(1, "a"), reference(2, "b")]);
        assert!(section.contains("## References"));
        assert!(section.contains("1. [Ref 1](https://ref1.example/post)"));
        assert!(section.contains("2. [Ref 2](https://ref2.example/post)"));
    }

    #[test]
    fn test_user_prompt_caps_reference_content() {
        let long = "z".repeat(5000);
        let prompt = build_user_prompt("T", "original", &[reference(1, &long)], 2000);

        assert!(prompt.contains(&"z".repeat(2000)));
        assert!(!prompt.contains(&"z".repeat(2001)));
        assert!(prompt.contains("### Reference 1: \"Ref 1\""));
        assert!(prompt.contains("Source: https://ref1.example/post"));
        assert!(prompt.contains("TITLE:"));
        assert!(prompt.contains("EXCERPT:"));
        assert!(prompt.contains("CONTENT:"));
    }

    #[test]
    fn test_request_strips_and_caps_original() {
        let synthesizer = Synthesizer::new(backend(Ok(String::new())), SynthesizeConfig::default());
        let original = format!("<p>{}</p>\n\n<div>{}</div>", "a".repeat(3000), "b".repeat(3000));
        let request = synthesizer.build_request("Title", &original, &[]);

        assert!(!request.user.contains("<p>"));
        assert!(request.user.contains(&format!("{} {}", "a".repeat(3000), "b".repeat(999))));
        assert!(!request.user.contains(&"b".repeat(1000)));
        assert_eq!(request.system, SYSTEM_PROMPT);
        assert_eq!(request.max_tokens, 3000);
    }

    #[tokio::test]
    async fn test_synthesize_appends_references() {
        let backend = backend(Ok("TITLE: New\nEXCERPT: Short.\nCONTENT:\nBody".to_string()));
        let synthesizer = Synthesizer::new(backend.clone(), SynthesizeConfig::default());
        let refs = vec![reference(1, "first"), reference(2, "second")];

        let generated = synthesizer.synthesize("Old", "<p>old body</p>", &refs).await.unwrap();

        assert_eq!(generated.title, "New");
        assert_eq!(generated.excerpt, "Short.");
        assert!(generated.content.starts_with("Body\n\n---\n\n## References"));
        assert!(generated.content.contains("2. [Ref 2](https://ref2.example/post)"));
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_synthesize_propagates_generation_error() {
        let synthesizer =
            Synthesizer::new(backend(Err(GenerationError::rate_limit("429"))), SynthesizeConfig::default());
        let err = synthesizer.synthesize("Old", "body", &[reference(1, "x")]).await.unwrap_err();

        match err {
            RepriseError::Generation(e) => assert_eq!(e.kind, GenerationErrorKind::RateLimit),
            other => panic!("unexpected error: {other}"),
        }
    }
}
