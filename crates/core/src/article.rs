//! Article records flowing through the pipeline.
//!
//! [`Article`] is the stored row shape. [`SourceArticle`] is the immutable
//! pipeline input, [`SearchResult`] and [`ReferenceArticle`] live for a
//! single run, and [`DerivedArticle`] is the rewrite together with its
//! lineage back to the source and the references it was built from.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Result;

const MAX_SLUG_LEN: usize = 100;

/// A stored article row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_original: bool,
    #[serde(default)]
    pub original_article_id: Option<String>,
    /// JSON array of `{title, url}` pairs; only set on derived articles.
    #[serde(default)]
    pub references: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Article {
    /// Creates a new original article with a fresh id and a slug derived from the title.
    pub fn new_original(title: impl Into<String>, content: impl Into<String>) -> Self {
        let title = title.into();
        let id = Uuid::new_v4().to_string();
        let slug = format!("{}-{}", slugify(&title), &id[..8]);
        let now = OffsetDateTime::now_utc();

        Self {
            id,
            title,
            slug,
            content: content.into(),
            excerpt: String::new(),
            author: String::new(),
            published_at: Some(now),
            source_url: None,
            image_url: None,
            is_original: true,
            original_article_id: None,
            references: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decodes the stored reference list.
    ///
    /// Returns an empty list for articles without lineage.
    pub fn reference_links(&self) -> Result<Vec<ReferenceLink>> {
        match &self.references {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }
}

/// An article eligible to be improved.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArticle {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub is_original: bool,
}

impl From<Article> for SourceArticle {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            slug: article.slug,
            content: article.content,
            excerpt: article.excerpt,
            author: article.author,
            source_url: article.source_url,
            image_url: article.image_url,
            is_original: article.is_original,
        }
    }
}

/// One hit from the search backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// An external article whose text was extracted successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceArticle {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl ReferenceArticle {
    pub fn link(&self) -> ReferenceLink {
        ReferenceLink { title: self.title.clone(), url: self.url.clone() }
    }
}

/// The lineage entry persisted for each reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub title: String,
    pub url: String,
}

/// Output of the synthesizer before lineage is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

/// A pipeline-produced rewrite, permanently linked to its source.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedArticle {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub published_at: OffsetDateTime,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub original_article_id: String,
    pub references: Vec<ReferenceLink>,
}

impl DerivedArticle {
    /// Attaches lineage to a generated article.
    ///
    /// Author, source and image describe provenance and carry over from the
    /// source; everything textual comes from `generated`.
    pub fn new(
        source: &SourceArticle, generated: GeneratedArticle, references: Vec<ReferenceLink>, now: OffsetDateTime,
    ) -> Self {
        let millis = now.unix_timestamp_nanos() / 1_000_000;

        Self {
            id: Uuid::new_v4().to_string(),
            slug: format!("{}-improved-{}", source.slug, millis),
            title: generated.title,
            content: generated.content,
            excerpt: generated.excerpt,
            author: source.author.clone(),
            published_at: now,
            source_url: source.source_url.clone(),
            image_url: source.image_url.clone(),
            original_article_id: source.id.clone(),
            references,
        }
    }

    pub fn references_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.references)?)
    }

    /// Converts into the stored row shape.
    pub fn into_article(self) -> Result<Article> {
        let references = self.references_json()?;

        Ok(Article {
            id: self.id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            author: self.author,
            published_at: Some(self.published_at),
            source_url: self.source_url,
            image_url: self.image_url,
            is_original: false,
            original_article_id: Some(self.original_article_id),
            references: Some(references),
            created_at: self.published_at,
            updated_at: self.published_at,
        })
    }
}

/// Lowercases, turns runs of non-alphanumerics into `-`, trims dashes, caps length.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}
