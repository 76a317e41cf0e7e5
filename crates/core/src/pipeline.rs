//! End-to-end article improvement.
//!
//! A run moves linearly through [`PipelineStage`]s:
//! `Start → Searching → Scraping → Synthesizing → Persisting → Done`, and
//! aborts when search finds nothing, when no reference extracts, or when
//! generation fails. Individual reference failures are absorbed.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use reprise_core::{
//!     GroqClient, HttpConfig, HttpFetcher, LlmConfig, MemoryStore, Pipeline, PipelineConfig, TokioPacer,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> reprise_core::Result<()> {
//! let pipeline = Pipeline::new(
//!     PipelineConfig::builder().reference_count(2).build(),
//!     Arc::new(HttpFetcher::new(HttpConfig::default())?),
//!     Arc::new(GroqClient::new(LlmConfig::default())?),
//!     Arc::new(TokioPacer),
//!     Arc::new(MemoryStore::new()),
//! );
//! let outcome = pipeline.run("article-id").await?;
//! println!("{}", outcome.article.title);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::article::{Article, DerivedArticle, ReferenceLink, SourceArticle};
use crate::extract::{ContentExtractor, ExtractConfig};
use crate::fetch::PageFetcher;
use crate::llm::GenerationBackend;
use crate::pace::Pacer;
use crate::search::{SearchClient, SearchConfig};
use crate::store::ArticleStore;
use crate::synthesize::{SynthesizeConfig, Synthesizer};
use crate::{RepriseError, Result};

/// Position of a run in the improvement state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Searching,
    Scraping,
    Synthesizing,
    Persisting,
    Done,
    Aborted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::Searching => "searching",
            PipelineStage::Scraping => "scraping",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Done => "done",
            PipelineStage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Configuration for a pipeline and the stages it builds.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of search results requested as candidate references (default: 2).
    pub reference_count: usize,
    pub search: SearchConfig,
    pub extract: ExtractConfig,
    pub synthesize: SynthesizeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_count: 2,
            search: SearchConfig::default(),
            extract: ExtractConfig::default(),
            synthesize: SynthesizeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for PipelineConfig.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use reprise_core::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .reference_count(3)
///     .politeness_delay(Duration::from_millis(500))
///     .model("llama-3.1-70b-versatile")
///     .build();
/// assert_eq!(config.reference_count, 3);
/// ```
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Sets how many search results are requested.
    pub fn reference_count(mut self, value: usize) -> Self {
        self.config.reference_count = value;
        self
    }

    /// Sets the wait between consecutive reference fetches.
    pub fn politeness_delay(mut self, value: Duration) -> Self {
        self.config.extract.politeness_delay = value;
        self
    }

    /// Sets the domain excluded from search results as a self-reference.
    pub fn own_domain(mut self, value: Option<String>) -> Self {
        self.config.search.own_domain = value;
        self
    }

    /// Sets the qualifier appended to search queries.
    pub fn search_qualifier(mut self, value: impl Into<String>) -> Self {
        self.config.search.qualifier = value.into();
        self
    }

    /// Sets the generation model identifier.
    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.config.synthesize.model = value.into();
        self
    }

    /// Sets the generation token cap.
    pub fn max_tokens(mut self, value: u32) -> Self {
        self.config.synthesize.max_tokens = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The stored derived article.
    pub article: Article,
    /// References the rewrite was built from, in search order.
    pub references: Vec<ReferenceLink>,
    /// Number of candidate references fetched.
    pub attempted: usize,
}

/// Sequences search, extraction, synthesis and persistence for one article.
pub struct Pipeline {
    config: PipelineConfig,
    search: SearchClient,
    extractor: ContentExtractor,
    synthesizer: Synthesizer,
    store: Arc<dyn ArticleStore>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig, fetcher: Arc<dyn PageFetcher>, backend: Arc<dyn GenerationBackend>,
        pacer: Arc<dyn Pacer>, store: Arc<dyn ArticleStore>,
    ) -> Self {
        let search = SearchClient::new(fetcher.clone(), config.search.clone());
        let extractor = ContentExtractor::new(fetcher, pacer, config.extract.clone());
        let synthesizer = Synthesizer::new(backend, config.synthesize.clone());

        Self { config, search, extractor, synthesizer, store }
    }

    /// Looks up `article_id` in the store and improves it.
    ///
    /// # Errors
    ///
    /// - [`RepriseError::ArticleNotFound`] if the id is unknown
    /// - [`RepriseError::InvalidState`] if the article is itself derived
    /// - [`RepriseError::NoSearchResults`] / [`RepriseError::NoReferencesExtracted`] on abort
    /// - [`RepriseError::Generation`] if the backend call fails
    pub async fn run(&self, article_id: &str) -> Result<PipelineOutcome> {
        let source = self
            .store
            .find_source_article(article_id)
            .await?
            .ok_or_else(|| RepriseError::ArticleNotFound(article_id.to_string()))?;

        self.improve(&source).await
    }

    /// Improves an already loaded source article.
    pub async fn improve(&self, source: &SourceArticle) -> Result<PipelineOutcome> {
        info!(stage = %PipelineStage::Start, id = %source.id, title = %source.title, "processing article");

        if !source.is_original {
            return Err(abort(
                PipelineStage::Start,
                RepriseError::InvalidState(format!("article {} is derived; only original articles can be improved", source.id)),
            ));
        }

        info!(stage = %PipelineStage::Searching, "finding candidate references");
        let results = self.search.search(&source.title, self.config.reference_count).await;
        if results.is_empty() {
            return Err(abort(PipelineStage::Searching, RepriseError::NoSearchResults { query: source.title.clone() }));
        }

        info!(stage = %PipelineStage::Scraping, candidates = results.len(), "extracting references");
        let references = self.extractor.extract_all(&results).await;
        if references.is_empty() {
            return Err(abort(PipelineStage::Scraping, RepriseError::NoReferencesExtracted { attempted: results.len() }));
        }
        info!(extracted = references.len(), attempted = results.len(), "references extracted");

        info!(stage = %PipelineStage::Synthesizing, "generating rewrite");
        let generated = self
            .synthesizer
            .synthesize(&source.title, &source.content, &references)
            .await
            .map_err(|e| abort(PipelineStage::Synthesizing, e))?;

        info!(stage = %PipelineStage::Persisting, "storing derived article");
        let links: Vec<ReferenceLink> = references.iter().map(|r| r.link()).collect();
        let derived = DerivedArticle::new(source, generated, links.clone(), OffsetDateTime::now_utc());
        let id = self.store.insert_derived_article(derived).await?;

        let article = self
            .store
            .find_article(&id)
            .await?
            .ok_or_else(|| RepriseError::Store(format!("inserted article {} not found", id)))?;

        info!(stage = %PipelineStage::Done, id = %article.id, title = %article.title, "improved article saved");

        Ok(PipelineOutcome { article, references: links, attempted: results.len() })
    }
}

fn abort(stage: PipelineStage, err: RepriseError) -> RepriseError {
    warn!(stage = %stage, next = %PipelineStage::Aborted, error = %err, "pipeline aborted");
    err
}
