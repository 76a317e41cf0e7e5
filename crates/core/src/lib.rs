pub mod article;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod pace;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod search;
pub mod store;
pub mod synthesize;
pub mod text;

pub use article::{
    Article, DerivedArticle, GeneratedArticle, ReferenceArticle, ReferenceLink, SearchResult, SourceArticle, slugify,
};
pub use error::{GenerationError, GenerationErrorKind, RepriseError, Result};
pub use extract::{ContentExtractor, ExtractConfig, ExtractedPage, check_quality, extract_page};
pub use fetch::{BROWSER_USER_AGENT, HttpConfig, HttpFetcher, PageFetcher, validate_url};
pub use llm::{CompletionRequest, DEFAULT_MODEL, GenerationBackend, GroqClient, LlmConfig};
pub use pace::{Pacer, TokioPacer};
pub use parse::{Document, Element};
pub use pipeline::{Pipeline, PipelineConfig, PipelineConfigBuilder, PipelineOutcome, PipelineStage};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use search::{SearchClient, SearchConfig, parse_results};
pub use store::{ArticleStore, JsonFileStore, ListFilter, MemoryStore};
pub use synthesize::{SYSTEM_PROMPT, SynthesizeConfig, Synthesizer, parse_reply};
