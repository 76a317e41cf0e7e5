//! Error types for Reprise operations.
//!
//! This module defines the main error type [`RepriseError`] which covers
//! every failure the pipeline can observe, and [`GenerationError`] which
//! carries the distinguishing cause of a failed language model call.
//!
//! Failures local to a single search result or reference fetch are absorbed
//! by the stage that sees them; only run-level failures reach the caller.
//!
//! # Example
//!
//! ```rust
//! use reprise_core::{GenerationErrorKind, RepriseError};
//!
//! fn describe(err: &RepriseError) -> &'static str {
//!     match err {
//!         RepriseError::Generation(e) if e.kind == GenerationErrorKind::Auth => "check your API key",
//!         RepriseError::Generation(e) if e.kind == GenerationErrorKind::RateLimit => "try again later",
//!         RepriseError::InvalidState(_) => "only original articles can be improved",
//!         _ => "something went wrong",
//!     }
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum RepriseError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures and connection issues on search
    /// or page fetches. Always recoverable by skipping the item.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Non-success status from a fetched page or search endpoint.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    /// Page was parsed but the extracted text is below the quality floor.
    ///
    /// Treated exactly like a transport failure: the reference is skipped.
    #[error("Extracted content below quality floor ({length} chars, minimum {minimum})")]
    ExtractionQuality { length: usize, minimum: usize },

    /// The generation backend call failed. Fatal to the run.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Precondition violation, e.g. improving an article that is itself derived.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The requested source article does not exist.
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// The search stage returned no usable results.
    #[error("No reference articles found for \"{query}\". Try again later.")]
    NoSearchResults { query: String },

    /// Every candidate reference failed to extract.
    #[error("Failed to extract any of {attempted} reference articles")]
    NoReferencesExtracted { attempted: usize },

    /// Persistence collaborator failures.
    #[error("Store error: {0}")]
    Store(String),

    /// File I/O errors.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RepriseError {
    /// Whether this failure is absorbed per item rather than ending a run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RepriseError::Transport(_)
                | RepriseError::Timeout { .. }
                | RepriseError::HttpStatus { .. }
                | RepriseError::InvalidUrl(_)
                | RepriseError::HtmlParse(_)
                | RepriseError::ExtractionQuality { .. }
        )
    }
}

/// Distinguishing cause of a generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Credentials were rejected (HTTP 401/403) or missing.
    Auth,
    /// The backend throttled the request (HTTP 429).
    RateLimit,
    /// Anything else: transport, unexpected status, empty reply.
    Other,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationErrorKind::Auth => f.write_str("auth"),
            GenerationErrorKind::RateLimit => f.write_str("rate-limit"),
            GenerationErrorKind::Other => f.write_str("other"),
        }
    }
}

/// A failed call to the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::RateLimit, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Other, message)
    }

    /// Classify an HTTP status returned by the backend.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!("HTTP {}: {}", status, body)),
            429 => Self::rate_limit(format!("HTTP {}: {}", status, body)),
            _ => Self::other(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GenerationErrorKind::Auth => write!(f, "Invalid generation API credentials: {}", self.message),
            GenerationErrorKind::RateLimit => {
                write!(f, "Generation rate limit exceeded, try again later: {}", self.message)
            }
            GenerationErrorKind::Other => write!(f, "Failed to generate article: {}", self.message),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Result type alias for RepriseError.
pub type Result<T> = std::result::Result<T, RepriseError>;
