//! Article persistence.
//!
//! The pipeline only needs two operations from its store: look up a source
//! article and insert a derived one. [`ArticleStore`] also exposes the
//! listing queries the CLI uses. Two implementations are provided: an
//! in-memory [`MemoryStore`] and a single-file [`JsonFileStore`].

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::article::{Article, DerivedArticle, SourceArticle};
use crate::{RepriseError, Result};

/// Which articles a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Original,
    Improved,
}

impl ListFilter {
    fn accepts(self, article: &Article) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Original => article.is_original,
            ListFilter::Improved => !article.is_original,
        }
    }
}

/// Persistence collaborator for the pipeline.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Finds an article by id or slug.
    async fn find_article(&self, id_or_slug: &str) -> Result<Option<Article>>;

    /// Inserts a fully formed row and returns its id.
    async fn insert_article(&self, article: Article) -> Result<String>;

    /// Lists articles matching `filter`, newest first.
    async fn list_articles(&self, filter: ListFilter) -> Result<Vec<Article>>;

    /// Finds the article a pipeline run would start from.
    ///
    /// Derived rows are returned too (with `is_original == false`) so the
    /// caller can reject them explicitly.
    async fn find_source_article(&self, id: &str) -> Result<Option<SourceArticle>> {
        Ok(self.find_article(id).await?.map(SourceArticle::from))
    }

    /// Stores a derived article with its lineage and returns its id.
    async fn insert_derived_article(&self, derived: DerivedArticle) -> Result<String> {
        self.insert_article(derived.into_article()?).await
    }

    /// Lists rewrites of `original_id`, newest first.
    async fn derived_articles(&self, original_id: &str) -> Result<Vec<Article>> {
        let improved = self.list_articles(ListFilter::Improved).await?;
        Ok(improved.into_iter().filter(|a| a.original_article_id.as_deref() == Some(original_id)).collect())
    }
}

fn lookup(articles: &[Article], id_or_slug: &str) -> Option<Article> {
    articles.iter().find(|a| a.id == id_or_slug || a.slug == id_or_slug).cloned()
}

fn check_unique(articles: &[Article], article: &Article) -> Result<()> {
    if articles.iter().any(|a| a.id == article.id) {
        return Err(RepriseError::Store(format!("duplicate article id {}", article.id)));
    }
    if articles.iter().any(|a| a.slug == article.slug) {
        return Err(RepriseError::Store(format!("duplicate article slug {}", article.slug)));
    }
    Ok(())
}

fn select(articles: &[Article], filter: ListFilter) -> Vec<Article> {
    let mut selected: Vec<Article> = articles.iter().filter(|a| filter.accepts(a)).cloned().collect();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected
}

/// Store holding articles in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self { articles: Mutex::new(articles) }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Article>> {
        self.articles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn find_article(&self, id_or_slug: &str) -> Result<Option<Article>> {
        Ok(lookup(&self.lock(), id_or_slug))
    }

    async fn insert_article(&self, article: Article) -> Result<String> {
        let mut articles = self.lock();
        check_unique(&articles, &article)?;
        let id = article.id.clone();
        articles.push(article);
        Ok(id)
    }

    async fn list_articles(&self, filter: ListFilter) -> Result<Vec<Article>> {
        Ok(select(&self.lock(), filter))
    }
}

/// Store backed by one JSON file holding an array of articles.
///
/// Inserts hold an exclusive advisory lock on `<path>.lock` across the
/// read, uniqueness check and write, so separate handles and processes
/// sharing a file do not lose rows. Each write lands through a uniquely
/// named temporary file that is renamed over the store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/reprise/articles.json`, if the platform has a data dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("reprise").join("articles.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file used only for locking.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<Vec<Article>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => parse_rows(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(RepriseError::Io { path: self.path.clone(), source }),
        }
    }

    fn insert_locked(&self, article: Article) -> Result<String> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_err(&lock_path))?;
        lock.lock_exclusive().map_err(io_err(&lock_path))?;

        let mut articles = match std::fs::read_to_string(&self.path) {
            Ok(json) => parse_rows(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(RepriseError::Io { path: self.path.clone(), source }),
        };
        check_unique(&articles, &article)?;
        let id = article.id.clone();
        articles.push(article);

        self.save(&dir, &articles)?;
        unlock(&lock, &lock_path);
        Ok(id)
    }

    fn save(&self, dir: &Path, articles: &[Article]) -> Result<()> {
        let json = serde_json::to_string_pretty(articles)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err(dir))?;
        tmp.write_all(json.as_bytes()).map_err(io_err(tmp.path()))?;
        tmp.persist(&self.path).map_err(|e| RepriseError::Io { path: self.path.clone(), source: e.error })?;

        debug!(path = %self.path.display(), count = articles.len(), "saved article store");
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn parse_rows(json: &str) -> Result<Vec<Article>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}

// Dropping the handle also releases the lock, so a failed unlock is only logged.
fn unlock(lock: &File, path: &Path) {
    if let Err(e) = FileExt::unlock(lock) {
        debug!(path = %path.display(), error = %e, "failed to release store lock");
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RepriseError {
    let path = path.to_path_buf();
    move |source| RepriseError::Io { path, source }
}

#[async_trait]
impl ArticleStore for JsonFileStore {
    async fn find_article(&self, id_or_slug: &str) -> Result<Option<Article>> {
        Ok(lookup(&self.load().await?, id_or_slug))
    }

    async fn insert_article(&self, article: Article) -> Result<String> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.insert_locked(article))
            .await
            .map_err(|e| RepriseError::Store(format!("store write task failed: {}", e)))?
    }

    async fn list_articles(&self, filter: ListFilter) -> Result<Vec<Article>> {
        Ok(select(&self.load().await?, filter))
    }
}
