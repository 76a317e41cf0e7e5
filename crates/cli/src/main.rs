use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use reprise_core::{
    Article, ArticleStore, BROWSER_USER_AGENT, ContentExtractor, DEFAULT_MODEL, ExtractConfig, GroqClient, HttpConfig,
    HttpFetcher, JsonFileStore, ListFilter, LlmConfig, Pipeline, PipelineConfig, SearchClient, SearchConfig, TokioPacer,
};
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Which stored articles to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Kind(ListFilter);

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self(ListFilter::All)),
            "original" | "originals" => Ok(Self(ListFilter::Original)),
            "improved" | "derived" => Ok(Self(ListFilter::Improved)),
            _ => Err(format!("Invalid kind: {}. Valid options: all, original, improved", s)),
        }
    }
}

/// Rewrite stored articles using top web-search references and a language model
#[derive(Parser, Debug)]
#[command(name = "reprise")]
#[command(author = "Reprise Contributors")]
#[command(version)]
#[command(about = "Rewrite stored articles from web-search references", long_about = None)]
struct Cli {
    /// Article store file
    #[arg(long, global = true, env = "REPRISE_STORE", value_name = "PATH")]
    store: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// HTTP timeout in seconds for search and page fetches
    #[arg(long, global = true, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for search and page fetches
    #[arg(long, global = true, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Improve a stored original article and store the rewrite
    Improve {
        /// Article id or slug
        #[arg(value_name = "ID")]
        id: String,

        #[command(flatten)]
        llm: LlmArgs,

        #[command(flatten)]
        search: SearchArgs,

        /// Number of search results to use as references
        #[arg(long, default_value = "2", value_name = "NUM")]
        references: usize,

        /// Wait between reference fetches in milliseconds
        #[arg(long, default_value = "1500", value_name = "MS")]
        delay_ms: u64,
    },

    /// Search for candidate reference articles
    Search {
        /// Search query, usually an article title
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value = "2", value_name = "NUM")]
        count: usize,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Fetch a page and extract its article title and body
    Extract {
        /// Page URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Add an original article to the store
    Add {
        /// Article title
        #[arg(long)]
        title: String,

        /// File holding the article body (HTML or plain text)
        #[arg(long, value_name = "FILE")]
        content_file: PathBuf,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// Where the article was originally published
        #[arg(long, value_name = "URL")]
        source_url: Option<String>,

        /// Cover image
        #[arg(long, value_name = "URL")]
        image_url: Option<String>,
    },

    /// List stored articles, newest first
    List {
        /// Which articles to list (all, original, improved)
        #[arg(long, default_value = "all", value_name = "KIND")]
        kind: Kind,
    },

    /// Check that the generation backend accepts the configured credentials
    Health {
        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// Generation API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generation model identifier
    #[arg(long, env = "REPRISE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible generation API
    #[arg(long, env = "REPRISE_LLM_BASE_URL", value_name = "URL")]
    base_url: Option<String>,
}

impl LlmArgs {
    fn client(&self) -> anyhow::Result<GroqClient> {
        let mut config = LlmConfig { api_key: self.api_key.clone(), ..Default::default() };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        GroqClient::new(config).context("Failed to build generation client")
    }
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Domain excluded from results as a self-reference
    #[arg(long, default_value = "beyondchats.com", value_name = "DOMAIN")]
    own_domain: String,

    /// Keep results from the own domain
    #[arg(long)]
    include_own_domain: bool,
}

impl SearchArgs {
    fn own_domain(&self) -> Option<String> {
        (!self.include_own_domain && !self.own_domain.trim().is_empty()).then(|| self.own_domain.clone())
    }
}

impl Cli {
    fn fetcher(&self) -> anyhow::Result<Arc<HttpFetcher>> {
        let config = HttpConfig {
            timeout: self.timeout,
            user_agent: self.user_agent.clone().unwrap_or_else(|| BROWSER_USER_AGENT.to_string()),
            ..Default::default()
        };
        Ok(Arc::new(HttpFetcher::new(config).context("Failed to build HTTP client")?))
    }

    fn store(&self) -> anyhow::Result<JsonFileStore> {
        let path = match &self.store {
            Some(path) => path.clone(),
            None => JsonFileStore::default_path().context("No data directory available; pass --store")?,
        };
        tracing::debug!(path = %path.display(), "using article store");
        Ok(JsonFileStore::new(path))
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose { EnvFilter::new("reprise_core=debug,reprise=debug") } else { EnvFilter::new("warn") }
    });

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
    }

    match &cli.command {
        Command::Improve { id, llm, search, references, delay_ms } => {
            let store = Arc::new(cli.store()?);
            let config = PipelineConfig::builder()
                .reference_count(*references)
                .politeness_delay(Duration::from_millis(*delay_ms))
                .own_domain(search.own_domain())
                .model(llm.model.clone())
                .build();

            if cli.verbose {
                echo::print_info(&format!("Store: {}", store.path().display()));
            }

            let pipeline = Pipeline::new(config, cli.fetcher()?, Arc::new(llm.client()?), Arc::new(TokioPacer), store);
            let outcome = pipeline.run(id).await.with_context(|| format!("Failed to improve article {}", id))?;

            match cli.format {
                OutputFormat::Json => print_json(&outcome.article)?,
                OutputFormat::Text => {
                    echo::print_success(&format!(
                        "Improved article saved ({} of {} references used)",
                        outcome.references.len(),
                        outcome.attempted
                    ));
                    echo::print_article(&outcome.article);
                    echo::print_references(&outcome.references);
                }
            }
        }

        Command::Search { query, count, search } => {
            let config = SearchConfig { own_domain: search.own_domain(), ..Default::default() };
            let client = SearchClient::new(cli.fetcher()?, config);
            let results = client.search(query, *count).await;

            match cli.format {
                OutputFormat::Json => print_json(&results)?,
                OutputFormat::Text if results.is_empty() => echo::print_warning("No search results"),
                OutputFormat::Text => {
                    for (i, result) in results.iter().enumerate() {
                        println!("{}. {}\n   {}", i + 1, result.title.bold(), result.url.bright_blue().underline());
                        if !result.snippet.is_empty() {
                            println!("   {}", result.snippet.dimmed());
                        }
                    }
                }
            }
        }

        Command::Extract { url } => {
            let extractor = ContentExtractor::new(cli.fetcher()?, Arc::new(TokioPacer), ExtractConfig::default());
            let page = extractor.try_extract(url).await.with_context(|| format!("Failed to extract {}", url))?;

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "title": page.title, "url": url, "content": page.content }))?,
                OutputFormat::Text => {
                    println!("{}\n", page.title.bold());
                    println!("{}", page.content);
                }
            }
        }

        Command::Add { title, content_file, author, source_url, image_url } => {
            let content = std::fs::read_to_string(content_file)
                .with_context(|| format!("Failed to read file: {}", content_file.display()))?;

            let mut article = Article::new_original(title.trim(), content);
            article.author = author.clone().unwrap_or_default();
            article.source_url = source_url.clone();
            article.image_url = image_url.clone();

            let store = cli.store()?;
            let id = store.insert_article(article).await.context("Failed to store article")?;

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "id": id }))?,
                OutputFormat::Text => println!("{}", id),
            }
        }

        Command::List { kind } => {
            let articles = cli.store()?.list_articles(kind.0).await.context("Failed to read article store")?;

            match cli.format {
                OutputFormat::Json => print_json(&articles)?,
                OutputFormat::Text => echo::print_article_table(&articles),
            }
        }

        Command::Health { llm } => {
            let client = llm.client()?;
            let healthy = client.health_check(&llm.model).await;

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "healthy": healthy, "model": llm.model }))?,
                OutputFormat::Text if healthy => echo::print_success(&format!("Generation backend reachable ({})", llm.model)),
                OutputFormat::Text => echo::print_error("Generation backend unavailable"),
            }

            if !healthy {
                anyhow::bail!("generation health check failed");
            }
        }
    }

    Ok(())
}
