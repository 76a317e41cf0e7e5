use owo_colors::OwoColorize;
use reprise_core::{Article, ReferenceLink};

use crate::VERSION;

const RULE_WIDTH: usize = 60;
const TITLE_WIDTH: usize = 48;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Reprise".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Rewrite articles from web-search references\n".dimmed());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print a stored article: header fields on stderr, body on stdout
pub fn print_article(article: &Article) {
    eprintln!("\n{}", "═".repeat(RULE_WIDTH).dimmed());
    eprintln!("{}", article.title.bold().cyan());
    eprintln!("{}", "═".repeat(RULE_WIDTH).dimmed());
    eprintln!("  {} {}", "Id:".dimmed(), article.id.bright_white());
    eprintln!("  {} {}", "Slug:".dimmed(), article.slug.bright_white());
    if let Some(original) = &article.original_article_id {
        eprintln!("  {} {}", "Original:".dimmed(), original.bright_white());
    }
    if !article.excerpt.is_empty() {
        eprintln!("  {} {}", "Excerpt:".dimmed(), article.excerpt);
    }
    eprintln!();

    println!("{}", article.content);
}

/// Print the references a rewrite was built from
pub fn print_references(references: &[ReferenceLink]) {
    eprintln!("\n{}", "References".bold().cyan());
    for (i, link) in references.iter().enumerate() {
        eprintln!("  {}. {} {}", i + 1, link.title, link.url.bright_blue().underline());
    }
    eprintln!();
}

/// Print one line per article: kind, created date, id, title
pub fn print_article_table(articles: &[Article]) {
    if articles.is_empty() {
        print_info("No articles stored");
        return;
    }

    for article in articles {
        let kind = if article.is_original { "original".green().to_string() } else { "improved".magenta().to_string() };
        println!(
            "{:<8} {} {} {}",
            kind,
            article.created_at.date().to_string().dimmed(),
            article.id.bright_white(),
            truncate_title(&article.title)
        );
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        title.to_string()
    } else {
        let cut: String = title.chars().take(TITLE_WIDTH - 1).collect();
        format!("{}…", cut)
    }
}
