use std::{env, fs, path::PathBuf};

fn llm_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(--api_key <KEY> "Generation API key").env("GROQ_API_KEY").hide_env_values(true))
        .arg(clap::arg!(--model <MODEL> "Generation model identifier").env("REPRISE_MODEL"))
        .arg(
            clap::arg!(--base_url <URL> "Base URL of the OpenAI-compatible generation API")
                .env("REPRISE_LLM_BASE_URL"),
        )
}

fn search_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::arg!(--own_domain <DOMAIN> "Domain excluded from results as a self-reference")
            .default_value("beyondchats.com"),
    )
    .arg(clap::arg!(--include_own_domain "Keep results from the own domain"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir)?;

    let improve = clap::Command::new("improve")
        .about("Improve a stored original article and store the rewrite")
        .arg(clap::arg!(<ID> "Article id or slug"))
        .arg(clap::arg!(--references <NUM> "Number of search results to use as references").default_value("2"))
        .arg(clap::arg!(--delay_ms <MS> "Wait between reference fetches in milliseconds").default_value("1500"));

    let search = clap::Command::new("search")
        .about("Search for candidate reference articles")
        .arg(clap::arg!(<QUERY> "Search query, usually an article title"))
        .arg(clap::arg!(-n --count <NUM> "Maximum number of results").default_value("2"));

    let mut cmd = clap::Command::new("reprise")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Reprise Contributors")
        .about("Rewrite stored articles from web-search references")
        .arg(
            clap::arg!(--store <PATH> "Article store file")
                .global(true)
                .env("REPRISE_STORE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (text, json)")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds for search and page fetches").global(true).default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for search and page fetches").global(true))
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(search_args(llm_args(improve)))
        .subcommand(search_args(search))
        .subcommand(
            clap::Command::new("extract")
                .about("Fetch a page and extract its article title and body")
                .arg(clap::arg!(<URL> "Page URL")),
        )
        .subcommand(
            clap::Command::new("add")
                .about("Add an original article to the store")
                .arg(clap::arg!(--title <TITLE> "Article title").required(true))
                .arg(
                    clap::arg!(--content_file <FILE> "File holding the article body (HTML or plain text)")
                        .required(true)
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(clap::arg!(--author <AUTHOR> "Author name"))
                .arg(clap::arg!(--source_url <URL> "Where the article was originally published"))
                .arg(clap::arg!(--image_url <URL> "Cover image")),
        )
        .subcommand(
            clap::Command::new("list").about("List stored articles, newest first").arg(
                clap::arg!(--kind <KIND> "Which articles to list")
                    .default_value("all")
                    .value_parser(["all", "original", "improved"]),
            ),
        )
        .subcommand(llm_args(
            clap::Command::new("health").about("Check that the generation backend accepts the configured credentials"),
        ));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "reprise", &completions_dir)?;
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "reprise", &completions_dir)?;
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "reprise", &completions_dir)?;
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "reprise", &completions_dir)?;

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );

    Ok(())
}
