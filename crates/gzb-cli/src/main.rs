use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gzb_core::CanonicalArticle;
use gzb_sync::{ArticleService, SiteConfig};
use gzb_web::{AppState, DEFAULT_PORT};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "gzb-cli")]
#[command(about = "Blog content pipeline command-line interface")]
struct Cli {
    /// Directory holding sync snapshots (overrides GZB_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the JSON API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// List processed articles, newest first.
    Articles {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Print one article as JSON.
    Article { id: String },
    /// Print home page data as JSON.
    Home,
    /// Print snapshot sync statistics as JSON.
    SyncInfo,
    /// Run the pipeline once and print the batch report.
    Report,
    /// Show which snapshot and account files would be read.
    Locate,
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GZB_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing output")?
    );
    Ok(())
}

fn article_line(article: &CanonicalArticle) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        article.publish_time, article.category_id, article.id, article.title
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = SiteConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let service = ArticleService::new(&config);

    match cli.command.unwrap_or(Commands::Articles {
        category: None,
        limit: 20,
        json: false,
    }) {
        Commands::Serve { port } => {
            let port = port
                .or_else(|| std::env::var("GZB_WEB_PORT").ok().and_then(|v| v.parse().ok()))
                .unwrap_or(DEFAULT_PORT);
            tracing::info!(data_dir = %config.data_dir.display(), "starting server");
            gzb_web::serve(AppState::new(service), port).await?;
        }
        Commands::Articles {
            category,
            limit,
            json,
        } => {
            let articles = match category {
                Some(id) => service.articles_by_category(&id),
                None => service.all_articles().as_ref().clone(),
            };
            let shown: Vec<_> = articles.into_iter().take(limit).collect();
            if json {
                print_json(&shown)?;
            } else {
                for article in &shown {
                    println!("{}", article_line(article));
                }
            }
        }
        Commands::Article { id } => {
            let article = service
                .article_by_id(&id)
                .with_context(|| format!("no article with id {id}"))?;
            print_json(&article)?;
        }
        Commands::Home => print_json(&service.home_data())?,
        Commands::SyncInfo => print_json(&service.sync_info())?,
        Commands::Report => {
            let batch = service
                .process_uncached()
                .context("no readable sync snapshot")?;
            print_json(&batch.report)?;
        }
        Commands::Locate => {
            let locator = service.source().locator();
            match locator.locate() {
                Some(path) => println!("snapshot: {}", path.display()),
                None => println!("snapshot: none under {}", locator.dir().display()),
            }
            match service.account_info_locator().locate() {
                Some(path) => println!("account info: {}", path.display()),
                None => println!("account info: none"),
            }
        }
    }

    Ok(())
}
