use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use calc_cli::app::{self, CalcOptions};
use calc_cli::config::{DEFAULT_CONFIG_PATH, SiteConfig};
use calc_cli::remote::HttpContentGenerator;
use calc_cli::{logging, render};
use calc_core::content::BlogPostRequest;
use calc_core::{Catalog, Category, RequestScope};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Calculator site engine.
///
/// Runs the built-in calculators, renders the admin dashboard from the
/// configured backend, drafts blog posts and prints per-page SEO tags.
#[derive(Debug, Parser)]
struct Cli {
    /// Path to the TOML configuration file. Missing files mean defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Backend connection string, overriding `[backend] connection_string`.
    /// For SQLite this is a file path (e.g. `calcsite.db`) or `:memory:`.
    #[arg(long)]
    db: Option<String>,

    /// Public site URL, overriding `[site] base_url`.
    #[arg(long, env = "CALCSITE_BASE_URL")]
    base_url: Option<String>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List calculators, grouped by category.
    List {
        /// Only show one category (e.g. `finance`, `health`).
        #[arg(long)]
        category: Option<String>,
    },

    /// Run one calculator with `key=value` inputs.
    Calc {
        slug: String,

        inputs: Vec<String>,

        /// Also print the printable summary.
        #[arg(long)]
        print: bool,

        /// Also emit the copy-to-clipboard block.
        #[arg(long)]
        copy: bool,

        /// Print the result as JSON instead of a result card.
        #[arg(long)]
        json: bool,

        /// Store the calculation in the backend's analytics log.
        #[arg(long)]
        record: bool,
    },

    /// Show the admin dashboard.
    Admin {
        /// Session access token.
        #[arg(long, env = "CALCSITE_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Draft a blog post with the hosted content function.
    Blog {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "")]
        category: String,

        /// Repeat for several keywords.
        #[arg(long = "keyword")]
        keywords: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Print head tags and JSON-LD for a calculator or category slug.
    Meta { slug: String },
}

// ─── helpers ─────────────────────────────────────────────────────────────────

/// Drives `work` to completion. Ctrl-C cancels `scope`, after which `work`
/// is expected to resolve promptly with a cancellation error.
async fn until_interrupted<T>(
    scope: &RequestScope,
    work: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    tokio::pin!(work);
    tokio::select! {
        result = &mut work => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling pending requests");
            scope.cancel();
            work.await
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SiteConfig> {
    let mut config = SiteConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(db) = &cli.db {
        config.backend.connection_string = db.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.site.base_url = base_url.clone();
    }
    Ok(config)
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    logging::init_logging(&config.logging.level);
    if cli.verbose {
        logging::set_log_level("debug")?;
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }
    debug!(config = %cli.config.display(), "Configuration loaded");

    let catalog = Catalog::builtin();
    let mut out = io::stdout().lock();

    match cli.command {
        Command::List { category } => {
            let only = match category.as_deref() {
                Some(slug) => match Category::parse(slug) {
                    Some(category) => Some(category),
                    None => bail!("unknown category '{slug}'"),
                },
                None => None,
            };
            write!(out, "{}", render::render_catalog(&catalog, only))?;
        }

        Command::Calc {
            slug,
            inputs,
            print,
            copy,
            json,
            record,
        } => {
            let inputs = app::parse_inputs(&inputs)?;
            let options = CalcOptions {
                print,
                copy,
                json,
                record,
            };
            let backend = if record {
                Some(app::open_backend(&config).await?)
            } else {
                None
            };
            let outcome = app::run_calc(
                &mut out,
                &catalog,
                &slug,
                &inputs,
                options,
                &config,
                backend.as_deref(),
            )
            .await?;
            if outcome.result.is_none() {
                out.flush()?;
                std::process::exit(1);
            }
        }

        Command::Admin { token } => {
            let backend = app::open_backend(&config).await?;
            let scope = RequestScope::new();
            let handle = scope.handle();
            until_interrupted(
                &scope,
                app::run_admin(
                    &mut out,
                    backend.as_ref(),
                    token.as_deref(),
                    config.dashboard_limits(),
                    &handle,
                ),
            )
            .await?;
        }

        Command::Blog {
            topic,
            category,
            keywords,
            json,
        } => {
            let Some(url) = config.content.function_url.as_deref() else {
                bail!("no content function configured; set [content] function_url");
            };
            let request = BlogPostRequest::new(&topic, &category, &keywords)?;
            let generator = HttpContentGenerator::new(url, config.content.api_key.clone())?;
            let scope = RequestScope::new();
            let handle = scope.handle();
            until_interrupted(
                &scope,
                app::run_blog(&mut out, &generator, &request, json, &config, &handle),
            )
            .await?;
        }

        Command::Meta { slug } => app::run_meta(&mut out, &catalog, &slug, &config)?,
    }

    out.flush()?;
    Ok(())
}
