use std::path::PathBuf;

use anyhow::{Context, Result};
use calc_core::Catalog;
use calc_core::content::BlogManifest;
use calc_site::{build_sitemap, load_manifest, write_sitemap};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Generate sitemap.xml for the calculator site.
///
/// Lists the static pages, every calculator in the catalog, the published
/// blog posts and one anchor per calculator category.
#[derive(Parser, Debug)]
#[command(name = "sitemap-gen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Public origin of the site
    #[arg(short, long, env = "CALCSITE_BASE_URL", default_value = "https://calculatorhub.example")]
    base_url: String,

    /// Where to write the sitemap
    #[arg(short, long, default_value = "public/sitemap.xml")]
    out: PathBuf,

    /// JSON manifest of published blog posts
    #[arg(short, long)]
    posts: Option<PathBuf>,

    /// Last-modified date (YYYY-MM-DD) for entries without their own date
    #[arg(short, long)]
    lastmod: Option<NaiveDate>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let args = Args::parse();

    let manifest = match &args.posts {
        Some(path) => load_manifest(path)
            .with_context(|| format!("Failed to load post manifest: {}", path.display()))?,
        None => BlogManifest::default(),
    };

    let catalog = Catalog::builtin();
    let sitemap = build_sitemap(&args.base_url, &catalog, &manifest, args.lastmod);

    let written = write_sitemap(&args.out, &sitemap)
        .with_context(|| format!("Failed to write sitemap: {}", args.out.display()))?;

    println!("Wrote {} URLs to {}", written, args.out.display());
    Ok(())
}
