//! Command implementations behind the `calcsite` binary.
//!
//! Every command writes to a caller-supplied [`Write`] so the integration
//! tests can drive them without a terminal.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use calc_core::admin::{AdminDashboard, AuthState, DashboardLimits};
use calc_core::content::{BlogPost, BlogPostRequest};
use calc_core::page::{ChannelObserver, forward_analytics};
use calc_core::presentation::{PrintSummary, copy_to_clipboard};
use calc_core::seo::{Article, ItemList, PageMeta, WebApplication, absolute_url, script_tag};
use calc_core::{
    BackendRegistry, CalculationResult, CalculatorPage, Catalog, Category, ContentGenerator, ScopeHandle,
    SiteBackend,
};
use calc_db_sqlite::SqliteBackendFactory;
use tracing::{debug, info};

use crate::clipboard::StdoutClipboard;
use crate::config::SiteConfig;
use crate::render::{render_dashboard, render_notices, render_post, render_result};

/// Room for the events one command can emit.
const EVENT_BUFFER: usize = 8;

/// Registry with every backend this binary ships with.
pub fn build_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(Box::new(SqliteBackendFactory));
    registry
}

pub async fn open_backend(config: &SiteConfig) -> Result<Box<dyn SiteBackend>> {
    let backend_config = config.backend_config();
    build_registry()
        .create(&backend_config)
        .await
        .with_context(|| {
            format!(
                "Failed to open '{}' backend at {}",
                backend_config.backend, backend_config.connection_string
            )
        })
}

/// Splits `key=value` arguments. Values may themselves contain `=`.
pub fn parse_inputs(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| anyhow!("expected key=value, got '{arg}'"))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("missing input name in '{arg}'");
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalcOptions {
    pub print: bool,
    pub copy: bool,
    pub json: bool,
    pub record: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalcOutcome {
    /// `None` when validation or the formula failed.
    pub result: Option<CalculationResult>,
    pub recorded: usize,
}

/// Fills one calculator page from `inputs`, runs it and writes the result
/// card plus whatever `options` asks for. Failed calculations are reported
/// through the page's notices, not as an `Err`.
pub async fn run_calc(
    out: &mut dyn Write,
    catalog: &Catalog,
    slug: &str,
    inputs: &[(String, String)],
    options: CalcOptions,
    config: &SiteConfig,
    backend: Option<&dyn SiteBackend>,
) -> Result<CalcOutcome> {
    let calculator = catalog.require(slug)?;
    let mut page = CalculatorPage::new(calculator).with_policy(config.page.result_policy);

    for (key, value) in inputs {
        if !page.fields().iter().any(|f| &f.key == key) {
            let known: Vec<&str> = page.fields().iter().map(|f| f.key.as_str()).collect();
            bail!("unknown input '{key}' for {slug}; expected one of: {}", known.join(", "));
        }
        page.set_input(key, value);
    }

    // Seeding inputs may recompute live pages; only the run itself is recorded.
    let events = match backend {
        Some(_) if options.record => {
            let (observer, events) = ChannelObserver::new(EVENT_BUFFER);
            page.add_observer(Box::new(observer));
            Some(events)
        }
        _ => None,
    };

    let title = page.meta().title;
    let result = page
        .calculate_with_delay(config.calculating_delay())
        .await
        .ok()
        .cloned();

    match &result {
        Some(result) if options.json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            writeln!(out)?;
        }
        Some(result) => write!(out, "{}", render_result(title, result))?,
        None => debug!(slug, "Calculation failed"),
    }

    if let Some(result) = &result {
        if options.print {
            if let Some(summary) = PrintSummary::from_page(&page) {
                write!(out, "\n{}", summary.render_text())?;
            }
        }
        if options.copy {
            let mut clipboard = StdoutClipboard::with_writer(&mut *out);
            let notice = copy_to_clipboard(&mut clipboard, title, result);
            write!(out, "{}", render_notices(&[notice]))?;
        }
    }
    write!(out, "{}", render_notices(&page.take_notices()))?;

    // The page owns the only sender; dropping it lets the forwarder finish.
    drop(page);
    let recorded = match (backend, events) {
        (Some(backend), Some(events)) => forward_analytics(backend, events).await,
        _ => 0,
    };
    if recorded > 0 {
        info!(slug, recorded, "Recorded calculation events");
    }

    Ok(CalcOutcome { result, recorded })
}

/// Authenticates `token`, loads the dashboard inside `scope` and renders it.
pub async fn run_admin(
    out: &mut dyn Write,
    backend: &dyn SiteBackend,
    token: Option<&str>,
    limits: DashboardLimits,
    scope: &ScopeHandle,
) -> Result<AuthState> {
    let mut dashboard = AdminDashboard::with_limits(backend, limits);
    let state = dashboard
        .load(token, scope)
        .await
        .context("Admin dashboard closed before it finished loading")?;

    write!(out, "{}", render_dashboard(&dashboard))?;
    Ok(state)
}

/// Requests a draft post and writes it with its head tags and JSON-LD.
pub async fn run_blog(
    out: &mut dyn Write,
    generator: &dyn ContentGenerator,
    request: &BlogPostRequest,
    json: bool,
    config: &SiteConfig,
    scope: &ScopeHandle,
) -> Result<BlogPost> {
    info!(topic = %request.topic, "Generating blog post");
    let post = scope
        .run(generator.generate_post(request))
        .await
        .context("Blog generation cancelled")?
        .context("Blog generation failed")?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &post)?;
        writeln!(out)?;
        return Ok(post);
    }

    write!(out, "{}", render_post(&post))?;
    let meta = PageMeta::for_post(&post, &config.site.base_url);
    let article = Article::from_post(&post, &config.site.base_url, &config.site.name);
    writeln!(out, "\n{}", meta.render())?;
    writeln!(out, "{}", script_tag(&article)?)?;
    Ok(post)
}

/// Head tags and JSON-LD for a calculator slug or a category slug.
pub fn run_meta(
    out: &mut dyn Write,
    catalog: &Catalog,
    slug: &str,
    config: &SiteConfig,
) -> Result<()> {
    let base_url = &config.site.base_url;

    if let Some(calculator) = catalog.get(slug) {
        let meta = calculator.meta();
        let page = PageMeta::for_calculator(&meta, base_url, &config.site.name);
        writeln!(out, "{}", page.render())?;
        writeln!(out, "{}", script_tag(&WebApplication::for_calculator(&meta, base_url))?)?;
        return Ok(());
    }

    let Some(category) = Category::parse(slug) else {
        bail!("'{slug}' is neither a calculator nor a category");
    };
    let metas: Vec<_> = catalog
        .by_category(category)
        .iter()
        .map(|c| c.meta())
        .collect();
    let title = format!("{} Calculators", category.label());
    let page = PageMeta::new(
        &format!("{title} | {}", config.site.name),
        &format!("Free online {} calculators.", category.label().to_lowercase()),
        &absolute_url(base_url, &format!("/calculators#{}", category.slug())),
    );
    writeln!(out, "{}", page.render())?;
    writeln!(out, "{}", script_tag(&ItemList::for_calculators(&title, base_url, &metas))?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn inputs_split_on_first_equals() {
        let parsed = parse_inputs(&args(&["weight=70", " height = 175 ", "note=a=b"])).unwrap();

        assert_eq!(
            parsed,
            vec![
                ("weight".to_string(), "70".to_string()),
                ("height".to_string(), "175".to_string()),
                ("note".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn inputs_without_equals_are_rejected() {
        assert!(parse_inputs(&args(&["weight"])).is_err());
        assert!(parse_inputs(&args(&["=70"])).is_err());
    }

    #[test]
    fn registry_knows_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[test]
    fn meta_for_unknown_slug_fails() {
        let mut out = Vec::new();

        let err = run_meta(&mut out, &Catalog::builtin(), "nope", &SiteConfig::default()).unwrap_err();

        assert!(err.to_string().contains("neither a calculator nor a category"));
    }
}
