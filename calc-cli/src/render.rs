//! Plain-text rendering of catalog listings, result cards, the admin
//! dashboard and blog drafts.

use std::fmt::Write as _;

use calc_core::admin::{AdminDashboard, AuthState, Section};
use calc_core::content::BlogPost;
use calc_core::presentation::{format_field, format_grouped};
use calc_core::{CalculationResult, Catalog, Category, Notice, NoticeLevel};

const BAR_WIDTH: usize = 30;
const DASHBOARD_ROWS: usize = 10;

pub fn render_catalog(
    catalog: &Catalog,
    only: Option<Category>,
) -> String {
    let mut out = String::new();
    for category in Category::all() {
        if only.is_some_and(|c| c != *category) {
            continue;
        }
        let calculators = catalog.by_category(*category);
        if calculators.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({})", category.label(), calculators.len());
        for calculator in calculators {
            let meta = calculator.meta();
            let live = if meta.live { "  [live]" } else { "" };
            let _ = writeln!(out, "  {:<28} {}{}", meta.slug, meta.title, live);
        }
        out.push('\n');
    }
    out
}

/// Result card: primary value, breakdown, formula, then the chart as bars.
pub fn render_result(
    title: &str,
    result: &CalculationResult,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "─".repeat(title.chars().count()));
    let _ = writeln!(out, "{}: {}", result.primary.label, format_field(&result.primary));

    if !result.secondary.is_empty() {
        let width = result
            .secondary
            .iter()
            .map(|f| f.label.chars().count())
            .max()
            .unwrap_or(0);
        out.push('\n');
        for field in &result.secondary {
            let _ = writeln!(out, "  {:<width$}  {}", field.label, format_field(field));
        }
    }

    if let Some(formula) = &result.formula {
        let _ = writeln!(out, "\nFormula: {formula}");
    }

    if let Some(chart) = &result.chart {
        let max = chart
            .points
            .iter()
            .map(|p| p.value.abs())
            .fold(0.0_f64, f64::max);
        let width = chart
            .points
            .iter()
            .map(|p| p.name.chars().count())
            .max()
            .unwrap_or(0);
        let _ = writeln!(out, "\nChart ({:?}):", chart.kind);
        for point in &chart.points {
            let len = if max > 0.0 {
                ((point.value.abs() / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let _ = writeln!(
                out,
                "  {:<width$}  {:<BAR_WIDTH$}  {}",
                point.name,
                "█".repeat(len),
                format_grouped(point.value)
            );
        }
    }
    out
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| {
            let tag = match n.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Error => "error",
            };
            format!("[{tag}] {}\n", n.message)
        })
        .collect()
}

fn render_section<T>(
    out: &mut String,
    title: &str,
    section: &Section<T>,
    line: impl Fn(&T) -> String,
) {
    match section {
        Section::NotLoaded => {}
        Section::Failed(e) => {
            let _ = writeln!(out, "{title}: unavailable ({e})\n");
        }
        Section::Loaded(rows) => {
            let _ = writeln!(out, "{title} ({} rows)", rows.len());
            for row in rows.iter().take(DASHBOARD_ROWS) {
                let _ = writeln!(out, "  {}", line(row));
            }
            if rows.len() > DASHBOARD_ROWS {
                let _ = writeln!(out, "  … {} more", rows.len() - DASHBOARD_ROWS);
            }
            out.push('\n');
        }
    }
}

pub fn render_dashboard(dashboard: &AdminDashboard<'_>) -> String {
    let mut out = String::new();
    if dashboard.state() != AuthState::Authorized {
        out.push_str("Access denied: the admin role is required.\n");
        out.push_str(&render_notices(dashboard.notices()));
        return out;
    }

    let summary = dashboard.summary();
    let _ = writeln!(
        out,
        "Subscribers: {}   Messages: {} ({} unread)   Events: {}\n",
        summary.subscribers, summary.messages, summary.unread_messages, summary.events
    );
    for (kind, count) in &summary.events_by_type {
        let _ = writeln!(out, "  {kind:<16} {count}");
    }
    if !summary.events_by_type.is_empty() {
        out.push('\n');
    }

    render_section(&mut out, "Subscribers", dashboard.subscribers(), |s| {
        format!(
            "{}  {}  {}",
            s.subscribed_at.format("%Y-%m-%d"),
            s.email,
            s.source.as_deref().unwrap_or("-")
        )
    });
    render_section(&mut out, "Contact messages", dashboard.messages(), |m| {
        format!(
            "{} {}  {} <{}>  {}",
            if m.is_read { " " } else { "*" },
            m.created_at.format("%Y-%m-%d"),
            m.name,
            m.email,
            m.subject.as_deref().unwrap_or("(no subject)")
        )
    });
    render_section(&mut out, "Analytics events", dashboard.events(), |e| {
        format!(
            "{}  {:<14} {}",
            e.created_at.format("%Y-%m-%d %H:%M"),
            e.event_type,
            e.page.as_deref().unwrap_or("-")
        )
    });

    out.push_str(&render_notices(dashboard.notices()));
    out
}

/// Markdown view of a generated post.
pub fn render_post(post: &BlogPost) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", post.title);
    let byline: Vec<&str> = [post.author.as_str(), post.read_time.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !byline.is_empty() {
        let _ = writeln!(out, "_{}_\n", byline.join(" · "));
    }
    let _ = writeln!(out, "{}\n", post.content.introduction);
    for section in &post.content.sections {
        let _ = writeln!(out, "## {}\n\n{}\n", section.heading, section.content);
    }
    let _ = writeln!(out, "{}", post.content.conclusion);
    let _ = writeln!(
        out,
        "\n---\nslug: {}\nseo title: {}\nseo description: {}",
        post.slug, post.seo_title, post.seo_description
    );
    if !post.keywords.is_empty() {
        let _ = writeln!(out, "keywords: {}", post.keywords.join(", "));
    }
    out
}
