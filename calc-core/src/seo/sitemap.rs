//! `sitemap.xml` per the sitemaps.org 0.9 protocol.
//!
//! | Route                        | Priority | Change frequency |
//! |------------------------------|----------|------------------|
//! | `/`                          | 1.0      | daily            |
//! | other static pages           | 0.8      | monthly          |
//! | `/calculators/{slug}`        | 0.9      | weekly           |
//! | `/blog/{slug}`               | 0.7      | monthly          |
//! | `/calculators#{category}`    | 0.6      | weekly           |

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{absolute_url, escape_markup};

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub changefreq: ChangeFreq,
    /// 0.0 to 1.0.
    pub priority: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sitemap {
    pub entries: Vec<SitemapEntry>,
}

impl Sitemap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(
        &self,
        loc: &str,
    ) -> bool {
        self.entries.iter().any(|e| e.loc == loc)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(xml, "<urlset xmlns=\"{SITEMAP_NAMESPACE}\">");
        for entry in &self.entries {
            xml.push_str("  <url>\n");
            let _ = writeln!(xml, "    <loc>{}</loc>", escape_markup(&entry.loc));
            if let Some(lastmod) = entry.lastmod {
                let _ = writeln!(xml, "    <lastmod>{}</lastmod>", lastmod.format("%Y-%m-%d"));
            }
            let _ = writeln!(xml, "    <changefreq>{}</changefreq>", entry.changefreq.as_str());
            let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority.clamp(0.0, 1.0));
            xml.push_str("  </url>\n");
        }
        xml.push_str("</urlset>\n");
        xml
    }
}

/// Collects routes in insertion order. A location added twice keeps its
/// first entry.
pub struct SitemapBuilder {
    base_url: String,
    lastmod: Option<NaiveDate>,
    seen: HashSet<String>,
    entries: Vec<SitemapEntry>,
}

impl SitemapBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            lastmod: None,
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Date stamped on entries that have no date of their own.
    pub fn lastmod(
        mut self,
        date: NaiveDate,
    ) -> Self {
        self.lastmod = Some(date);
        self
    }

    pub fn entry(
        &mut self,
        path: &str,
        changefreq: ChangeFreq,
        priority: f32,
        lastmod: Option<NaiveDate>,
    ) -> &mut Self {
        let loc = absolute_url(&self.base_url, path);
        if self.seen.insert(loc.clone()) {
            self.entries.push(SitemapEntry {
                loc,
                lastmod: lastmod.or(self.lastmod),
                changefreq,
                priority,
            });
        }
        self
    }

    pub fn static_route(
        &mut self,
        path: &str,
    ) -> &mut Self {
        if path == "/" || path.is_empty() {
            self.entry("/", ChangeFreq::Daily, 1.0, None)
        } else {
            self.entry(path, ChangeFreq::Monthly, 0.8, None)
        }
    }

    pub fn calculator(
        &mut self,
        slug: &str,
    ) -> &mut Self {
        self.entry(&format!("/calculators/{slug}"), ChangeFreq::Weekly, 0.9, None)
    }

    pub fn blog_post(
        &mut self,
        slug: &str,
        published: Option<NaiveDate>,
    ) -> &mut Self {
        self.entry(&format!("/blog/{slug}"), ChangeFreq::Monthly, 0.7, published)
    }

    pub fn category(
        &mut self,
        slug: &str,
    ) -> &mut Self {
        self.entry(&format!("/calculators#{slug}"), ChangeFreq::Weekly, 0.6, None)
    }

    pub fn build(self) -> Sitemap {
        Sitemap {
            entries: self.entries,
        }
    }
}
