//! Blog post model shared by the AI draft generator and the sitemap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEYWORDS: usize = 10;
pub const SEO_TITLE_MAX: usize = 60;
pub const SEO_DESCRIPTION_MAX: usize = 160;
pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("topic is required")]
    MissingTopic,

    #[error("at most 10 keywords are allowed, got {0}")]
    TooManyKeywords(usize),

    #[error("invalid blog manifest: {0}")]
    Manifest(String),
}

/// Arguments of the remote blog-generation function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPostRequest {
    pub topic: String,
    pub category: String,
    pub keywords: Vec<String>,
}

impl BlogPostRequest {
    /// Trims every field, drops blank keywords and checks the limits.
    pub fn new(
        topic: &str,
        category: &str,
        keywords: &[String],
    ) -> Result<Self, ContentError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ContentError::MissingTopic);
        }
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.len() > MAX_KEYWORDS {
            return Err(ContentError::TooManyKeywords(keywords.len()));
        }
        Ok(Self {
            topic: topic.to_string(),
            category: category.trim().to_string(),
            keywords,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub introduction: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub conclusion: String,
}

impl PostContent {
    pub fn word_count(&self) -> usize {
        std::iter::once(self.introduction.as_str())
            .chain(
                self.sections
                    .iter()
                    .flat_map(|s| [s.heading.as_str(), s.content.as_str()]),
            )
            .chain(std::iter::once(self.conclusion.as_str()))
            .map(|text| text.split_whitespace().count())
            .sum()
    }
}

/// A generated post, in the JSON shape the remote function returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub content: PostContent,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub read_time: String,
}

impl BlogPost {
    /// Fills blanks the generator left out and clamps SEO fields to what
    /// search engines display.
    pub fn normalize(mut self) -> Self {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        } else {
            self.slug = slugify(&self.slug);
        }
        if self.seo_title.trim().is_empty() {
            self.seo_title = self.title.clone();
        }
        if self.seo_description.trim().is_empty() {
            self.seo_description = self.excerpt.clone();
        }
        self.seo_title = truncate_chars(&self.seo_title, SEO_TITLE_MAX);
        self.seo_description = truncate_chars(&self.seo_description, SEO_DESCRIPTION_MAX);
        if self.read_time.trim().is_empty() {
            self.read_time = estimate_read_time(&self.content);
        }
        self.keywords.truncate(MAX_KEYWORDS);
        self
    }
}

/// URL slug: lowercase ASCII alphanumerics joined by single dashes.
///
/// ```
/// use calc_core::content::slugify;
///
/// assert_eq!(slugify("  How to Calculate APR (2024)! "), "how-to-calculate-apr-2024");
/// ```
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `"N min read"` at 200 words per minute, at least one minute.
pub fn estimate_read_time(content: &PostContent) -> String {
    let minutes = content.word_count().div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// Cuts `text` to at most `max` characters on a char boundary, ending in an
/// ellipsis when shortened.
pub fn truncate_chars(
    text: &str,
    max: usize,
) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

/// One published post as listed in the site's post manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub slug: String,
    pub date: Option<NaiveDate>,
}

/// The list of published posts (a JSON array of `{slug, date}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlogManifest {
    pub posts: Vec<ManifestEntry>,
}

impl BlogManifest {
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        serde_json::from_str(json).map_err(|e| ContentError::Manifest(e.to_string()))
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.posts.iter().map(|p| p.slug.as_str())
    }
}
