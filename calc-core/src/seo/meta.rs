//! `<head>` tags for a page: title, description, canonical link, Open Graph
//! and Twitter card.

use serde::{Deserialize, Serialize};

use super::{absolute_url, escape_markup};
use crate::calculator::CalculatorMeta;
use crate::content::{BlogPost, SEO_DESCRIPTION_MAX, truncate_chars};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OgType {
    #[default]
    Website,
    Article,
}

impl OgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Article => "article",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub keywords: Vec<String>,
    pub og_type: OgType,
    pub image: Option<String>,
}

impl PageMeta {
    pub fn new(
        title: &str,
        description: &str,
        canonical: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: truncate_chars(description, SEO_DESCRIPTION_MAX),
            canonical: canonical.to_string(),
            keywords: Vec::new(),
            og_type: OgType::Website,
            image: None,
        }
    }

    pub fn for_calculator(
        meta: &CalculatorMeta,
        base_url: &str,
        site_name: &str,
    ) -> Self {
        let mut page = Self::new(
            &format!("{} | {site_name}", meta.title),
            meta.description,
            &absolute_url(base_url, &format!("/calculators/{}", meta.slug)),
        );
        page.keywords = vec![
            meta.title.to_lowercase(),
            meta.category.label().to_lowercase(),
            "calculator".to_string(),
        ];
        page
    }

    pub fn for_post(
        post: &BlogPost,
        base_url: &str,
    ) -> Self {
        let title = if post.seo_title.is_empty() { &post.title } else { &post.seo_title };
        let description = if post.seo_description.is_empty() {
            &post.excerpt
        } else {
            &post.seo_description
        };
        let mut page = Self::new(title, description, &absolute_url(base_url, &format!("/blog/{}", post.slug)));
        page.keywords = post.keywords.clone();
        page.og_type = OgType::Article;
        page
    }

    pub fn with_image(
        mut self,
        url: &str,
    ) -> Self {
        self.image = Some(url.to_string());
        self
    }

    /// One tag per line, values HTML-escaped.
    pub fn render(&self) -> String {
        let title = escape_markup(&self.title);
        let description = escape_markup(&self.description);
        let canonical = escape_markup(&self.canonical);

        let mut tags = vec![
            format!("<title>{title}</title>"),
            format!("<meta name=\"description\" content=\"{description}\">"),
        ];
        if !self.keywords.is_empty() {
            tags.push(format!(
                "<meta name=\"keywords\" content=\"{}\">",
                escape_markup(&self.keywords.join(", "))
            ));
        }
        tags.push(format!("<link rel=\"canonical\" href=\"{canonical}\">"));

        tags.push(format!("<meta property=\"og:title\" content=\"{title}\">"));
        tags.push(format!("<meta property=\"og:description\" content=\"{description}\">"));
        tags.push(format!("<meta property=\"og:type\" content=\"{}\">", self.og_type.as_str()));
        tags.push(format!("<meta property=\"og:url\" content=\"{canonical}\">"));

        let card = if self.image.is_some() { "summary_large_image" } else { "summary" };
        tags.push(format!("<meta name=\"twitter:card\" content=\"{card}\">"));
        tags.push(format!("<meta name=\"twitter:title\" content=\"{title}\">"));
        tags.push(format!("<meta name=\"twitter:description\" content=\"{description}\">"));

        if let Some(image) = &self.image {
            let image = escape_markup(image);
            tags.push(format!("<meta property=\"og:image\" content=\"{image}\">"));
            tags.push(format!("<meta name=\"twitter:image\" content=\"{image}\">"));
        }

        tags.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::calculator::Category;

    #[test]
    fn long_description_is_cut_to_160_chars() {
        let meta = PageMeta::new("T", &"é".repeat(400), "https://calc.test/");

        assert_eq!(meta.description.chars().count(), 160);
        assert!(meta.description.ends_with('…'));
    }

    #[test]
    fn values_are_escaped() {
        let rendered = PageMeta::new("Tips & \"Tricks\"", "<b>bold</b>", "https://calc.test/").render();

        assert!(rendered.contains("<title>Tips &amp; &quot;Tricks&quot;</title>"));
        assert!(rendered.contains("content=\"&lt;b&gt;bold&lt;/b&gt;\""));
    }

    #[test]
    fn calculator_meta_points_at_its_route() {
        let meta = CalculatorMeta {
            slug: "loan",
            title: "Loan Calculator",
            category: Category::Finance,
            description: "Monthly payment and total interest.",
            live: false,
        };

        let page = PageMeta::for_calculator(&meta, "https://calc.test/", "Calculator Hub");

        assert_eq!(page.title, "Loan Calculator | Calculator Hub");
        assert_eq!(page.canonical, "https://calc.test/calculators/loan");
        assert!(page.render().contains("<link rel=\"canonical\" href=\"https://calc.test/calculators/loan\">"));
    }

    #[test]
    fn image_switches_to_large_card() {
        let rendered = PageMeta::new("T", "D", "https://calc.test/")
            .with_image("https://calc.test/og.png")
            .render();

        assert!(rendered.contains("content=\"summary_large_image\""));
        assert!(rendered.contains("<meta property=\"og:image\" content=\"https://calc.test/og.png\">"));
    }

    #[test]
    fn no_keywords_tag_without_keywords() {
        let rendered = PageMeta::new("T", "D", "https://calc.test/").render();

        assert!(!rendered.contains("name=\"keywords\""));
        assert!(rendered.starts_with("<title>T</title>\n<meta name=\"description\" content=\"D\">"));
    }
}
