//! schema.org JSON-LD documents.
//!
//! Property names follow the schema.org vocabulary exactly (`@context`,
//! `@type`, `datePublished`, `itemListElement`, ...). Optional properties are
//! omitted rather than emitted as `null`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::absolute_url;
use crate::calculator::{Category, CalculatorMeta};
use crate::content::BlogPost;

pub const SCHEMA_CONTEXT: &str = "https://schema.org";

fn schema_context() -> String {
    SCHEMA_CONTEXT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
}

impl Thing {
    pub fn person(name: &str) -> Self {
        Self {
            kind: "Person".to_string(),
            name: name.to_string(),
        }
    }

    pub fn organization(name: &str) -> Self {
        Self {
            kind: "Organization".to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "@context", default = "schema_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub headline: String,
    pub description: String,
    pub url: String,
    pub author: Thing,
    pub publisher: Thing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keywords: Vec<String>,
}

impl Article {
    pub fn from_post(
        post: &BlogPost,
        base_url: &str,
        site_name: &str,
    ) -> Self {
        let author = if post.author.trim().is_empty() {
            site_name
        } else {
            post.author.as_str()
        };
        Self {
            context: schema_context(),
            kind: "Article".to_string(),
            headline: post.title.clone(),
            description: if post.seo_description.is_empty() {
                post.excerpt.clone()
            } else {
                post.seo_description.clone()
            },
            url: absolute_url(base_url, &format!("/blog/{}", post.slug)),
            author: Thing::person(author),
            publisher: Thing::organization(site_name),
            date_published: post.date,
            keywords: post.keywords.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(rename = "@type")]
    pub kind: String,
    pub price: String,
    #[serde(rename = "priceCurrency")]
    pub price_currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebApplication {
    #[serde(rename = "@context", default = "schema_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub application_category: String,
    pub operating_system: String,
    pub offers: Offer,
}

impl WebApplication {
    /// A free, browser-based calculator page.
    pub fn for_calculator(
        meta: &CalculatorMeta,
        base_url: &str,
    ) -> Self {
        Self {
            context: schema_context(),
            kind: "WebApplication".to_string(),
            name: meta.title.to_string(),
            description: meta.description.to_string(),
            url: absolute_url(base_url, &format!("/calculators/{}", meta.slug)),
            application_category: application_category(meta.category).to_string(),
            operating_system: "Any".to_string(),
            offers: Offer {
                kind: "Offer".to_string(),
                price: "0".to_string(),
                price_currency: "USD".to_string(),
            },
        }
    }
}

fn application_category(category: Category) -> &'static str {
    match category {
        Category::Finance | Category::Tax => "FinanceApplication",
        Category::Health => "HealthApplication",
        Category::Math | Category::Science => "EducationalApplication",
        Category::Conversion | Category::Everyday => "UtilitiesApplication",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: String,
    /// 1-based.
    pub position: usize,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemList {
    #[serde(rename = "@context", default = "schema_context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub item_list_element: Vec<ListItem>,
}

impl ItemList {
    pub fn new(name: &str) -> Self {
        Self {
            context: schema_context(),
            kind: "ItemList".to_string(),
            name: name.to_string(),
            item_list_element: Vec::new(),
        }
    }

    pub fn item(
        mut self,
        name: &str,
        url: &str,
    ) -> Self {
        let position = self.item_list_element.len() + 1;
        self.item_list_element.push(ListItem {
            kind: "ListItem".to_string(),
            position,
            name: name.to_string(),
            url: url.to_string(),
        });
        self
    }

    /// The calculators of one category page, in catalog order.
    pub fn for_calculators<'m>(
        name: &str,
        base_url: &str,
        calculators: impl IntoIterator<Item = &'m CalculatorMeta>,
    ) -> Self {
        calculators.into_iter().fold(Self::new(name), |list, meta| {
            list.item(
                meta.title,
                &absolute_url(base_url, &format!("/calculators/{}", meta.slug)),
            )
        })
    }
}

/// Wraps a JSON-LD document in its `<script>` element. `</` is escaped so
/// text inside the document cannot close the element early.
pub fn script_tag<T: Serialize>(document: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(document)?.replace("</", "<\\/");
    Ok(format!("<script type=\"application/ld+json\">{json}</script>"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::content::PostContent;

    fn post() -> BlogPost {
        BlogPost {
            title: "APR vs APY".to_string(),
            slug: "apr-vs-apy".to_string(),
            excerpt: "What the two rates mean.".to_string(),
            seo_title: String::new(),
            seo_description: String::new(),
            keywords: vec!["apr".to_string()],
            content: PostContent {
                introduction: "Intro".to_string(),
                sections: Vec::new(),
                conclusion: "End".to_string(),
            },
            date: NaiveDate::from_ymd_opt(2024, 3, 15),
            author: String::new(),
            read_time: String::new(),
        }
    }

    #[test]
    fn article_uses_schema_org_names() {
        let article = Article::from_post(&post(), "https://calc.test/", "Calculator Hub");

        assert_eq!(
            serde_json::to_value(&article).unwrap(),
            json!({
                "@context": "https://schema.org",
                "@type": "Article",
                "headline": "APR vs APY",
                "description": "What the two rates mean.",
                "url": "https://calc.test/blog/apr-vs-apy",
                "author": {"@type": "Person", "name": "Calculator Hub"},
                "publisher": {"@type": "Organization", "name": "Calculator Hub"},
                "datePublished": "2024-03-15",
                "keywords": ["apr"],
            })
        );
    }

    #[test]
    fn undated_article_omits_date() {
        let mut post = post();
        post.date = None;

        let value = serde_json::to_value(Article::from_post(&post, "https://calc.test", "Hub")).unwrap();

        assert!(value.get("datePublished").is_none());
    }

    #[test]
    fn calculator_is_a_free_web_application() {
        let meta = CalculatorMeta {
            slug: "bmi",
            title: "BMI Calculator",
            category: Category::Health,
            description: "Body mass index.",
            live: false,
        };

        let value = serde_json::to_value(WebApplication::for_calculator(&meta, "https://calc.test")).unwrap();

        assert_eq!(value["@type"], "WebApplication");
        assert_eq!(value["applicationCategory"], "HealthApplication");
        assert_eq!(value["offers"]["price"], "0");
        assert_eq!(value["url"], "https://calc.test/calculators/bmi");
    }

    #[test]
    fn item_list_positions_start_at_one() {
        let list = ItemList::new("Finance")
            .item("Loan", "https://calc.test/calculators/loan")
            .item("Tip", "https://calc.test/calculators/tip");

        let value = serde_json::to_value(&list).unwrap();

        assert_eq!(value["itemListElement"][0]["position"], 1);
        assert_eq!(value["itemListElement"][1]["position"], 2);
        assert_eq!(value["itemListElement"][1]["@type"], "ListItem");
    }

    #[test]
    fn script_tag_cannot_be_closed_from_inside() {
        let list = ItemList::new("</script><b>");

        let tag = script_tag(&list).unwrap();

        assert!(tag.starts_with("<script type=\"application/ld+json\">{"));
        assert_eq!(tag.matches("</script>").count(), 1);
    }
}
