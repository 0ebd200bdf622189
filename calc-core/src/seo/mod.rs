//! Search-engine scaffolding: the XML sitemap, JSON-LD structured data and
//! per-page meta tags.

pub mod meta;
pub mod sitemap;
pub mod structured_data;

pub use meta::{OgType, PageMeta};
pub use sitemap::{ChangeFreq, Sitemap, SitemapBuilder, SitemapEntry};
pub use structured_data::{Article, ItemList, ListItem, WebApplication, script_tag};

/// Escapes text for XML and HTML attribute or element content.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Joins a base URL and an absolute path without doubling the slash.
pub fn absolute_url(
    base_url: &str,
    path: &str,
) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn escapes_all_five_entities() {
        assert_eq!(
            escape_markup(r#"a&b <c> "d" 'e'"#),
            "a&amp;b &lt;c&gt; &quot;d&quot; &apos;e&apos;"
        );
    }

    #[test]
    fn joins_urls_with_one_slash() {
        assert_eq!(absolute_url("https://x.test/", "/blog"), "https://x.test/blog");
        assert_eq!(absolute_url("https://x.test", "blog"), "https://x.test/blog");
        assert_eq!(absolute_url("https://x.test", "/"), "https://x.test/");
    }
}
