use calc_core::content::BlogManifest;
use calc_core::seo::{Sitemap, SitemapBuilder};
use calc_core::{Catalog, Category};
use chrono::NaiveDate;

/// A page that exists independently of the catalog and the blog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticRoute {
    pub path: &'static str,
    pub title: &'static str,
}

const STATIC_ROUTES: &[StaticRoute] = &[
    StaticRoute { path: "/", title: "Home" },
    StaticRoute { path: "/calculators", title: "All Calculators" },
    StaticRoute { path: "/blog", title: "Blog" },
    StaticRoute { path: "/about", title: "About" },
    StaticRoute { path: "/contact", title: "Contact" },
    StaticRoute { path: "/privacy", title: "Privacy Policy" },
    StaticRoute { path: "/terms", title: "Terms of Service" },
];

pub fn static_routes() -> &'static [StaticRoute] {
    STATIC_ROUTES
}

/// Every public URL of the site: static pages, each calculator, each
/// published post, then one anchor per category that has calculators.
pub fn build_sitemap(
    base_url: &str,
    catalog: &Catalog,
    manifest: &BlogManifest,
    lastmod: Option<NaiveDate>,
) -> Sitemap {
    let mut builder = SitemapBuilder::new(base_url);
    if let Some(date) = lastmod {
        builder = builder.lastmod(date);
    }

    for route in static_routes() {
        builder.static_route(route.path);
    }
    for calculator in catalog.iter() {
        builder.calculator(calculator.meta().slug);
    }
    for post in &manifest.posts {
        builder.blog_post(&post.slug, post.date);
    }
    for category in Category::all() {
        if !catalog.by_category(*category).is_empty() {
            builder.category(category.slug());
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use calc_core::content::ManifestEntry;
    use pretty_assertions::assert_eq;

    use super::*;

    fn manifest() -> BlogManifest {
        BlogManifest {
            posts: vec![
                ManifestEntry {
                    slug: "apr-vs-apy".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 3, 15),
                },
                ManifestEntry {
                    slug: "apr-vs-apy".to_string(),
                    date: None,
                },
            ],
        }
    }

    #[test]
    fn home_comes_first() {
        let sitemap = build_sitemap("https://calc.test", &Catalog::new(), &BlogManifest::default(), None);

        assert_eq!(sitemap.entries[0].loc, "https://calc.test/");
        assert_eq!(sitemap.len(), static_routes().len());
    }

    #[test]
    fn every_calculator_gets_a_route() {
        let catalog = Catalog::builtin();

        let sitemap = build_sitemap("https://calc.test", &catalog, &BlogManifest::default(), None);

        for slug in catalog.slugs() {
            assert!(sitemap.contains(&format!("https://calc.test/calculators/{slug}")), "{slug}");
        }
        assert!(sitemap.contains("https://calc.test/calculators#finance"));
    }

    #[test]
    fn duplicate_posts_are_listed_once() {
        let sitemap = build_sitemap("https://calc.test", &Catalog::new(), &manifest(), None);

        let posts: Vec<_> = sitemap
            .entries
            .iter()
            .filter(|e| e.loc.contains("/blog/"))
            .collect();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].lastmod, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn empty_categories_get_no_anchor() {
        let sitemap = build_sitemap("https://calc.test", &Catalog::new(), &BlogManifest::default(), None);

        assert!(!sitemap.entries.iter().any(|e| e.loc.contains('#')));
    }
}
