//! Integration tests for sitemap generation against the real filesystem.

use std::path::PathBuf;

use calc_core::Catalog;
use calc_site::{SiteError, build_sitemap, load_manifest, write_sitemap};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

/// A fresh directory under the system temp dir, unique per test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("calc-site-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_writes_sitemap_into_new_directories() {
    let dir = scratch_dir("write");
    let manifest_path = dir.join("posts.json");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        &manifest_path,
        r#"[{"slug": "how-apr-works", "date": "2024-04-02"}, {"slug": "bmi-limits", "date": null}]"#,
    )
    .unwrap();

    let manifest = load_manifest(&manifest_path).expect("Failed to load manifest");
    let catalog = Catalog::builtin();
    let sitemap = build_sitemap(
        "https://calculatorhub.example/",
        &catalog,
        &manifest,
        NaiveDate::from_ymd_opt(2024, 6, 1),
    );
    let out = dir.join("public").join("sitemap.xml");

    let written = write_sitemap(&out, &sitemap).expect("Failed to write sitemap");

    let xml = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, sitemap.len());
    assert_eq!(xml.matches("<url>").count(), written);
    assert!(xml.contains("<loc>https://calculatorhub.example/blog/how-apr-works</loc>"));
    assert!(xml.contains("<lastmod>2024-04-02</lastmod>"));
    assert!(xml.contains("<loc>https://calculatorhub.example/calculators/loan</loc>"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_manifest_reports_path() {
    let dir = scratch_dir("missing");

    let err = load_manifest(&dir.join("posts.json")).expect_err("Should fail for missing file");

    assert!(matches!(err, SiteError::Io { .. }));
    assert!(err.to_string().contains("posts.json"));
}

#[test]
fn test_malformed_manifest_is_rejected() {
    let dir = scratch_dir("malformed");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("posts.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = load_manifest(&path).expect_err("Should fail for malformed JSON");

    assert!(matches!(err, SiteError::Manifest(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}
