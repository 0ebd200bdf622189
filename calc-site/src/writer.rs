use std::path::{Path, PathBuf};

use calc_core::content::{BlogManifest, ContentError};
use calc_core::seo::Sitemap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest error: {0}")]
    Manifest(#[from] ContentError),
}

impl SiteError {
    fn io(
        path: &Path,
        source: std::io::Error,
    ) -> Self {
        SiteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads the published-post manifest (a JSON array of `{slug, date}`).
pub fn load_manifest(path: &Path) -> Result<BlogManifest, SiteError> {
    let json = std::fs::read_to_string(path).map_err(|e| SiteError::io(path, e))?;
    Ok(BlogManifest::from_json(&json)?)
}

/// Writes the sitemap XML to `path`, creating missing parent directories.
/// Returns the number of URLs written.
pub fn write_sitemap(
    path: &Path,
    sitemap: &Sitemap,
) -> Result<usize, SiteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SiteError::io(parent, e))?;
    }
    std::fs::write(path, sitemap.to_xml()).map_err(|e| SiteError::io(path, e))?;
    info!(path = %path.display(), urls = sitemap.len(), "Sitemap written");
    Ok(sitemap.len())
}
