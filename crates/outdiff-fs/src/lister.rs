//! Listing collaborator: what items exist under a root location.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ListError, ListResult};

/// Relative item name mapped to its fully-qualified location.
pub type Listing = BTreeMap<String, String>;

/// Lists the items under a root location.
///
/// Implementations must be safe to share between worker threads.
pub trait Lister: Send + Sync {
    /// List `root`. Names are relative to `root` and `/`-separated.
    ///
    /// Fails with [`ListError::ResourceUnavailable`] if `root` does not exist
    /// or cannot be read.
    fn list(&self, root: &str) -> ListResult<Listing>;
}

/// Listing options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Walk nested directories and list the files inside them. When off,
    /// only the top level is listed (files and directories alike).
    pub recursive: bool,
}

/// [`Lister`] for the local filesystem.
///
/// Accepts plain paths and `file://` URLs.
#[derive(Clone, Debug, Default)]
pub struct LocalLister {
    config: ListingConfig,
}

impl LocalLister {
    pub fn new(config: ListingConfig) -> Self {
        Self { config }
    }

    pub fn recursive() -> Self {
        Self::new(ListingConfig { recursive: true })
    }
}

impl Lister for LocalLister {
    fn list(&self, root: &str) -> ListResult<Listing> {
        let root_path = local_path(root)?;
        let meta = std::fs::metadata(&root_path).map_err(|e| ListError::unavailable(root, e))?;
        if !meta.is_dir() {
            return Err(ListError::unavailable(root, "not a directory"));
        }

        let mut walker = WalkDir::new(&root_path).min_depth(1).sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut out = Listing::new();
        for entry in walker {
            let entry = entry.map_err(|e| ListError::unavailable(root, e))?;
            // `Path::is_file` follows symlinks, matching the single-level listing.
            if self.config.recursive && !entry.path().is_file() {
                continue;
            }
            let Some(name) = relative_name(&root_path, entry.path()) else {
                continue;
            };
            out.insert(name, entry.path().to_string_lossy().into_owned());
        }

        debug!(root, entries = out.len(), recursive = self.config.recursive, "listed directory");
        Ok(out)
    }
}

/// Resolve a location string to a local path.
fn local_path(location: &str) -> ListResult<PathBuf> {
    if let Some(path) = location.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = location.split_once("://") {
        return Err(ListError::UnsupportedScheme {
            scheme: scheme.to_string(),
            location: location.to_string(),
        });
    }
    Ok(PathBuf::from(location))
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
