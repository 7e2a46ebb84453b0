//! Discovery of result artifacts beneath a project tree.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::project::is_marker;

/// Where artifacts may live relative to the search root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchScope {
    /// Only files nested at any depth beneath a directory named like the marker.
    UnderMarker,
    /// Any file with the expected extension.
    Anywhere,
}

/// Finds artifacts by extension beneath directories named after a marker.
///
/// Marker and extension comparisons ignore ASCII case. Entries are visited in
/// file name order so logs are reproducible between runs on one machine.
#[derive(Clone, Debug)]
pub struct ArtifactLocator {
    /// Directory name that marks a simulation folder.
    marker: String,
    /// Expected file extension, without the leading dot.
    extension: String,
    /// Whether the marker is required.
    scope: SearchScope,
}

impl ArtifactLocator {
    /// Create a locator for `extension` files under `marker` directories.
    #[must_use]
    pub fn new(marker: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            extension: extension.into().trim_start_matches('.').to_owned(),
            scope: SearchScope::UnderMarker,
        }
    }

    /// Change the search scope.
    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Return every matching artifact beneath `root`.
    ///
    /// An empty result is not an error. Unreadable sub-directories are logged
    /// and skipped.
    #[must_use]
    pub fn locate(&self, root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.has_extension(entry.path()) {
                continue;
            }
            if self.scope == SearchScope::UnderMarker && !self.under_marker(root, entry.path()) {
                continue;
            }
            found.push(entry.into_path());
        }
        tracing::debug!(root = %root.display(), count = found.len(), "Artifact search finished");
        found
    }

    /// Whether the file carries the expected extension.
    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .map_or(false, |ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Whether a directory between `root` and the file is named like the marker.
    fn under_marker(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        relative
            .parent()
            .map_or(false, |dirs| {
                dirs.components().any(|component| match component {
                    Component::Normal(name) => is_marker(name, &self.marker),
                    _ => false,
                })
            })
    }
}
