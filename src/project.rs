//! Project identifiers derived from artifact paths.

use std::ffi::OsStr;
use std::path::{Component, Path};

/// Name used when a path is too short to name a project.
pub const UNKNOWN_PROJECT: &str = "unknown";

/// Resolve the project an artifact belongs to.
///
/// The project is the directory immediately above the first path segment
/// named `marker` (ASCII case ignored). Without such a segment the name of the
/// artifact's grandparent directory is used, and [`UNKNOWN_PROJECT`] when the
/// path has no grandparent. Segments that are not valid UTF-8 are rendered
/// lossily.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use feadataset::resolve_project_name;
///
/// let path = Path::new("/data/SPRING_A/3_SIMULACION/dp0/file.rst");
/// assert_eq!(resolve_project_name(path, "3_SIMULACION"), "SPRING_A");
///
/// let path = Path::new("/data/SPRING_B/run/file.rst");
/// assert_eq!(resolve_project_name(path, "3_SIMULACION"), "SPRING_B");
/// ```
#[must_use]
pub fn resolve_project_name(path: &Path, marker: &str) -> String {
    let segments: Vec<&OsStr> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();

    let from_marker = segments
        .iter()
        .position(|segment| is_marker(segment, marker))
        .and_then(|position| position.checked_sub(1))
        .map(|parent| segments[parent]);

    from_marker
        .or_else(|| grandparent_name(path))
        .map_or_else(
            || UNKNOWN_PROJECT.to_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
}

/// Whether a path segment names the marker directory, ignoring ASCII case.
///
/// The comparison is made on the raw bytes of the segment, so a segment that
/// is not valid UTF-8 is compared rather than skipped.
pub(crate) fn is_marker(segment: &OsStr, marker: &str) -> bool {
    segment
        .as_encoded_bytes()
        .eq_ignore_ascii_case(marker.as_bytes())
}

/// Name of the directory two levels above `path`.
fn grandparent_name(path: &Path) -> Option<&OsStr> {
    path.parent()?
        .parent()?
        .file_name()
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_segment_before_marker() {
        let path = Path::new("/root/HYUNDAI_STA_FE/3_SIMULACION/files/dp0/SYS/MECH/file.rst");
        assert_eq!(resolve_project_name(path, "3_SIMULACION"), "HYUNDAI_STA_FE");
    }

    #[test]
    fn first_marker_wins() {
        let path = Path::new("/root/OUTER/3_SIMULACION/INNER/3_SIMULACION/file.rst");
        assert_eq!(resolve_project_name(path, "3_SIMULACION"), "OUTER");
    }

    #[test]
    fn falls_back_to_grandparent() {
        let path = Path::new("/root/DAIHATSU_TERIOS/MECH/file.rst");
        assert_eq!(resolve_project_name(path, "3_SIMULACION"), "DAIHATSU_TERIOS");
    }

    #[test]
    fn marker_as_first_segment_falls_back() {
        let path = Path::new("3_SIMULACION/run/file.rst");
        assert_eq!(resolve_project_name(path, "3_SIMULACION"), "3_SIMULACION");
    }

    #[test]
    fn short_paths_yield_unknown() {
        assert_eq!(
            resolve_project_name(Path::new("file.rst"), "3_SIMULACION"),
            UNKNOWN_PROJECT
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_segment_still_names_the_project() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/data/SPRING_\xFF/3_SIMULACION/file.rst"));
        assert_eq!(resolve_project_name(path, "3_SIMULACION"), "SPRING_\u{FFFD}");

        let path = Path::new(OsStr::from_bytes(b"/data/LEGACY_\xFF/run/file.rst"));
        assert_eq!(resolve_project_name(path, "3_SIMULACION"), "LEGACY_\u{FFFD}");
    }

    #[test]
    fn resolution_is_idempotent() {
        let path = Path::new("/root/SPRING/3_SIMULACION/file.rst");
        let first = resolve_project_name(path, "3_SIMULACION");
        let second = resolve_project_name(path, "3_SIMULACION");
        assert_eq!(first, second);
    }
}
