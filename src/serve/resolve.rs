//! Request target to filesystem path resolution

use std::path::{Path, PathBuf};

/// Clean a slash-separated request target into its path segments
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// A `..` with nothing left to remove is ignored, so the result can never
/// climb above wherever it is later joined.
pub fn clean_segments(target: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

/// Map a raw request target onto a path under `root`
///
/// The target is cleaned first and then truncated at its first `?`, so the
/// query string never takes part in the lookup. `root` is expected to be
/// absolute and already clean.
///
/// # Example
///
/// ```
/// # use std::path::Path;
/// # use fileserve::serve::resolve::resolve;
/// let root = Path::new("/srv");
/// assert_eq!(resolve(root, "/a.html?x=1"), Path::new("/srv/a.html"));
/// assert_eq!(resolve(root, "/../../etc/passwd"), Path::new("/srv/etc/passwd"));
/// ```
pub fn resolve(root: &Path, target: &str) -> PathBuf {
    let cleaned = clean_segments(target).join("/");
    let relative = match cleaned.find('?') {
        Some(idx) => &cleaned[..idx],
        None => cleaned.as_str(),
    };

    let mut path = root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_separators_and_dots() {
        assert_eq!(clean_segments("//a/./b//c/"), vec!["a", "b", "c"]);
        assert_eq!(clean_segments("/a/b/../c"), vec!["a", "c"]);
        assert!(clean_segments("/../..").is_empty());
    }

    #[test]
    fn query_only_target_resolves_to_root() {
        assert_eq!(resolve(Path::new("/srv"), "/?page=2"), Path::new("/srv"));
    }
}
