//! Path normalization shared by route resolution and the navigation gate.
//!
//! Both sides must compare paths the same way: if the gate's exemption check
//! disagreed with what the router resolves, a redirect to the selection page
//! could itself be redirected.

use std::borrow::Cow;

/// Normalize a navigation path for matching.
///
/// - query string and fragment are dropped
/// - trailing slashes are removed (except for the root)
/// - a leading slash is added when missing
/// - an empty path becomes `/`
///
/// Matching stays case-sensitive and percent-encoding is left untouched.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');

    if trimmed.is_empty() {
        Cow::Borrowed("/")
    } else if trimmed.starts_with('/') {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("/{trimmed}"))
    }
}

/// Split a normalized path into segments. The root has none.
pub(crate) fn segments(normalized: &str) -> impl Iterator<Item = &str> {
    let rest = normalized.strip_prefix('/').unwrap_or(normalized);
    rest.split('/').filter(move |_| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("//"), "/");
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(normalize_path("/ui-select/"), "/ui-select");
        assert_eq!(normalize_path("/post/42/"), "/post/42");
    }

    #[test]
    fn test_normalize_adds_leading_slash() {
        assert_eq!(normalize_path("login"), "/login");
    }

    #[test]
    fn test_normalize_drops_query_and_fragment() {
        assert_eq!(normalize_path("/post/42?page=2"), "/post/42");
        assert_eq!(normalize_path("/ui-select#top"), "/ui-select");
        assert_eq!(normalize_path("/?next=/login"), "/");
    }

    #[test]
    fn test_normalize_is_case_sensitive() {
        assert_eq!(normalize_path("/UI-Select"), "/UI-Select");
    }

    #[test]
    fn test_normalize_borrows_when_unchanged() {
        assert!(matches!(normalize_path("/login"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_segments() {
        assert_eq!(segments("/").count(), 0);
        assert_eq!(segments("/post/42").collect::<Vec<_>>(), vec!["post", "42"]);
        assert_eq!(
            segments("/post//42").collect::<Vec<_>>(),
            vec!["post", "", "42"]
        );
    }
}
