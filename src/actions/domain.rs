//! Domain filters for action visibility.
//!
//! A filter is an ordered list of glob-style patterns matched against the
//! *authority* (`[userinfo@]host[:port]`) of a target URL:
//!
//! - `*.example.com`: authority ends with `example.com`
//! - `example.*`: authority starts with `example`
//! - anything else: exact match
//!
//! Targets that cannot be parsed never match.

use url::{Position, Url};

/// Decide whether `target` satisfies `filter`.
///
/// A missing filter means the action is global and always matches. An
/// empty target matches every filter ("list all" mode).
pub fn matches(filter: Option<&[String]>, target: &str) -> bool {
    let Some(patterns) = filter else {
        return true;
    };
    if target.is_empty() {
        return true;
    }

    let url = match Url::parse(target) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!(target_url = target, error = %e, "unparsable target, no domain match");
            return false;
        }
    };
    let authority = &url[Position::BeforeUsername..Position::AfterPort];

    patterns
        .iter()
        .any(|pattern| pattern_matches(pattern, authority))
}

fn pattern_matches(pattern: &str, authority: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("*.") {
        authority.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix(".*") {
        authority.starts_with(prefix)
    } else {
        authority == pattern
    }
}

/// Check that `pattern` is one of the recognised forms.
///
/// Used when loading domain overrides from configuration.
pub fn check_pattern(pattern: &str) -> Result<(), String> {
    if pattern.trim().is_empty() {
        return Err("domain pattern must not be empty".into());
    }
    if pattern.starts_with("*.") && pattern.ends_with(".*") {
        return Err(format!(
            "domain pattern `{pattern}` combines a leading and a trailing wildcard"
        ));
    }
    if pattern.contains("://") {
        return Err(format!(
            "domain pattern `{pattern}` must be a host, not a URL"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn no_filter_is_global() {
        assert!(matches(None, "https://anything.test"));
        assert!(matches(None, "not a url"));
    }

    #[test]
    fn empty_target_lists_all() {
        assert!(matches(Some(&f(&["www.bing.com"])), ""));
    }

    #[test]
    fn authority_keeps_port_and_userinfo() {
        assert!(matches(
            Some(&f(&["localhost:8080"])),
            "http://localhost:8080/app"
        ));
        assert!(!matches(Some(&f(&["localhost"])), "http://localhost:8080/"));
        assert!(matches(
            Some(&f(&["*.internal.test"])),
            "https://bob@ci.internal.test/"
        ));
    }

    #[test]
    fn malformed_target_fails_closed() {
        assert!(!matches(Some(&f(&["*.example.com"])), "example.com"));
        assert!(!matches(Some(&f(&["*.example.com"])), "::::"));
    }

    #[test]
    fn wildcard_rule_does_not_fall_back_to_equality() {
        assert!(!matches(Some(&f(&["*.example.com"])), "https://example.org"));
        assert!(matches(
            Some(&f(&["*.example.com", "example.org"])),
            "https://example.org"
        ));
    }

    #[test]
    fn pattern_checks() {
        assert!(check_pattern("*.google.com").is_ok());
        assert!(check_pattern("yahoo.*").is_ok());
        assert!(check_pattern("www.bing.com").is_ok());
        assert!(check_pattern("").is_err());
        assert!(check_pattern("*.google.*").is_err());
        assert!(check_pattern("https://google.com").is_err());
    }
}
