//! Tests for domain-filter matching against target URLs.

use actuator::actions::matches;

fn filter(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

#[test]
fn leading_wildcard_matches_suffix() {
    let f = filter(&["*.example.com"]);
    assert!(matches(Some(&f), "https://a.example.com/x"));
    assert!(!matches(Some(&f), "https://example.org"));
}

#[test]
fn trailing_wildcard_matches_prefix() {
    let f = filter(&["example.com.*"]);
    assert!(matches(Some(&f), "https://example.com.au"));
    assert!(!matches(Some(&f), "https://shop.example.com"));
}

#[test]
fn plain_pattern_is_exact() {
    let f = filter(&["www.bing.com"]);
    assert!(matches(Some(&f), "https://www.bing.com"));
    assert!(!matches(Some(&f), "https://bing.com"));
}

#[test]
fn any_pattern_in_the_list_is_enough() {
    let f = filter(&["*.google.com", "www.bing.com"]);
    assert!(matches(Some(&f), "https://www.bing.com/search?q=x"));
    assert!(matches(Some(&f), "https://news.google.com/"));
    assert!(!matches(Some(&f), "https://duckduckgo.com/"));
}

/// No filter means the action is global.
#[test]
fn missing_filter_always_matches() {
    assert!(matches(None, "https://anything.test/"));
    assert!(matches(None, "not a url"));
}

/// An empty target is "list everything" mode.
#[test]
fn empty_target_always_matches() {
    let f = filter(&["www.bing.com"]);
    assert!(matches(Some(&f), ""));
}

/// Malformed targets fail closed instead of raising.
#[test]
fn malformed_target_never_matches() {
    let f = filter(&["*.example.com"]);
    assert!(!matches(Some(&f), "::not a url::"));
    assert!(!matches(Some(&f), "a.example.com"));
}
