//! Built-in `extract_search_query` action.
//!
//! Only offered on search-engine pages.  The body is synchronous and is
//! dispatched on the blocking pool.

use serde_json::{json, Value};
use url::Url;

use super::session::TabSession;
use crate::actions::{ActionBody, ActionContext, ActionSpec};

pub const DOMAINS: [&str; 2] = ["*.google.com", "www.bing.com"];

/// Pull the `q` parameter out of a search results URL.
pub fn query_of(url: &str) -> anyhow::Result<String> {
    let parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("invalid url '{url}': {e}"))?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| anyhow::anyhow!("no search query in '{url}'"))
}

pub fn extract_search_query(_args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    let session = TabSession::from_context(&ctx)?;
    let url = session
        .blocking_current_url()
        .ok_or_else(|| anyhow::anyhow!("extract_search_query: the current tab is empty"))?;
    let query = query_of(&url)?;
    Ok(json!({ "query": query, "url": url }))
}

pub fn spec() -> ActionSpec {
    ActionSpec::new(
        "extract_search_query",
        "Read the search terms from the current results page",
        ActionBody::from_blocking(extract_search_query),
    )
    .domains(DOMAINS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_decoded() {
        assert_eq!(
            query_of("https://www.bing.com/search?q=rust+async&form=QBLH").unwrap(),
            "rust async"
        );
        assert!(query_of("https://www.google.com/").is_err());
        assert!(query_of("not a url").is_err());
    }
}
