//! Built-in navigation actions: `go_to_url`, `go_back`, `search_google`.

use anyhow::Context;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::session::TabSession;
use crate::actions::{ActionBody, ActionContext, ActionSpec, ParamType};

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

/// Arguments for `go_to_url`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GoToUrlArgs {
    /// Absolute URL to load
    pub url: String,
    /// Open the page in a new tab instead of the current one
    pub new_tab: Option<bool>,
}

/// Load a URL in the current tab, or a new one.
pub async fn go_to_url(args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    let args: GoToUrlArgs = serde_json::from_value(args).context("go_to_url: bad arguments")?;
    let url = Url::parse(&args.url).with_context(|| format!("go_to_url: invalid url '{}'", args.url))?;

    let session = TabSession::from_context(&ctx)?;
    Ok(session
        .navigate(url.as_str(), args.new_tab.unwrap_or(false))
        .await)
}

pub async fn go_back(_args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    TabSession::from_context(&ctx)?.back().await
}

/// Run a web search for `query` in the current tab.
pub async fn search_google(args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    let query = args
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("search_google: missing 'query'"))?;

    let url = search_url(query)?;
    let session = TabSession::from_context(&ctx)?;
    let mut result = session.navigate(url.as_str(), false).await;
    result["query"] = json!(query);
    Ok(result)
}

pub(crate) fn search_url(query: &str) -> anyhow::Result<Url> {
    Url::parse_with_params(SEARCH_ENDPOINT, &[("q", query), ("udm", "14")])
        .context("search_google: cannot build search url")
}

pub fn specs() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new(
            "go_to_url",
            "Navigate to a URL in the current tab, or a new one",
            ActionBody::from_async(go_to_url),
        )
        .schema_of::<GoToUrlArgs>(),
        ActionSpec::new(
            "go_back",
            "Go back to the previous page in the current tab",
            ActionBody::from_async(go_back),
        ),
        ActionSpec::new(
            "search_google",
            "Search the web for a query in the current tab",
            ActionBody::from_async(search_google),
        )
        .param("query", Some(ParamType::String), None)
        .describe("Search terms, as a person would type them"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_is_encoded() {
        let url = search_url("rust & tokio").unwrap();
        assert_eq!(url.host_str(), Some("www.google.com"));
        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        assert_eq!(q.as_deref(), Some("rust & tokio"));
    }

    #[test]
    fn go_to_url_schema_is_derived() {
        let specs = specs();
        assert_eq!(specs[0].name(), "go_to_url");
        let schema = crate::actions::ParamSchema::of::<GoToUrlArgs>();
        assert!(schema.field("url").unwrap().required);
        assert!(!schema.field("new_tab").unwrap().required);
        assert_eq!(schema.field("new_tab").unwrap().ty, ParamType::Boolean);
    }
}
