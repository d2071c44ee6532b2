//! Built-in tab actions: `open_tab`, `switch_tab`, `close_tab`.
//!
//! `switch_tab` and `close_tab` address a tab by its `index`, the same
//! field element-targeting actions use, so a caller can rebind a decided
//! tab index before dispatch.

use anyhow::Context;
use serde_json::Value;
use url::Url;

use super::session::TabSession;
use crate::actions::{ActionBody, ActionContext, ActionSpec, ParamSchema, ParamType};

fn tab_index(args: &Value, action: &str) -> anyhow::Result<usize> {
    let index = args
        .get("index")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow::anyhow!("{action}: 'index' must be a non-negative integer"))?;
    usize::try_from(index).with_context(|| format!("{action}: index {index} out of range"))
}

pub async fn open_tab(args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    let raw = args
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("open_tab: missing 'url'"))?;
    let url = Url::parse(raw).with_context(|| format!("open_tab: invalid url '{raw}'"))?;

    Ok(TabSession::from_context(&ctx)?
        .navigate(url.as_str(), true)
        .await)
}

pub async fn switch_tab(args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    let index = tab_index(&args, "switch_tab")?;
    TabSession::from_context(&ctx)?.switch_to(index).await
}

pub async fn close_tab(args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
    let index = tab_index(&args, "close_tab")?;
    TabSession::from_context(&ctx)?.close(index).await
}

fn index_schema() -> ParamSchema {
    ParamSchema::builder()
        .required("index", ParamType::Integer)
        .describe("Tab index, starting at 0")
        .build()
}

pub fn specs() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new(
            "open_tab",
            "Open a URL in a new tab",
            ActionBody::from_async(open_tab),
        )
        .param("url", None, None),
        ActionSpec::new(
            "switch_tab",
            "Switch to the tab with the given index",
            ActionBody::from_async(switch_tab),
        )
        .schema(index_schema()),
        ActionSpec::new(
            "close_tab",
            "Close the tab with the given index",
            ActionBody::from_async(close_tab),
        )
        .schema(index_schema()),
    ]
}
