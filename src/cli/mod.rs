//! CLI subcommand handlers extracted from `main.rs`.
//!
//! Keeps `main.rs` slim: clap parsing stays there, the logic lives here.
//! Every command builds the built-in catalog from the loaded config.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

use crate::actions::builtins::{self, TabSession};
use crate::actions::{ActionContext, ActionRegistry, Decision};
use crate::config::Config;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// The allow-list to use: the command-line one, else the configured one.
fn include_list(config: &Config, include: &[String]) -> Option<Vec<String>> {
    if include.is_empty() {
        config.include_actions.clone()
    } else {
        Some(include.to_vec())
    }
}

/// A dispatch context with a fresh tab session, opened on `url` if given.
pub fn session_context(url: Option<&str>) -> ActionContext {
    ActionContext::new().with_extension(Arc::new(TabSession::new(url)))
}

/// Read a reply from the argument itself, or stdin when it is "-".
fn read_reply(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        Ok(buf)
    } else {
        Ok(source.to_string())
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serialize output")?
    );
    Ok(())
}

// ── Catalog ──────────────────────────────────────────────────────────────────

/// Print the prompt description of the actions offered for `url`.
pub fn list_actions(config: &Config, url: Option<&str>) -> anyhow::Result<()> {
    let registry = builtins::registry_from_config(config);
    let text = registry.prompt_description(url);
    if text.is_empty() {
        println!("No actions offered.");
    } else {
        println!("{text}");
    }
    Ok(())
}

/// Print the decision JSON Schema for `url`.
pub fn print_schema(config: &Config, url: Option<&str>, include: &[String]) -> anyhow::Result<()> {
    let registry = builtins::registry_from_config(config);
    let include = include_list(config, include);
    let schema = registry.decision_schema(include.as_deref(), url);
    debug!(actions = ?schema.action_names(), "decision schema built");
    print_json(&schema.to_json_schema())
}

/// Print function-calling definitions for `url`.
pub fn print_functions(
    config: &Config,
    url: Option<&str>,
    include: &[String],
) -> anyhow::Result<()> {
    let registry = builtins::registry_from_config(config);
    let include = include_list(config, include);
    let defs = registry.function_definitions(include.as_deref(), url);
    print_json(&Value::Array(defs))
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

/// Dispatch one action against a fresh tab session and return its result.
pub async fn dispatch_once(
    registry: &ActionRegistry,
    name: &str,
    params: Value,
    url: Option<&str>,
) -> anyhow::Result<Value> {
    let result = registry
        .execute_action(name, params, session_context(url))
        .await?;
    Ok(result)
}

/// `actuator run NAME --params JSON`.
pub async fn run_action(
    config: &Config,
    name: &str,
    params: Option<&str>,
    url: Option<&str>,
) -> anyhow::Result<()> {
    let params: Value = match params {
        Some(raw) => serde_json::from_str(raw).context("--params is not valid JSON")?,
        None => Value::Null,
    };
    let registry = builtins::registry_from_config(config);
    let result = dispatch_once(&registry, name, params, url).await?;
    print_json(&result)
}

/// Validate a model reply and dispatch the action it picks.
///
/// Returns `Ok(None)` when the reply validly chooses nothing.
pub async fn decide_and_dispatch(
    registry: &ActionRegistry,
    include: Option<&[String]>,
    reply: &str,
    url: Option<&str>,
) -> anyhow::Result<Option<Value>> {
    let schema = registry.decision_schema(include, url);
    let decision = schema.parse_reply(reply)?;
    if let Decision::Action(ref invocation) = decision {
        debug!(action = %invocation.name, index = ?invocation.index(), "decision accepted");
    }
    let result = registry
        .execute_decision(decision, session_context(url))
        .await?;
    Ok(result)
}

/// `actuator decide --reply TEXT`.
pub async fn decide(config: &Config, reply: &str, url: Option<&str>) -> anyhow::Result<()> {
    let reply = read_reply(reply)?;
    let registry = builtins::registry_from_config(config);
    match decide_and_dispatch(&registry, config.include_actions.as_deref(), &reply, url).await? {
        Some(result) => print_json(&result),
        None => {
            println!("No action chosen.");
            Ok(())
        }
    }
}
