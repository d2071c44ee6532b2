//! Tests for action registration and catalog lookup.

use std::sync::Arc;

use actuator::actions::{
    ActionBody, ActionContext, ActionRegistry, ActionSpec, ParamType, SharedRegistry,
};
use serde_json::{json, Value};

fn echo(tag: &'static str) -> ActionBody {
    ActionBody::from_async(move |args: Value, _ctx: ActionContext| async move {
        Ok(json!({ "tag": tag, "args": args }))
    })
}

fn sample_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(ActionSpec::new("go_back", "Go back", echo("back")));
    registry.register(
        ActionSpec::new("search", "Search the web", echo("search"))
            .param("query", Some(ParamType::String), None),
    );
    registry.register(
        ActionSpec::new("extract", "Extract", echo("extract")).domains(["*.google.com"]),
    );
    registry
}

/// Lookup by name returns a descriptor carrying that same name.
#[test]
fn lookup_name_matches_key() {
    let registry = sample_registry();
    for name in registry.names() {
        let descriptor = registry.get(name).expect("registered name resolves");
        assert_eq!(descriptor.name, name);
        assert_eq!(descriptor.handler.name(), name);
    }
    assert!(registry.get("nope").is_none());
}

#[test]
fn registration_order_is_kept() {
    let registry = sample_registry();
    assert_eq!(registry.names(), vec!["go_back", "search", "extract"]);
    assert_eq!(registry.len(), 3);
}

/// Re-registering a name replaces the earlier descriptor in place.
#[tokio::test]
async fn last_registration_wins() {
    let mut registry = sample_registry();
    registry.register(ActionSpec::new("search", "Search, v2", echo("search-v2")));

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.names()[1], "search");
    let descriptor = registry.get("search").unwrap();
    assert_eq!(descriptor.description, "Search, v2");
    assert!(descriptor.params.is_empty());

    let out = registry
        .execute_action("search", json!({}), ActionContext::new())
        .await
        .unwrap();
    assert_eq!(out["tag"], "search-v2");
}

/// Excluded actions stay out of the catalog, but the caller still gets a
/// callable handler.
#[tokio::test]
async fn excluded_action_is_not_cataloged() {
    let mut registry = ActionRegistry::with_exclusions(["go_back"]);
    let handler = registry.register(ActionSpec::new("go_back", "Go back", echo("back")));

    assert!(registry.is_empty());
    assert!(registry.is_excluded("go_back"));

    let out = handler.call(json!({}), ActionContext::new()).await.unwrap();
    assert_eq!(out["tag"], "back");
}

#[test]
fn allowed_domains_win_over_domains() {
    let mut registry = ActionRegistry::new();
    registry.register(
        ActionSpec::new("extract", "Extract", echo("extract"))
            .allowed_domains(["www.bing.com"])
            .domains(["*.google.com"]),
    );
    let descriptor = registry.get("extract").unwrap();
    assert_eq!(descriptor.domains, Some(vec!["www.bing.com".to_string()]));
    assert!(!descriptor.is_global());
}

/// Params declared without a type are strings; without a default they
/// are required.
#[test]
fn declared_params_follow_defaults() {
    let mut registry = ActionRegistry::new();
    registry.register(
        ActionSpec::new("scroll", "Scroll the page", echo("scroll"))
            .param("direction", None, None)
            .param("amount", Some(ParamType::Integer), Some(json!(1)))
            .describe("Screens to scroll"),
    );

    let params = &registry.get("scroll").unwrap().params;
    let direction = params.field("direction").unwrap();
    assert_eq!(direction.ty, ParamType::String);
    assert!(direction.required);

    let amount = params.field("amount").unwrap();
    assert!(!amount.required);
    assert_eq!(amount.default, Some(json!(1)));
    assert_eq!(amount.description.as_deref(), Some("Screens to scroll"));
}

#[test]
fn blocking_bodies_are_flagged() {
    let mut registry = ActionRegistry::new();
    let handler = registry.register(ActionSpec::new(
        "read",
        "Read",
        ActionBody::from_blocking(|_args, _ctx| Ok(Value::Null)),
    ));
    assert!(handler.is_blocking());
    assert!(registry.get("read").unwrap().handler.is_blocking());
}

/// Swapping the shared catalog leaves earlier snapshots intact.
#[test]
fn shared_registry_swaps_whole_catalog() {
    let shared = SharedRegistry::new(sample_registry());
    let before = shared.snapshot();

    let mut next = ActionRegistry::new();
    next.register(ActionSpec::new("done", "Finish", echo("done")));
    let old = shared.replace(next);

    assert!(Arc::ptr_eq(&before, &old));
    assert_eq!(before.len(), 3);
    assert_eq!(shared.snapshot().names(), vec!["done"]);
}
