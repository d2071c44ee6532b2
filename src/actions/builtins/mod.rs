//! Built-in action implementations.
//!
//! A small browser-flavoured catalog over an in-memory [`TabSession`].
//! Bodies find the session through the dispatch context, so callers
//! attach one with [`ActionContext::with_extension`] before dispatching.
//!
//! [`ActionContext::with_extension`]: crate::actions::ActionContext::with_extension

pub mod done;
pub mod navigation;
pub mod search_query;
pub mod session;
pub mod tabs;

pub use session::TabSession;

use std::collections::HashMap;

use crate::actions::{ActionRegistry, ActionSpec};
use crate::config::Config;

/// Every built-in action, in catalog order.
pub fn specs() -> Vec<ActionSpec> {
    let mut specs = navigation::specs();
    specs.extend(tabs::specs());
    specs.push(search_query::spec());
    specs.push(done::spec());
    specs
}

/// Register all built-ins, applying per-action domain overrides.
pub fn register_builtins(registry: &mut ActionRegistry, overrides: &HashMap<String, Vec<String>>) {
    for spec in specs() {
        let spec = match overrides.get(spec.name()) {
            Some(domains) => spec.allowed_domains(domains.iter().cloned()),
            None => spec,
        };
        registry.register(spec);
    }
}

/// Build the built-in catalog as configured.
pub fn registry_from_config(config: &Config) -> ActionRegistry {
    let mut registry = ActionRegistry::with_exclusions(config.exclude_actions.iter().cloned());
    register_builtins(&mut registry, &config.domain_overrides);
    tracing::info!(
        actions = registry.len(),
        excluded = config.exclude_actions.len(),
        "action registry ready"
    );
    registry
}
