//! Action registry and dispatch.
//!
//! Actions are registered once at startup into an [`ActionRegistry`].
//! The registry renders the catalog for prompts and function calling,
//! builds the "choose one action" [`DecisionSchema`] for a target page,
//! and dispatches a chosen action after validating its arguments.
//!
//! ```ignore
//! let mut registry = ActionRegistry::new();
//! registry.register(
//!     ActionSpec::new("click_element", "Click an element", ActionBody::from_async(click))
//!         .param("index", Some(ParamType::Integer), None),
//! );
//! let out = registry
//!     .execute_action("click_element", json!({ "index": 3 }), ActionContext::new())
//!     .await?;
//! ```

pub mod builtins;
pub mod decision;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod params;
pub mod parsing;
pub mod prompt;
pub mod registry;

pub use decision::{ActionInvocation, ActionVariant, Decision, DecisionSchema};
pub use dispatch::{ActionContext, DispatchStage};
pub use domain::matches;
pub use error::{ActionError, FieldError};
pub use params::{ParamField, ParamSchema, ParamSchemaBuilder, ParamType};
pub use registry::{
    Action, ActionBody, ActionDescriptor, ActionFuture, ActionHandler, ActionRegistry, ActionSpec,
    SharedRegistry,
};
