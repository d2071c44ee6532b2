//! Validated dispatch of a chosen action.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::decision::Decision;
use super::error::ActionError;
use super::registry::ActionRegistry;

/// Ambient values supplied by the caller of a dispatch.
///
/// `values` are merged into the action's validated arguments.  Typed
/// handles that are not JSON (a shared browser session, a client) travel
/// as extensions and are looked up by type inside the body.
#[derive(Clone, Default)]
pub struct ActionContext {
    values: Map<String, Value>,
    extensions: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Attach a shared handle, replacing any earlier one of the same type.
    pub fn with_extension<T: Send + Sync + 'static>(mut self, handle: Arc<T>) -> Self {
        self.extensions.insert(TypeId::of::<T>(), handle);
        self
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.extensions
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|handle| handle.downcast::<T>().ok())
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

/// Lifecycle of a single dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Validated,
    Executing,
    Succeeded,
    Failed,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchStage::Received => "received",
            DispatchStage::Validated => "validated",
            DispatchStage::Executing => "executing",
            DispatchStage::Succeeded => "succeeded",
            DispatchStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl ActionRegistry {
    /// Validate `raw_params` against the named action and run it.
    ///
    /// The body only runs once validation has passed.  Its return value is
    /// passed through unchanged; its error is logged and returned as
    /// [`ActionError::Runtime`] without retrying.
    pub async fn execute_action(
        &self,
        name: &str,
        raw_params: Value,
        ctx: ActionContext,
    ) -> Result<Value, ActionError> {
        let call_id = Uuid::new_v4();
        debug!(%call_id, action = name, stage = %DispatchStage::Received, "dispatch");

        let Some(descriptor) = self.get(name) else {
            warn!(%call_id, action = name, "unknown action requested");
            return Err(ActionError::UnknownAction(name.to_string()));
        };

        let mut args = descriptor.params.validate(&raw_params).map_err(|e| {
            warn!(
                %call_id,
                action = name,
                field = %e.field,
                reason = %e.reason,
                "action parameters rejected"
            );
            e.for_action(name)
        })?;
        debug!(%call_id, action = name, stage = %DispatchStage::Validated, "dispatch");

        for (key, value) in ctx.values() {
            if args.contains_key(key) {
                warn!(%call_id, action = name, key = %key, "context value collides with parameter");
                return Err(ActionError::ContextConflict {
                    action: name.to_string(),
                    key: key.clone(),
                });
            }
            args.insert(key.clone(), value.clone());
        }

        debug!(
            %call_id,
            action = name,
            blocking = descriptor.handler.is_blocking(),
            stage = %DispatchStage::Executing,
            "dispatch"
        );
        match descriptor.handler.call(Value::Object(args), ctx).await {
            Ok(result) => {
                debug!(%call_id, action = name, stage = %DispatchStage::Succeeded, "dispatch");
                Ok(result)
            }
            Err(e) => {
                error!(
                    %call_id,
                    action = name,
                    stage = %DispatchStage::Failed,
                    error = %e,
                    "action failed"
                );
                Err(ActionError::Runtime {
                    action: name.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Dispatch a decoded decision.  `Decision::None` runs nothing.
    pub async fn execute_decision(
        &self,
        decision: Decision,
        ctx: ActionContext,
    ) -> Result<Option<Value>, ActionError> {
        match decision {
            Decision::None => Ok(None),
            Decision::Action(invocation) => self
                .execute_action(&invocation.name, Value::Object(invocation.params), ctx)
                .await
                .map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Session(&'static str);

    #[test]
    fn extensions_are_typed() {
        let ctx = ActionContext::new().with_extension(Arc::new(Session("tab-1")));
        assert_eq!(ctx.extension::<Session>().unwrap().0, "tab-1");
        assert!(ctx.extension::<String>().is_none());
    }

    #[test]
    fn values_and_debug() {
        let ctx = ActionContext::new().with_value("user", "ada");
        assert_eq!(ctx.values()["user"], "ada");
        assert!(format!("{ctx:?}").contains("user"));
    }

    #[test]
    fn stage_display() {
        assert_eq!(DispatchStage::Executing.to_string(), "executing");
    }
}
