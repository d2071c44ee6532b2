//! Error types for the action engine.

/// Errors surfaced by schema validation, decision parsing and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("invalid parameters for `{action}`: field `{field}` {reason}")]
    InvalidParams {
        action: String,
        field: String,
        reason: String,
    },
    #[error("context value `{key}` collides with a parameter of `{action}`")]
    ContextConflict { action: String, key: String },
    #[error("invalid decision: {0}")]
    InvalidDecision(String),
    #[error("action `{action}` failed: {source}")]
    Runtime {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ActionError {
    /// Name of the action this error concerns, when there is one.
    pub fn action(&self) -> Option<&str> {
        match self {
            ActionError::UnknownAction(name) => Some(name),
            ActionError::InvalidParams { action, .. }
            | ActionError::ContextConflict { action, .. }
            | ActionError::Runtime { action, .. } => Some(action),
            ActionError::InvalidDecision(_) => None,
        }
    }

    /// The error raised by the action body, untouched.
    ///
    /// Callers can `downcast_ref` it to recover the body's own error type.
    pub fn runtime_source(&self) -> Option<&anyhow::Error> {
        match self {
            ActionError::Runtime { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A single field-level validation failure, before it is tied to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub(crate) fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the action name, producing the dispatch-level error.
    pub fn for_action(self, action: &str) -> ActionError {
        ActionError::InvalidParams {
            action: action.to_string(),
            field: self.field,
            reason: self.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ActionError::UnknownAction("fly".into());
        assert_eq!(err.to_string(), "unknown action: fly");

        let err = FieldError::new("query", "is required").for_action("search_google");
        assert_eq!(
            err.to_string(),
            "invalid parameters for `search_google`: field `query` is required"
        );

        let err = ActionError::ContextConflict {
            action: "done".into(),
            key: "text".into(),
        };
        assert_eq!(
            err.to_string(),
            "context value `text` collides with a parameter of `done`"
        );
    }

    #[test]
    fn runtime_source_is_preserved() {
        #[derive(Debug, thiserror::Error)]
        #[error("page crashed")]
        struct PageCrashed;

        let err = ActionError::Runtime {
            action: "go_to_url".into(),
            source: anyhow::Error::new(PageCrashed),
        };
        assert_eq!(err.action(), Some("go_to_url"));
        assert_eq!(err.to_string(), "action `go_to_url` failed: page crashed");
        let source = err.runtime_source().unwrap();
        assert!(source.downcast_ref::<PageCrashed>().is_some());
    }

    #[test]
    fn invalid_decision_has_no_action() {
        let err = ActionError::InvalidDecision("two actions populated".into());
        assert!(err.action().is_none());
        assert!(err.runtime_source().is_none());
    }
}
