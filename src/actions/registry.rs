//! Action catalog and registration.
//!
//! [`ActionRegistry`] owns an insertion-ordered list of
//! [`ActionDescriptor`]s.  Action owners describe an action with an
//! [`ActionSpec`] and hand it to [`ActionRegistry::register`], which
//! wraps the body in an [`ActionHandler`] so async and blocking bodies
//! are called the same way.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde_json::Value;
use tracing::debug;

use super::dispatch::ActionContext;
use super::domain;
use super::params::{ParamSchema, ParamSchemaBuilder, ParamType};

/// Boxed future returned by async action bodies.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

/// Async action body: awaited on the dispatching task.
pub type AsyncActionFn = Arc<dyn Fn(Value, ActionContext) -> ActionFuture + Send + Sync>;

/// Blocking action body: run on the blocking thread pool.
pub type BlockingActionFn =
    Arc<dyn Fn(Value, ActionContext) -> anyhow::Result<Value> + Send + Sync>;

/// Trait for actions implemented as types rather than closures.
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action with validated arguments.
    async fn call(&self, args: Value, ctx: ActionContext) -> anyhow::Result<Value>;
}

/// The callable behind an action, tagged with how it must be run.
#[derive(Clone)]
pub enum ActionBody {
    Async(AsyncActionFn),
    Blocking(BlockingActionFn),
}

impl ActionBody {
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        ActionBody::Async(Arc::new(move |args: Value, ctx: ActionContext| -> ActionFuture {
            Box::pin(f(args, ctx))
        }))
    }

    pub fn from_blocking<F>(f: F) -> Self
    where
        F: Fn(Value, ActionContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        ActionBody::Blocking(Arc::new(f))
    }

    pub fn from_action<A: Action + 'static>(action: A) -> Self {
        let action = Arc::new(action);
        ActionBody::Async(Arc::new(move |args: Value, ctx: ActionContext| -> ActionFuture {
            let action = Arc::clone(&action);
            Box::pin(async move { action.call(args, ctx).await })
        }))
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, ActionBody::Blocking(_))
    }
}

/// Uniform execution adapter around an [`ActionBody`].
///
/// Async bodies are awaited in place.  Blocking bodies are moved onto
/// Tokio's blocking pool so they never stall the dispatching task.
#[derive(Clone)]
pub struct ActionHandler {
    name: Arc<str>,
    body: ActionBody,
}

impl ActionHandler {
    pub fn new(name: &str, body: ActionBody) -> Self {
        Self {
            name: Arc::from(name),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_blocking(&self) -> bool {
        self.body.is_blocking()
    }

    /// Run the body.  Errors raised by the body are returned untouched.
    pub async fn call(&self, args: Value, ctx: ActionContext) -> anyhow::Result<Value> {
        match &self.body {
            ActionBody::Async(f) => f(args, ctx).await,
            ActionBody::Blocking(f) => {
                let f = Arc::clone(f);
                tokio::task::spawn_blocking(move || f(args, ctx))
                    .await
                    .map_err(|e| anyhow::anyhow!("action `{}` worker failed: {e}", self.name))?
            }
        }
    }
}

impl fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandler")
            .field("name", &self.name)
            .field("blocking", &self.is_blocking())
            .finish()
    }
}

/// Everything an action owner supplies at registration time.
pub struct ActionSpec {
    name: String,
    description: String,
    schema: Option<ParamSchema>,
    declared: ParamSchemaBuilder,
    domains: Option<Vec<String>>,
    allowed_domains: Option<Vec<String>>,
    body: ActionBody,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, body: ActionBody) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
            declared: ParamSchema::builder(),
            domains: None,
            allowed_domains: None,
            body,
        }
    }

    /// Use an explicit parameter schema.  Overrides any declared params.
    pub fn schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Use the schema of a `JsonSchema` type.
    pub fn schema_of<T: JsonSchema>(self) -> Self {
        self.schema(ParamSchema::of::<T>())
    }

    /// Declare one parameter of the body.
    ///
    /// An undeclared type means `string`.  A parameter without a default
    /// is required.
    pub fn param(
        mut self,
        name: impl Into<String>,
        ty: Option<ParamType>,
        default: Option<Value>,
    ) -> Self {
        let ty = ty.unwrap_or(ParamType::String);
        self.declared = match default {
            Some(value) => self.declared.optional(name, ty, Some(value)),
            None => self.declared.required(name, ty),
        };
        self
    }

    /// Describe the most recently declared parameter.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.declared = self.declared.describe(description);
        self
    }

    /// Restrict visibility to targets matching these domain patterns.
    pub fn domains<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Same as [`ActionSpec::domains`], but wins when both are set.
    pub fn allowed_domains<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Immutable record of one registered action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub params: ParamSchema,
    /// `None` means the action is visible everywhere.
    pub domains: Option<Vec<String>>,
    pub handler: ActionHandler,
}

impl ActionDescriptor {
    pub fn is_global(&self) -> bool {
        self.domains.is_none()
    }

    /// Whether this action is offered for `target`.
    pub fn visible_on(&self, target: &str) -> bool {
        domain::matches(self.domains.as_deref(), target)
    }
}

/// Insertion-ordered catalog of actions, keyed by unique name.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: Vec<ActionDescriptor>,
    excluded: HashSet<String>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that silently skips the named actions.
    pub fn with_exclusions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: Vec::new(),
            excluded: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// Register an action and return its wrapped handler.
    ///
    /// Excluded names never enter the catalog, but their handler is still
    /// returned so callers can invoke the body directly.  Re-registering a
    /// name replaces the earlier descriptor and keeps its position.
    pub fn register(&mut self, spec: ActionSpec) -> ActionHandler {
        let handler = ActionHandler::new(&spec.name, spec.body);

        if self.is_excluded(&spec.name) {
            debug!(action = %spec.name, "action excluded, skipping registration");
            return handler;
        }

        let params = spec.schema.unwrap_or_else(|| spec.declared.build());
        let descriptor = ActionDescriptor {
            name: spec.name,
            description: spec.description,
            params,
            domains: spec.allowed_domains.or(spec.domains),
            handler: handler.clone(),
        };

        debug!(
            action = %descriptor.name,
            params = descriptor.params.len(),
            blocking = handler.is_blocking(),
            global = descriptor.is_global(),
            "action registered"
        );

        match self.actions.iter_mut().find(|d| d.name == descriptor.name) {
            Some(existing) => {
                debug!(action = %descriptor.name, "replacing earlier registration");
                *existing = descriptor;
            }
            None => self.actions.push(descriptor),
        }

        handler
    }

    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Actions a model may choose from, in registration order.
    ///
    /// Without a target only global actions qualify; with one, any action
    /// whose filter matches it (global actions match trivially).
    pub fn eligible<'a>(
        &'a self,
        include: Option<&'a [String]>,
        target: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ActionDescriptor> + 'a {
        self.actions.iter().filter(move |d| {
            if let Some(names) = include {
                if !names.iter().any(|n| *n == d.name) {
                    return false;
                }
            }
            match target {
                None => d.is_global(),
                Some(t) => d.visible_on(t),
            }
        })
    }
}

/// A catalog that can be swapped wholesale while dispatches are running.
///
/// Readers take a cheap [`Arc`] snapshot; [`SharedRegistry::replace`]
/// installs a fully-built registry in one step.  In-flight dispatches keep
/// using the snapshot they started with.
#[derive(Debug, Default, Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Arc<ActionRegistry>>>,
}

impl SharedRegistry {
    pub fn new(registry: ActionRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub fn snapshot(&self) -> Arc<ActionRegistry> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Install `registry`, returning the one it replaced.
    pub fn replace(&self, registry: ActionRegistry) -> Arc<ActionRegistry> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        debug!(actions = registry.len(), "swapping action registry");
        std::mem::replace(&mut *guard, Arc::new(registry))
    }
}
