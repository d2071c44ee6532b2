//! Structured "choose one action" decisions.
//!
//! [`ActionRegistry::decision_schema`] collects the actions eligible for a
//! target into a [`DecisionSchema`]: a sum over one variant per action.
//! The schema renders to the JSON Schema handed to the completion client
//! and validates the instance the model sends back into a [`Decision`].
//!
//! A decision instance is a JSON object keyed by action name:
//!
//! ```json
//! { "click_element": { "index": 12 } }
//! ```

use serde_json::{json, Map, Value};

use super::error::ActionError;
use super::params::ParamSchema;
use super::parsing;
use super::registry::ActionRegistry;

/// One selectable action: its name and parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionVariant {
    pub name: String,
    pub params: ParamSchema,
}

impl ActionVariant {
    /// Title used for the wrapper object, e.g. `go_to_url` → `GoToUrlActionModel`.
    pub fn model_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 11);
        let mut upper_next = true;
        for c in self.name.chars() {
            if c.is_alphabetic() {
                if upper_next {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                upper_next = false;
            } else {
                if c != '_' {
                    out.push(c);
                }
                upper_next = true;
            }
        }
        out.push_str("ActionModel");
        out
    }

    /// Wrapper object with a single required field named after the action.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        properties.insert(self.name.clone(), self.params.to_json_schema());
        json!({
            "title": self.model_name(),
            "type": "object",
            "properties": properties,
            "required": [self.name],
            "additionalProperties": false
        })
    }
}

/// The set of actions a decision may pick from.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionSchema {
    /// Nothing is eligible; only "no action" is valid.
    Empty,
    /// Exactly one eligible action, represented by its bare wrapper.
    Single(ActionVariant),
    /// Several eligible actions; exactly one must be populated.
    Union(Vec<ActionVariant>),
}

impl DecisionSchema {
    pub fn from_variants(mut variants: Vec<ActionVariant>) -> Self {
        match variants.len() {
            0 => DecisionSchema::Empty,
            1 => DecisionSchema::Single(variants.remove(0)),
            _ => DecisionSchema::Union(variants),
        }
    }

    pub fn variants(&self) -> &[ActionVariant] {
        match self {
            DecisionSchema::Empty => &[],
            DecisionSchema::Single(v) => std::slice::from_ref(v),
            DecisionSchema::Union(vs) => vs,
        }
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.variants().iter().map(|v| v.name.as_str()).collect()
    }

    pub fn variant(&self, name: &str) -> Option<&ActionVariant> {
        self.variants().iter().find(|v| v.name == name)
    }

    /// JSON Schema for structured output / constrained decoding.
    pub fn to_json_schema(&self) -> Value {
        match self {
            DecisionSchema::Empty => json!({
                "title": "EmptyActionModel",
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            DecisionSchema::Single(v) => v.to_json_schema(),
            DecisionSchema::Union(vs) => json!({
                "title": "ActionModelUnion",
                "anyOf": vs.iter().map(ActionVariant::to_json_schema).collect::<Vec<_>>()
            }),
        }
    }

    /// Validate a decoded decision instance.
    ///
    /// Keys must be eligible action names; `null`-valued keys count as
    /// unpopulated.  The populated action's parameters are validated and
    /// coerced against its schema.
    pub fn validate(&self, instance: &Value) -> Result<Decision, ActionError> {
        let Some(obj) = instance.as_object() else {
            return Err(ActionError::InvalidDecision(format!(
                "expected a JSON object, got {instance}"
            )));
        };

        if let Some(unknown) = obj.keys().find(|k| self.variant(k).is_none()) {
            return Err(ActionError::InvalidDecision(format!(
                "`{unknown}` is not an eligible action"
            )));
        }

        let populated: Vec<(&String, &Value)> =
            obj.iter().filter(|(_, v)| !v.is_null()).collect();

        match populated.as_slice() {
            [] if matches!(self, DecisionSchema::Empty) => Ok(Decision::None),
            [] => Err(ActionError::InvalidDecision("no action chosen".into())),
            [(name, params)] => {
                let variant = self.variant(name).ok_or_else(|| {
                    ActionError::InvalidDecision(format!("`{name}` is not an eligible action"))
                })?;
                let params = variant
                    .params
                    .validate(params)
                    .map_err(|e| e.for_action(name))?;
                Ok(Decision::Action(ActionInvocation {
                    name: (*name).clone(),
                    params,
                }))
            }
            many => Err(ActionError::InvalidDecision(format!(
                "expected exactly one action, got {}",
                many.len()
            ))),
        }
    }

    /// Extract the decision JSON from a model reply and validate it.
    pub fn parse_reply(&self, reply: &str) -> Result<Decision, ActionError> {
        let raw = parsing::decision_json(reply);
        let instance: Value = serde_json::from_str(&raw)
            .map_err(|e| ActionError::InvalidDecision(format!("reply is not valid JSON: {e}")))?;
        self.validate(&instance)
    }
}

/// One chosen action with validated parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    pub name: String,
    pub params: Map<String, Value>,
}

impl ActionInvocation {
    /// The target element index, when the action takes one.
    pub fn index(&self) -> Option<u64> {
        self.params.get("index").and_then(Value::as_u64)
    }

    /// Overwrite the `index` parameter.  Returns `false` when the action
    /// has no such parameter.
    pub fn set_index(&mut self, index: u64) -> bool {
        match self.params.get_mut("index") {
            Some(slot) => {
                *slot = json!(index);
                true
            }
            None => false,
        }
    }
}

/// A validated decision: one action, or none.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    None,
    Action(ActionInvocation),
}

impl Decision {
    pub fn invocation(&self) -> Option<&ActionInvocation> {
        match self {
            Decision::Action(inv) => Some(inv),
            Decision::None => None,
        }
    }

    pub fn action_name(&self) -> Option<&str> {
        self.invocation().map(|inv| inv.name.as_str())
    }

    /// Index of the element the chosen action targets, if any.
    pub fn chosen_index(&self) -> Option<u64> {
        self.invocation().and_then(ActionInvocation::index)
    }

    /// Rebind the chosen action to a concrete element index.
    ///
    /// No-op (returns `false`) when nothing is chosen or the action takes
    /// no index.
    pub fn set_chosen_index(&mut self, index: u64) -> bool {
        match self {
            Decision::Action(inv) => inv.set_index(index),
            Decision::None => false,
        }
    }

    /// The decision instance as JSON, `{}` for no action.
    pub fn to_json(&self) -> Value {
        match self {
            Decision::None => json!({}),
            Decision::Action(inv) => {
                let mut obj = Map::new();
                obj.insert(inv.name.clone(), Value::Object(inv.params.clone()));
                Value::Object(obj)
            }
        }
    }
}

impl ActionRegistry {
    /// Build the decision schema over eligible actions.
    ///
    /// `include` narrows the candidates to an allow-list.  Without a
    /// target only global actions are eligible; with one, every action
    /// whose domain filter matches it.
    pub fn decision_schema(&self, include: Option<&[String]>, target: Option<&str>) -> DecisionSchema {
        let variants = self
            .eligible(include, target)
            .map(|d| ActionVariant {
                name: d.name.clone(),
                params: d.params.clone(),
            })
            .collect();
        DecisionSchema::from_variants(variants)
    }

    /// Function-calling definitions for the same eligible actions.
    pub fn function_definitions(&self, include: Option<&[String]>, target: Option<&str>) -> Vec<Value> {
        self.eligible(include, target)
            .map(|d| {
                json!({
                    "name": d.name,
                    "description": d.description,
                    "parameters": d.params.to_json_schema(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::params::ParamType;

    fn variant(name: &str, params: ParamSchema) -> ActionVariant {
        ActionVariant {
            name: name.into(),
            params,
        }
    }

    fn click() -> ActionVariant {
        variant(
            "click_element",
            ParamSchema::builder()
                .required("index", ParamType::Integer)
                .build(),
        )
    }

    fn done() -> ActionVariant {
        variant(
            "done",
            ParamSchema::builder()
                .required("text", ParamType::String)
                .build(),
        )
    }

    #[test]
    fn model_names() {
        assert_eq!(click().model_name(), "ClickElementActionModel");
        assert_eq!(done().model_name(), "DoneActionModel");
        assert_eq!(variant("go_to_url", ParamSchema::new()).model_name(), "GoToUrlActionModel");
    }

    #[test]
    fn union_rejects_two_populated_actions() {
        let schema = DecisionSchema::from_variants(vec![click(), done()]);
        let err = schema
            .validate(&json!({ "click_element": { "index": 1 }, "done": { "text": "x" } }))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidDecision(_)));
    }

    #[test]
    fn union_ignores_null_fields() {
        let schema = DecisionSchema::from_variants(vec![click(), done()]);
        let decision = schema
            .validate(&json!({ "click_element": null, "done": { "text": "bye" } }))
            .unwrap();
        assert_eq!(decision.action_name(), Some("done"));
    }

    #[test]
    fn single_requires_its_field() {
        let schema = DecisionSchema::from_variants(vec![click()]);
        assert!(schema.validate(&json!({})).is_err());
    }

    #[test]
    fn index_rebinding() {
        let schema = DecisionSchema::from_variants(vec![click(), done()]);
        let mut decision = schema.validate(&json!({ "click_element": { "index": "4" } })).unwrap();
        assert_eq!(decision.chosen_index(), Some(4));
        assert!(decision.set_chosen_index(9));
        assert_eq!(decision.chosen_index(), Some(9));
        assert_eq!(decision.to_json(), json!({ "click_element": { "index": 9 } }));

        let mut decision = schema.validate(&json!({ "done": { "text": "x" } })).unwrap();
        assert_eq!(decision.chosen_index(), None);
        assert!(!decision.set_chosen_index(9));
        assert!(!decision.to_json()["done"].as_object().unwrap().contains_key("index"));
    }

    #[test]
    fn parse_reply_with_prose() {
        let schema = DecisionSchema::from_variants(vec![click(), done()]);
        let decision = schema
            .parse_reply("Clicking the link.\n```json\n{\"click_element\": {\"index\": 2}}\n```")
            .unwrap();
        assert_eq!(decision.chosen_index(), Some(2));

        let err = schema.parse_reply("I am not sure").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
