//! Built-in `done` action: ends the task and reports the outcome.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::actions::{Action, ActionBody, ActionContext, ActionSpec, ParamType};

pub struct Done;

#[async_trait]
impl Action for Done {
    async fn call(&self, args: Value, _ctx: ActionContext) -> anyhow::Result<Value> {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("done: missing 'text'"))?;
        let success = args.get("success").and_then(Value::as_bool).unwrap_or(true);

        tracing::info!(success, "task finished");
        Ok(json!({
            "is_done": true,
            "success": success,
            "text": text,
        }))
    }
}

pub fn spec() -> ActionSpec {
    ActionSpec::new(
        "done",
        "Finish the task and report the result",
        ActionBody::from_action(Done),
    )
    .param("text", Some(ParamType::String), None)
    .describe("Final answer or summary for the user")
    .param("success", Some(ParamType::Boolean), Some(json!(true)))
}
