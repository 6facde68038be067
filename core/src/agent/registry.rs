use crate::traits::{Tool, ToolResult, ToolSpec};
use anyhow::{Result, bail};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Maps a tool name to its typed handler plus the declared parameter schema.
/// Invocation is a lookup followed by a schema check; nothing is dispatched
/// on arguments that do not match the declaration.
pub struct ToolRegistry {
    tools: Mutex<Vec<Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Mutex::new(Vec::new()),
        }
    }

    /// Registers a tool. Names are unique within a registry.
    pub fn register(&self, tool: Box<dyn Tool>) -> Result<()> {
        let mut tools = self.tools.lock().unwrap();
        if tools.iter().any(|t| t.name() == tool.name()) {
            bail!("Tool '{}' is already registered", tool.name());
        }
        tools.push(Arc::from(tool));
        Ok(())
    }

    pub fn get_specs(&self) -> Vec<ToolSpec> {
        let tools = self.tools.lock().unwrap();
        tools.iter().map(|t| t.spec()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.lock().unwrap().is_empty()
    }

    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        let tool = {
            let tools = self.tools.lock().unwrap();
            tools.iter().find(|t| t.name() == name).cloned()
        };

        let tool = match tool {
            Some(tool) => tool,
            None => return ToolResult::error(format!("Tool '{}' not found", name)),
        };

        if let Err(e) = validate_args(&tool.parameters_schema(), &args) {
            return ToolResult::error(format!("Invalid arguments for '{}': {}", name, e));
        }

        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => ToolResult::error(format!("Execution failed: {}", e)),
        }
    }
}

/// Checks an arguments object against a `{"type": "object", ...}` schema:
/// required properties must be present, and declared primitive types must
/// match. Extra arguments are passed through untouched.
pub fn validate_args(schema: &Value, args: &Value) -> std::result::Result<(), String> {
    let Some(args_obj) = args.as_object() else {
        return Err("arguments must be a JSON object".to_string());
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !args_obj.contains_key(key) {
                return Err(format!("missing required parameter '{}'", key));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (key, value) in args_obj {
        let Some(declared) = properties.get(key).and_then(|p| p.get("type")) else {
            continue;
        };
        let Some(expected) = declared.as_str() else {
            continue;
        };
        if !type_matches(expected, value) {
            return Err(format!(
                "parameter '{}' should be of type {}, got {}",
                key,
                expected,
                type_name(value)
            ));
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercases text"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to uppercase" },
                    "repeat": { "type": "integer", "description": "Repetitions" }
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
            let text = args["text"].as_str().unwrap_or_default();
            Ok(ToolResult::success(text.to_uppercase()))
        }
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let registry = ToolRegistry::new();
        registry.register(Box::new(UpperTool)).unwrap();
        assert!(registry.register(Box::new(UpperTool)).is_err());
        assert_eq!(registry.get_specs().len(), 1);
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let registry = ToolRegistry::new();
        registry.register(Box::new(UpperTool)).unwrap();

        let result = registry.execute("upper", json!({"text": "hi"})).await;
        assert!(result.success);
        assert_eq!(result.output, "HI");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_observation() {
        let registry = ToolRegistry::new();
        let result = registry.execute("nope", json!({})).await;
        assert!(!result.success);
        assert!(result.observation().contains("not found"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let registry = ToolRegistry::new();
        registry.register(Box::new(UpperTool)).unwrap();

        let result = registry.execute("upper", json!({})).await;
        assert!(!result.success);
        assert!(result.observation().contains("missing required parameter 'text'"));
    }

    #[tokio::test]
    async fn wrong_argument_type_is_rejected() {
        let registry = ToolRegistry::new();
        registry.register(Box::new(UpperTool)).unwrap();

        let result = registry
            .execute("upper", json!({"text": "hi", "repeat": "three"}))
            .await;
        assert!(!result.success);
        assert!(result.observation().contains("'repeat'"));
    }

    #[test]
    fn validate_accepts_extra_arguments() {
        let schema = json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "required": ["a"]
        });
        assert!(validate_args(&schema, &json!({"a": "x", "b": 1})).is_ok());
    }

    #[test]
    fn validate_rejects_non_object_arguments() {
        let schema = json!({"type": "object", "properties": {}});
        assert!(validate_args(&schema, &json!("just a string")).is_err());
    }
}
