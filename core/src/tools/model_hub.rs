use crate::tools::{extract_string_arg, web_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const HUB_MODELS_URL: &str = "https://huggingface.co/api/models";

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(alias = "modelId")]
    id: String,
}

/// Looks up the most downloaded model for a task on the model hub.
pub struct ModelDownloadTool {
    client: reqwest::Client,
}

impl ModelDownloadTool {
    pub fn new() -> Self {
        Self {
            client: web_client(),
        }
    }
}

impl Default for ModelDownloadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ModelDownloadTool {
    fn name(&self) -> &str {
        "model_download_tool"
    }

    fn description(&self) -> &str {
        "Retrieve the most downloaded model for a task (e.g. 'text-to-image') from the model hub."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "The task for which to fetch the most downloaded model"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let task = extract_string_arg(&args, "task")?;

        let response = self
            .client
            .get(HUB_MODELS_URL)
            .query(&[
                ("filter", task.as_str()),
                ("sort", "downloads"),
                ("direction", "-1"),
                ("limit", "1"),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::error(format!("Hub request failed: {}", e))),
        };

        if !response.status().is_success() {
            return Ok(ToolResult::error(format!(
                "Hub request failed: {}",
                response.status()
            )));
        }

        let models: Vec<ModelEntry> = match response.json().await {
            Ok(models) => models,
            Err(e) => return Ok(ToolResult::error(format!("Hub response malformed: {}", e))),
        };

        Ok(top_model(&models, &task))
    }
}

fn top_model(models: &[ModelEntry], task: &str) -> ToolResult {
    match models.first() {
        Some(entry) => ToolResult::success(entry.id.clone()),
        None => ToolResult::error(format!("No models found for task '{}'", task)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_listed_model_wins() {
        let models: Vec<ModelEntry> = serde_json::from_str(
            r#"[{"id": "black-forest-labs/FLUX.1-dev"}, {"id": "runner-up/model"}]"#,
        )
        .unwrap();
        let result = top_model(&models, "text-to-image");
        assert!(result.success);
        assert_eq!(result.output, "black-forest-labs/FLUX.1-dev");
    }

    #[test]
    fn model_id_alias_is_accepted() {
        let models: Vec<ModelEntry> =
            serde_json::from_str(r#"[{"modelId": "org/aliased-model"}]"#).unwrap();
        assert_eq!(top_model(&models, "x").output, "org/aliased-model");
    }

    #[test]
    fn empty_listing_is_an_error_observation() {
        let result = top_model(&[], "underwater-basket-weaving");
        assert!(!result.success);
        assert!(result.observation().contains("underwater-basket-weaving"));
    }
}
