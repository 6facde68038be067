use crate::tools::{extract_string_arg, web_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;

const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
const DEFAULT_OUTPUT: &str = "image.png";

/// The active model and output path for image generation. Fixed at
/// construction; a per-call `model` argument overrides for that call only.
#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    pub model: String,
    pub output_path: PathBuf,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Text-to-image generation through the inference API. The generated PNG is
/// written to the configured path and the saved location is reported back.
pub struct TextToImageTool {
    client: reqwest::Client,
    token: String,
    config: ImageGenConfig,
}

impl TextToImageTool {
    pub fn new(token: impl Into<String>, config: ImageGenConfig) -> Self {
        Self {
            client: web_client(),
            token: token.into(),
            config,
        }
    }
}

/// Per-call override wins over the configured default; no state changes.
fn resolve_model<'a>(config: &'a ImageGenConfig, requested: Option<&'a str>) -> &'a str {
    match requested {
        Some(model) if !model.trim().is_empty() => model,
        _ => &config.model,
    }
}

#[async_trait]
impl Tool for TextToImageTool {
    fn name(&self) -> &str {
        "image_generator"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt. Detailed prompts such as 'high-res' or 'photorealistic' yield better results."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The text description for the image"
                },
                "model": {
                    "type": "string",
                    "description": "Model ID to use for generation. Defaults to the configured model."
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let prompt = extract_string_arg(&args, "prompt")?;
        let requested = args.get("model").and_then(|v| v.as_str());
        let model = resolve_model(&self.config, requested);

        let response = self
            .client
            .post(format!("{}/{}", INFERENCE_BASE_URL, model))
            .bearer_auth(&self.token)
            .header("Accept", "image/png")
            .json(&json!({ "inputs": prompt }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::error(format!("Image generation failed: {}", e))),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(ToolResult::error(format!(
                "Image generation failed ({}): {}",
                status, body
            )));
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(ToolResult::error(format!("Image generation failed: {}", e))),
        };

        if let Err(e) = tokio::fs::write(&self.config.output_path, &bytes).await {
            return Ok(ToolResult::error(format!(
                "Failed to save image to {}: {}",
                self.config.output_path.display(),
                e
            )));
        }

        Ok(ToolResult::success(format!(
            "Image saved as {}. Prompt: '{}'. Model: '{}'.",
            self.config.output_path.display(),
            prompt,
            model
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_the_fixed_path() {
        let config = ImageGenConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.output_path, PathBuf::from("image.png"));
    }

    #[test]
    fn per_call_model_overrides_without_mutation() {
        let config = ImageGenConfig::default();
        assert_eq!(resolve_model(&config, Some("acme/other-model")), "acme/other-model");
        // The configured default is untouched for the next call.
        assert_eq!(resolve_model(&config, None), DEFAULT_MODEL);
    }

    #[test]
    fn blank_override_falls_back_to_the_default() {
        let config = ImageGenConfig::default();
        assert_eq!(resolve_model(&config, Some("  ")), DEFAULT_MODEL);
    }
}
