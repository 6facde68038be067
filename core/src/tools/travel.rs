use crate::tools::{extract_string_arg, extract_string_arg_opt, web_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
const DEFAULT_MODE: &str = "driving";
const NO_ROUTE_MESSAGE: &str =
    "No route found between these locations with the selected transportation mode.";

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Route {
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    duration: TextValue,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
}

/// Travel time between two locations via the directions API.
pub struct TravelDurationTool {
    client: reqwest::Client,
    api_key: String,
}

impl TravelDurationTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: web_client(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Tool for TravelDurationTool {
    fn name(&self) -> &str {
        "get_travel_duration"
    }

    fn description(&self) -> &str {
        "Calculate the travel duration between two locations for a given transportation mode."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "start_location": {
                    "type": "string",
                    "description": "The starting point for the journey"
                },
                "destination_location": {
                    "type": "string",
                    "description": "The destination point for the journey"
                },
                "transportation_mode": {
                    "type": "string",
                    "description": "One of 'driving', 'walking', 'bicycling' or 'transit'. Defaults to 'driving'."
                }
            },
            "required": ["start_location", "destination_location"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let start = extract_string_arg(&args, "start_location")?;
        let destination = extract_string_arg(&args, "destination_location")?;
        let mode = extract_string_arg_opt(&args, "transportation_mode", DEFAULT_MODE);

        let response = self
            .client
            .get(DIRECTIONS_URL)
            .query(&[
                ("origin", start.as_str()),
                ("destination", destination.as_str()),
                ("mode", mode.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        let directions: DirectionsResponse = match response.json().await {
            Ok(directions) => directions,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        Ok(summarize_directions(&directions))
    }
}

/// First route, first leg, duration text. Anything without a route reads as
/// the no-route message; API-reported failures become error observations.
fn summarize_directions(directions: &DirectionsResponse) -> ToolResult {
    match directions.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return ToolResult::success(NO_ROUTE_MESSAGE),
        other => {
            let detail = directions
                .error_message
                .clone()
                .unwrap_or_else(|| other.to_string());
            return ToolResult::error(format!("Directions API error: {}", detail));
        }
    }

    let duration = directions
        .routes
        .first()
        .and_then(|r| r.legs.first())
        .map(|l| l.duration.text.clone());

    match duration {
        Some(text) => ToolResult::success(text),
        None => ToolResult::success(NO_ROUTE_MESSAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DirectionsResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn duration_comes_from_the_first_leg() {
        let directions = parse(
            r#"{
                "status": "OK",
                "routes": [
                    { "legs": [ { "duration": { "text": "3 hours 12 mins", "value": 11520 } } ] }
                ]
            }"#,
        );
        let result = summarize_directions(&directions);
        assert!(result.success);
        assert_eq!(result.output, "3 hours 12 mins");
    }

    #[test]
    fn zero_results_reads_as_no_route() {
        let directions = parse(r#"{ "status": "ZERO_RESULTS", "routes": [] }"#);
        let result = summarize_directions(&directions);
        assert!(result.success);
        assert_eq!(result.output, NO_ROUTE_MESSAGE);
    }

    #[test]
    fn ok_without_routes_reads_as_no_route() {
        let directions = parse(r#"{ "status": "OK", "routes": [] }"#);
        let result = summarize_directions(&directions);
        assert_eq!(result.output, NO_ROUTE_MESSAGE);
    }

    #[test]
    fn api_denial_is_an_error_observation() {
        let directions = parse(
            r#"{ "status": "REQUEST_DENIED", "routes": [], "error_message": "The provided API key is invalid." }"#,
        );
        let result = summarize_directions(&directions);
        assert!(!result.success);
        assert!(result.observation().contains("API key is invalid"));
    }
}
