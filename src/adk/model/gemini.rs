// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, ModelSettings, Part};
use crate::adk::error::{ModelError, QuillError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiModel {
    /// Create a new GeminiModel from explicit settings
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ModelError::ApiKeyMissing("Gemini".to_string()))?;
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name: settings.model_name.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the generateContent request body
    ///
    /// System messages become `systemInstruction`; everything else goes in
    /// `contents` with the `user`/`model` roles Gemini expects.
    fn build_request_body(
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> serde_json::Value {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for c in history {
            let parts: Vec<serde_json::Value> =
                c.parts.iter().filter_map(part_to_gemini_json).collect();
            if c.role == "system" {
                system_parts.extend(parts);
            } else {
                let role = if c.role == "model" { "model" } else { "user" };
                contents.push(json!({ "role": role, "parts": parts }));
            }
        }

        let mut body = json!({ "contents": contents });

        if !system_parts.is_empty() {
            body["systemInstruction"] = json!({ "parts": system_parts });
        }

        if let Some(cfg) = config {
            let mut generation = serde_json::Map::new();
            if let Some(temp) = cfg.temperature {
                generation.insert("temperature".into(), json!(temp));
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                generation.insert("maxOutputTokens".into(), json!(max_tokens));
            }
            if let Some(top_p) = cfg.top_p {
                generation.insert("topP".into(), json!(top_p));
            }
            if let Some(schema) = &cfg.response_schema {
                generation.insert("responseMimeType".into(), json!("application/json"));
                generation.insert("responseSchema".into(), to_gemini_schema(schema));
            }
            if !generation.is_empty() {
                body["generationConfig"] = serde_json::Value::Object(generation);
            }
        }

        body
    }

    fn parse_response(resp_json: &serde_json::Value) -> Result<Content> {
        let candidate = resp_json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("No candidates in response".into()))?;

        if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
            log::debug!("Gemini finish reason: {}", finish_reason);
            if finish_reason == "SAFETY" {
                return Err(ModelError::InvalidResponse(
                    "Gemini blocked response due to safety filters".into(),
                )
                .into());
            }
        }

        let parts_json = candidate["content"]["parts"].as_array().ok_or_else(|| {
            log::error!("No parts in candidate. Full response: {}", resp_json);
            ModelError::InvalidResponse(format!("No content in Gemini response: {}", candidate))
        })?;

        Ok(Content {
            role: "model".to_string(),
            parts: parts_json.iter().flat_map(parse_gemini_part).collect(),
        })
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model_name
        );
        let body = Self::build_request_body(history, config);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited {
                retry_after_secs: None,
            }
            .into());
        }
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(QuillError::api("Gemini", format!("{}: {}", status, text)));
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        Self::parse_response(&resp_json)
    }
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<serde_json::Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None,
    }
}

/// Parse a Gemini API JSON part into Parts
pub fn parse_gemini_part(p: &serde_json::Value) -> Vec<Part> {
    let mut parts = Vec::new();

    // Thinking models flag reasoning parts with `thought: true`
    if p.get("thought").and_then(|t| t.as_bool()) == Some(true) {
        if let Some(text) = p["text"].as_str() {
            parts.push(Part::Thinking(text.to_string()));
        }
        return parts;
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    }

    parts
}

/// Reduce a JSON Schema to the OpenAPI subset Gemini accepts
///
/// Gemini rejects `$schema`, `title`, `definitions` and
/// `additionalProperties`; subschemas are expected to be inlined already.
pub fn to_gemini_schema(schema: &serde_json::Value) -> serde_json::Value {
    const UNSUPPORTED: [&str; 4] = ["$schema", "title", "definitions", "additionalProperties"];

    match schema {
        serde_json::Value::Object(obj) => serde_json::Value::Object(
            obj.iter()
                .filter(|(k, _)| !UNSUPPORTED.contains(&k.as_str()))
                .map(|(k, v)| {
                    // Property names live under "properties" and must survive as-is
                    if k == "properties" {
                        let props = v
                            .as_object()
                            .map(|p| {
                                p.iter()
                                    .map(|(name, s)| (name.clone(), to_gemini_schema(s)))
                                    .collect()
                            })
                            .unwrap_or_default();
                        (k.clone(), serde_json::Value::Object(props))
                    } else {
                        (k.clone(), to_gemini_schema(v))
                    }
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(to_gemini_schema).collect())
        }
        other => other.clone(),
    }
}
