// SPDX-License-Identifier: MIT

//! Model module - defines LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [gemini] - Google's Gemini API
//! - [openai] - any OpenAI-compatible chat completions API (OpenAI, Groq)

pub mod gemini;
pub mod openai;

use crate::adk::error::{ModelError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// JSON Schema the response must conform to (structured output)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, ignoring thinking output
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect()
    }
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models (e.g., Gemini's thinking mode)
    Thinking(String),
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content>;
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// Any OpenAI-compatible endpoint (OpenAI, Groq, local servers)
    #[serde(alias = "openai", alias = "groq", alias = "Groq")]
    OpenAI,
    #[serde(alias = "gemini", alias = "google", alias = "Google")]
    Gemini,
}

impl std::str::FromStr for Provider {
    type Err = ModelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "groq" => Ok(Provider::OpenAI),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(ModelError::UnsupportedModel(other.to_string())),
        }
    }
}

/// Settings needed to construct a model client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider; inferred from `model_name` when absent
    pub provider: Option<Provider>,
    pub model_name: String,
    /// API key; never serialized back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: None,
            model_name: "qwen-2.5-32b".to_string(),
            api_key: None,
            base_url: None,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl ModelSettings {
    /// Explicit provider, or the one implied by the model name
    pub fn resolved_provider(&self) -> Provider {
        self.provider
            .unwrap_or_else(|| infer_provider_from_model(&self.model_name))
    }

    /// Generation config carrying the configured sampling parameters
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            ..Default::default()
        }
    }
}

/// Infer the provider from the model name prefix
///
/// Anything that is not recognisably Gemini goes to the OpenAI-compatible
/// client, which covers OpenAI itself and Groq-hosted open models.
pub fn infer_provider_from_model(model_name: &str) -> Provider {
    let name_lower = model_name.to_lowercase();
    if name_lower.starts_with("gemini") || name_lower.starts_with("models/gemini") {
        Provider::Gemini
    } else {
        Provider::OpenAI
    }
}

/// Create the model client described by the settings
pub fn create_model(settings: &ModelSettings) -> Result<Arc<dyn Model>> {
    let provider = settings.resolved_provider();
    log::debug!(
        "Using provider '{:?}' with model '{}'",
        provider,
        settings.model_name
    );

    match provider {
        Provider::OpenAI => Ok(Arc::new(openai::OpenAIModel::new(settings)?)),
        Provider::Gemini => Ok(Arc::new(gemini::GeminiModel::new(settings)?)),
    }
}

/// Strip a surrounding Markdown code fence, if any
///
/// Some models wrap JSON output in ```json fences even when asked for a
/// schema-constrained response.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop the info string (e.g. "json") on the opening line
    match rest.find('\n') {
        Some(idx) => rest[idx + 1..].trim(),
        None => rest.trim(),
    }
}
