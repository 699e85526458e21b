// SPDX-License-Identifier: MIT

//! LLM Agent - single-call text completion
//!
//! Sends the instruction as a system message and the input as the user
//! message, then returns the model's text. There is no retry: a failed or
//! empty completion is returned to the caller as an error.

use super::Agent;
use crate::adk::error::{ModelError, Result};
use crate::adk::model::{Content, GenerationConfig, Model};
use async_trait::async_trait;
use std::sync::Arc;

/// Text completion agent
pub struct LLMAgent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub config: Option<GenerationConfig>,
}

impl LLMAgent {
    pub fn new(
        name: String,
        description: String,
        instruction: String,
        model: Arc<dyn Model>,
    ) -> Self {
        Self {
            name,
            description,
            instruction,
            model,
            config: None,
        }
    }

    /// Use the given generation config for every call
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String> {
        let history = vec![Content::system(self.instruction.clone()), Content::user(input)];

        log::info!("Agent {} calling model", self.name);
        let response = self
            .model
            .generate_content(&history, self.config.as_ref())
            .await?;

        let text = response.text();
        if text.trim().is_empty() {
            log::error!("Agent {} received an empty completion", self.name);
            return Err(ModelError::InvalidResponse(format!(
                "agent {} received an empty completion",
                self.name
            ))
            .into());
        }

        log::info!(
            "Agent {} returning text response (length: {}, preview: '{}')",
            self.name,
            text.len(),
            text.chars().take(100).collect::<String>()
        );
        Ok(text)
    }
}
