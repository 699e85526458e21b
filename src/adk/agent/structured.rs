// SPDX-License-Identifier: MIT

//! Structured Agent - completion constrained to a JSON schema
//!
//! The schema is derived from the target type with `schemars`, passed to the
//! provider as its structured-output parameter, and also spelled out in the
//! system instruction for providers that only honour it loosely.

use crate::adk::error::{ModelError, Result};
use crate::adk::model::{strip_code_fence, Content, GenerationConfig, Model};
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Agent whose output is deserialized into `T`
pub struct StructuredAgent<T> {
    pub name: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    config: GenerationConfig,
    schema: serde_json::Value,
    _output: PhantomData<fn() -> T>,
}

impl<T> StructuredAgent<T>
where
    T: DeserializeOwned + JsonSchema,
{
    pub fn new(name: String, instruction: String, model: Arc<dyn Model>) -> Result<Self> {
        Self::with_config(name, instruction, model, GenerationConfig::default())
    }

    /// Build with base sampling parameters; the response schema is filled in
    pub fn with_config(
        name: String,
        instruction: String,
        model: Arc<dyn Model>,
        mut config: GenerationConfig,
    ) -> Result<Self> {
        let schema = response_schema::<T>()?;
        config.response_schema = Some(schema.clone());

        Ok(Self {
            name,
            instruction,
            model,
            config,
            schema,
            _output: PhantomData,
        })
    }

    /// The JSON schema sent with every request
    pub fn schema(&self) -> &serde_json::Value {
        &self.schema
    }

    fn system_prompt(&self) -> String {
        format!(
            "{}\n\nRespond only with a JSON object matching this schema:\n{}",
            self.instruction, self.schema
        )
    }

    /// Run one structured completion and deserialize the result
    pub async fn run_structured(&self, input: String) -> Result<T> {
        let history = vec![Content::system(self.system_prompt()), Content::user(input)];

        log::info!("Agent {} calling model for structured output", self.name);
        let response = self
            .model
            .generate_content(&history, Some(&self.config))
            .await?;

        parse_structured(&response.text())
    }
}

/// Generate an inlined draft-07 schema for `T`
pub fn response_schema<T: JsonSchema>() -> Result<serde_json::Value> {
    let generator = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();
    Ok(serde_json::to_value(schema)?)
}

/// Parse model text as `T`, tolerating a Markdown code fence
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).map_err(|e| {
        log::error!("Structured output did not match schema: {} ({})", e, body);
        ModelError::InvalidResponse(format!("structured output did not match schema: {}", e))
            .into()
    })
}
