// SPDX-License-Identifier: MIT

//! Configuration
//!
//! Loaded once at startup from an optional YAML file, then overlaid with
//! environment variables, and passed explicitly to every constructor.
//! Nothing else in the crate reads the environment.
//!
//! ```yaml
//! model:
//!   model_name: qwen-2.5-32b
//!   temperature: 0.7
//! blogger:
//!   blog_id: "4629984879079699160"
//! workflow:
//!   max_revisions: 5
//! checkpoint_dir: .quill/sessions
//! ```

use crate::adk::error::{QuillError, Result};
use crate::adk::model::{ModelSettings, Provider};
use crate::quill::blogger::client::BLOGGER_API_BASE;
use crate::quill::workflow::WorkflowSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Blogger connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloggerSettings {
    pub blog_id: String,
    pub api_base: String,
    /// OAuth client secret downloaded from the Google Cloud console
    pub client_secret_path: PathBuf,
    /// Where the authorized credential is cached
    pub credentials_path: PathBuf,
}

impl Default for BloggerSettings {
    fn default() -> Self {
        Self {
            blog_id: "4629984879079699160".to_string(),
            api_base: BLOGGER_API_BASE.to_string(),
            client_secret_path: PathBuf::from("client_secret.json"),
            credentials_path: PathBuf::from("credentials.storage"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub model: ModelSettings,
    pub blogger: BloggerSettings,
    pub workflow: WorkflowSettings,
    /// Directory holding one checkpoint file per paused session
    pub checkpoint_dir: PathBuf,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            blogger: BloggerSettings::default(),
            workflow: WorkflowSettings::default(),
            checkpoint_dir: PathBuf::from(".quill/sessions"),
        }
    }
}

impl QuillConfig {
    /// Parse a YAML document; missing sections take their defaults
    pub fn parse_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from `path` (or defaults), overlay the process environment, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    QuillError::config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::parse_yaml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("MODEL_PROVIDER") {
            self.model.provider = Some(provider.parse::<Provider>()?);
        }
        if let Some(name) = var("MODEL_NAME") {
            self.model.model_name = name;
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.model.base_url = Some(base_url);
        }

        if self.model.api_key.is_none() {
            match self.model.resolved_provider() {
                Provider::Gemini => self.model.api_key = var("GOOGLE_API_KEY"),
                Provider::OpenAI => {
                    if let Some(key) = var("GROQ_API_KEY") {
                        self.model.api_key = Some(key);
                    } else if let Some(key) = var("OPENAI_API_KEY") {
                        self.model.api_key = Some(key);
                        self.model
                            .base_url
                            .get_or_insert_with(|| OPENAI_BASE_URL.to_string());
                    }
                }
            }
        }

        if let Some(blog_id) = var("BLOGGER_BLOG_ID") {
            self.blogger.blog_id = blog_id;
        }
        if let Some(path) = var("BLOGGER_CLIENT_SECRET") {
            self.blogger.client_secret_path = PathBuf::from(path);
        }
        if let Some(path) = var("BLOGGER_CREDENTIALS") {
            self.blogger.credentials_path = PathBuf::from(path);
        }

        if let Some(max) = var("QUILL_MAX_REVISIONS") {
            self.workflow.max_revisions = max.trim().parse().map_err(|_| {
                QuillError::config(format!("QUILL_MAX_REVISIONS must be a number, got {:?}", max))
            })?;
        }
        if let Some(dir) = var("QUILL_CHECKPOINT_DIR") {
            self.checkpoint_dir = PathBuf::from(dir);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workflow.max_revisions == 0 {
            return Err(QuillError::config("workflow.max_revisions must be at least 1"));
        }
        if self.blogger.blog_id.trim().is_empty() {
            return Err(QuillError::config("blogger.blog_id must be set"));
        }
        if self.model.model_name.trim().is_empty() {
            return Err(QuillError::config("model.model_name must be set"));
        }
        Ok(())
    }
}
