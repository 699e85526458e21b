// SPDX-License-Identifier: MIT

//! Workflow builder - wires configuration into a runnable [`BlogWorkflow`]

use crate::adk::agent::{Agent, LLMAgent, StructuredAgent};
use crate::adk::error::{QuillError, Result};
use crate::adk::model::{create_model, Content, GenerationConfig, Model};
use crate::quill::blogger::{
    BloggerClient, CredentialStore, OAuthFlow, PostPayload, PublishedPost, Publisher,
};
use crate::quill::config::QuillConfig;
use crate::quill::workflow::{BlogWorkflow, Checkpointer, FileCheckpointer, ReviewVerdict};
use async_trait::async_trait;
use std::sync::Arc;

const WRITER_INSTRUCTION: &str = "You are a blog writer. Produce a complete, well-structured \
     blog post in plain text. Use '## ' for the title line, '### ' for section headings, \
     '- ' for bullet points and '1. ' for numbered steps.";

const REVIEWER_INSTRUCTION: &str = "You are a strict blog editor. Judge whether the draft is \
     ready to publish. Reject drafts that are inaccurate, incomplete or badly organised, and \
     explain exactly what must change.";

/// Builds the workflow and its collaborators from a [`QuillConfig`]
pub struct Builder {
    config: QuillConfig,
}

impl Builder {
    pub fn new(config: QuillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    /// Writer agent: free-form text
    pub fn writer(&self, model: Arc<dyn Model>) -> Arc<dyn Agent> {
        Arc::new(
            LLMAgent::new(
                "Blog Writer".to_string(),
                "Writes and revises blog drafts".to_string(),
                WRITER_INSTRUCTION.to_string(),
                model,
            )
            .with_config(self.config.model.generation_config()),
        )
    }

    /// Reviewer agent: constrained to the [`ReviewVerdict`] schema
    pub fn reviewer(&self, model: Arc<dyn Model>) -> Result<Arc<StructuredAgent<ReviewVerdict>>> {
        let agent = StructuredAgent::with_config(
            "Blog Reviewer".to_string(),
            REVIEWER_INSTRUCTION.to_string(),
            model,
            self.config.model.generation_config(),
        )?;
        Ok(Arc::new(agent))
    }

    /// Blogger client authorised through the cached OAuth credential
    ///
    /// With `interactive` unset, a missing or expired credential is an auth
    /// error instead of a consent prompt on stdin.
    pub fn publisher(&self, interactive: bool) -> Arc<dyn Publisher> {
        let settings = &self.config.blogger;
        let mut flow = OAuthFlow::new(
            settings.client_secret_path.clone(),
            CredentialStore::new(settings.credentials_path.clone()),
        );
        if !interactive {
            flow = flow.cached_only();
        }
        Arc::new(BloggerClient::new(
            settings.api_base.clone(),
            settings.blog_id.clone(),
            Arc::new(flow),
        ))
    }

    pub fn checkpointer(&self) -> Arc<dyn Checkpointer> {
        Arc::new(FileCheckpointer::new(self.config.checkpoint_dir.clone()))
    }

    /// The full workflow against the real model and Blogger
    pub fn build(&self) -> Result<BlogWorkflow> {
        self.build_online(true)
    }

    /// Like [`Builder::build`], but publishing only uses a cached credential
    pub fn build_for_server(&self) -> Result<BlogWorkflow> {
        self.build_online(false)
    }

    fn build_online(&self, interactive: bool) -> Result<BlogWorkflow> {
        let model = create_model(&self.config.model)?;
        log::info!(
            "Using {:?} model '{}'",
            self.config.model.resolved_provider(),
            self.config.model.model_name
        );
        self.build_with(model, self.publisher(interactive))
    }

    /// The workflow around caller-supplied model and publisher
    pub fn build_with(
        &self,
        model: Arc<dyn Model>,
        publisher: Arc<dyn Publisher>,
    ) -> Result<BlogWorkflow> {
        Ok(BlogWorkflow::new(
            self.writer(model.clone()),
            self.reviewer(model)?,
            publisher,
            self.checkpointer(),
            self.config.workflow.clone(),
        ))
    }

    /// A workflow that can only inspect or cancel sessions; any model call fails
    pub fn build_offline(&self) -> Result<BlogWorkflow> {
        let model: Arc<dyn Model> = Arc::new(Offline);
        self.build_with(model, Arc::new(Offline))
    }
}

/// Stand-in for commands that never reach a model or Blogger
struct Offline;

#[async_trait]
impl Model for Offline {
    async fn generate_content(
        &self,
        _history: &[Content],
        _config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        Err(QuillError::config("no language model configured for this command"))
    }
}

#[async_trait]
impl Publisher for Offline {
    async fn insert_post(&self, _post: &PostPayload) -> Result<PublishedPost> {
        Err(QuillError::config("no publisher configured for this command"))
    }
}
