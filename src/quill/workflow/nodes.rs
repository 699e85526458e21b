// SPDX-License-Identifier: MIT

//! Workflow nodes
//!
//! Each node reads what it needs from [`BlogState`] and writes its result
//! back. Nodes never retry; any failure propagates to the engine.

use super::graph::NodeId;
use super::state::{BlogState, Decision, ReviewVerdict};
use crate::adk::agent::{Agent, StructuredAgent};
use crate::adk::error::{QuillError, Result};
use crate::quill::blogger::{PostPayload, Publisher};
use crate::quill::format::render_document;
use async_trait::async_trait;
use std::sync::Arc;

/// Rationale recorded when the reviewer rejects without saying why
pub const FALLBACK_REJECTION_FEEDBACK: &str =
    "The reviewer rejected the draft without comment; revise it for clarity, structure and accuracy.";

/// A processing step
#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    async fn run(&self, state: &mut BlogState) -> Result<()>;
}

/// Generates (or regenerates) the draft
pub struct WriterNode {
    agent: Arc<dyn Agent>,
}

impl WriterNode {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }

    /// Prompt for the next draft, folding in pending feedback
    pub fn prompt(state: &BlogState) -> String {
        match state.pending_feedback() {
            Some(feedback) => format!(
                "Write a blog content about the {} take into account the feedback {}",
                state.topic, feedback
            ),
            None => format!("Write a blog content about the {}", state.topic),
        }
    }
}

#[async_trait]
impl Node for WriterNode {
    fn id(&self) -> NodeId {
        NodeId::Writer
    }

    async fn run(&self, state: &mut BlogState) -> Result<()> {
        let prompt = Self::prompt(state);
        let content = self.agent.run(prompt).await?;

        state.content = content;
        state.feedback = None;
        state.revisions += 1;
        log::info!(
            "Draft {} for '{}' written ({} chars)",
            state.revisions,
            state.topic,
            state.content.len()
        );
        Ok(())
    }
}

/// Approves or rejects the draft through a structured model call
pub struct ReviewerNode {
    agent: Arc<StructuredAgent<ReviewVerdict>>,
}

impl ReviewerNode {
    pub fn new(agent: Arc<StructuredAgent<ReviewVerdict>>) -> Self {
        Self { agent }
    }

    pub fn prompt(content: &str) -> String {
        format!(
            "Review the generated blog content:\n\n{}\n\n\
             Provide feedback and indicate if it is 'Approved' or 'Rejected'. \
             If rejected, specify necessary corrections.",
            content
        )
    }
}

#[async_trait]
impl Node for ReviewerNode {
    fn id(&self) -> NodeId {
        NodeId::Reviewer
    }

    async fn run(&self, state: &mut BlogState) -> Result<()> {
        if state.content.trim().is_empty() {
            log::warn!("Reviewer skipped: no content to review");
            state.reviewer_decision = None;
            return Ok(());
        }

        let verdict = self
            .agent
            .run_structured(Self::prompt(&state.content))
            .await?;

        let feedback = verdict.feedback.trim().to_string();
        state.feedback = match verdict.approve_or_reject {
            Decision::Rejected if feedback.is_empty() => {
                Some(FALLBACK_REJECTION_FEEDBACK.to_string())
            }
            _ if feedback.is_empty() => None,
            _ => Some(feedback),
        };
        state.reviewer_decision = Some(verdict.approve_or_reject);

        log::info!("Reviewer decision: {}", verdict.approve_or_reject);
        Ok(())
    }
}

/// Pause point for a person's approval
///
/// Clears any earlier decision so the resuming caller must supply a fresh one.
pub struct HumanGateNode;

#[async_trait]
impl Node for HumanGateNode {
    fn id(&self) -> NodeId {
        NodeId::HumanGate
    }

    async fn run(&self, state: &mut BlogState) -> Result<()> {
        state.human_decision = None;
        state.feedback = None;
        Ok(())
    }
}

/// Formats the approved draft and publishes it
pub struct PublisherNode {
    publisher: Arc<dyn Publisher>,
    custom_meta_data: String,
}

impl PublisherNode {
    pub fn new(publisher: Arc<dyn Publisher>, custom_meta_data: impl Into<String>) -> Self {
        Self {
            publisher,
            custom_meta_data: custom_meta_data.into(),
        }
    }
}

#[async_trait]
impl Node for PublisherNode {
    fn id(&self) -> NodeId {
        NodeId::Publisher
    }

    async fn run(&self, state: &mut BlogState) -> Result<()> {
        let document = render_document(&state.topic, &state.content);
        let payload = PostPayload::html(&state.topic, document.clone(), &self.custom_meta_data);

        let post = self.publisher.insert_post(&payload).await?;
        if post.url.trim().is_empty() {
            return Err(QuillError::api("Blogger", "post created without a URL"));
        }

        log::info!("Blog successfully published!");
        log::info!("Author: {}", post.author);
        log::info!("Status: {}", post.status);
        log::info!("URL: {}", post.url);

        state.final_content = Some(document);
        state.published_url = Some(post.url);
        Ok(())
    }
}
