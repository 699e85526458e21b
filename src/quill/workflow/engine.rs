// SPDX-License-Identifier: MIT

//! Workflow engine
//!
//! Runs one node at a time, following the transition table, until the run
//! reaches the human gate (the state is checkpointed and control returns to
//! the caller) or the end (the checkpoint is discarded).

use super::checkpoint::{validate_session_id, Checkpoint, Checkpointer};
use super::graph::{self, Next, NodeId};
use super::nodes::{HumanGateNode, Node, PublisherNode, ReviewerNode, WriterNode};
use super::state::{BlogState, HumanInput, ReviewVerdict};
use crate::adk::agent::{Agent, StructuredAgent};
use crate::adk::error::{QuillError, Result, WorkflowError};
use crate::quill::blogger::Publisher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Maximum writer passes per session, across both rejection loops
    pub max_revisions: u32,
    /// `customMetaData` attached to every published post
    pub custom_meta_data: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_revisions: 5,
            custom_meta_data: "This is meta data".to_string(),
        }
    }
}

/// Where a run stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    /// Paused at the human gate, waiting for [`BlogWorkflow::resume`]
    Suspended { session_id: String, state: BlogState },
    /// Reached the end; the post has been published
    Completed { session_id: String, state: BlogState },
}

impl RunOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            RunOutcome::Suspended { session_id, .. } | RunOutcome::Completed { session_id, .. } => {
                session_id
            }
        }
    }

    pub fn state(&self) -> &BlogState {
        match self {
            RunOutcome::Suspended { state, .. } | RunOutcome::Completed { state, .. } => state,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, RunOutcome::Suspended { .. })
    }
}

/// The writer → reviewer → human → publisher workflow
pub struct BlogWorkflow {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    checkpointer: Arc<dyn Checkpointer>,
    settings: WorkflowSettings,
}

impl BlogWorkflow {
    /// Assemble the standard nodes around the given collaborators
    pub fn new(
        writer: Arc<dyn Agent>,
        reviewer: Arc<StructuredAgent<ReviewVerdict>>,
        publisher: Arc<dyn Publisher>,
        checkpointer: Arc<dyn Checkpointer>,
        settings: WorkflowSettings,
    ) -> Self {
        let nodes: Vec<Arc<dyn Node>> = vec![
            Arc::new(WriterNode::new(writer)),
            Arc::new(ReviewerNode::new(reviewer)),
            Arc::new(HumanGateNode),
            Arc::new(PublisherNode::new(
                publisher,
                settings.custom_meta_data.clone(),
            )),
        ];

        Self {
            nodes: nodes.into_iter().map(|n| (n.id(), n)).collect(),
            checkpointer,
            settings,
        }
    }

    /// Build from custom node implementations; every [`NodeId`] must be covered
    pub fn from_nodes(
        nodes: Vec<Arc<dyn Node>>,
        checkpointer: Arc<dyn Checkpointer>,
        settings: WorkflowSettings,
    ) -> Result<Self> {
        let nodes: HashMap<NodeId, Arc<dyn Node>> =
            nodes.into_iter().map(|n| (n.id(), n)).collect();

        for id in [
            NodeId::Writer,
            NodeId::Reviewer,
            NodeId::HumanGate,
            NodeId::Publisher,
        ] {
            if !nodes.contains_key(&id) {
                return Err(QuillError::config(format!("workflow has no '{}' node", id)));
            }
        }

        Ok(Self {
            nodes,
            checkpointer,
            settings,
        })
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Start a run under a fresh session id
    pub async fn start(&self, topic: impl Into<String>) -> Result<RunOutcome> {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.start_session(&session_id, topic).await
    }

    /// Start a run under a caller-chosen session id
    pub async fn start_session(
        &self,
        session_id: &str,
        topic: impl Into<String>,
    ) -> Result<RunOutcome> {
        validate_session_id(session_id)?;
        if self.checkpointer.load(session_id).await?.is_some() {
            return Err(WorkflowError::SessionExists(session_id.to_string()).into());
        }

        let state = BlogState::new(topic);
        log::info!("Session {}: starting run for '{}'", session_id, state.topic);
        self.run_from(session_id, state, Next::Node(graph::ENTRY))
            .await
    }

    /// Continue a run paused at the human gate
    ///
    /// The checkpoint is claimed before anything runs, so a concurrent resume
    /// of the same session sees `SessionNotFound`. If the run fails, the
    /// claimed checkpoint is put back and the resume can be retried.
    pub async fn resume(&self, session_id: &str, input: HumanInput) -> Result<RunOutcome> {
        validate_session_id(session_id)?;
        let checkpoint = self
            .checkpointer
            .take(session_id)
            .await?
            .ok_or_else(|| WorkflowError::SessionNotFound(session_id.to_string()))?;

        if checkpoint.node != NodeId::HumanGate {
            self.checkpointer.save(&checkpoint).await?;
            return Err(WorkflowError::NotSuspended {
                session_id: session_id.to_string(),
                node: checkpoint.node.to_string(),
            }
            .into());
        }

        log::info!(
            "Session {}: resuming with human decision {}",
            session_id,
            input.decision
        );

        let mut state = checkpoint.state.clone();
        state.apply_human_input(input);
        let result = match graph::transition(NodeId::HumanGate, &state) {
            Ok(next) => self.run_from(session_id, state, next).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            match self.checkpointer.save(&checkpoint).await {
                Ok(()) => log::info!("Session {}: checkpoint restored after failure", session_id),
                Err(e) => log::error!(
                    "Session {}: could not restore checkpoint: {}",
                    session_id,
                    e
                ),
            }
        }
        result
    }

    /// The stored checkpoint for a session, if it is paused
    pub async fn status(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        self.checkpointer.load(session_id).await
    }

    /// Discard a paused session; returns whether it existed
    pub async fn cancel(&self, session_id: &str) -> Result<bool> {
        let existed = self.checkpointer.delete(session_id).await?;
        if existed {
            log::info!("Session {}: cancelled", session_id);
        }
        Ok(existed)
    }

    /// Ids of all paused sessions
    pub async fn sessions(&self) -> Result<Vec<String>> {
        self.checkpointer.list().await
    }

    async fn run_from(
        &self,
        session_id: &str,
        mut state: BlogState,
        mut next: Next,
    ) -> Result<RunOutcome> {
        loop {
            let node_id = match next {
                Next::Node(id) => id,
                Next::End => {
                    self.checkpointer.delete(session_id).await?;
                    log::info!(
                        "Session {}: completed after {} revision(s)",
                        session_id,
                        state.revisions
                    );
                    return Ok(RunOutcome::Completed {
                        session_id: session_id.to_string(),
                        state,
                    });
                }
            };

            if node_id == NodeId::Writer && state.revisions >= self.settings.max_revisions {
                log::error!(
                    "Session {}: revision limit {} reached",
                    session_id,
                    self.settings.max_revisions
                );
                return Err(QuillError::MaxIterations {
                    kind: "revisions".to_string(),
                    limit: self.settings.max_revisions,
                });
            }

            let node = self
                .nodes
                .get(&node_id)
                .ok_or_else(|| QuillError::config(format!("workflow has no '{}' node", node_id)))?;

            log::info!("Session {}: executing node {}", session_id, node_id);
            if let Err(e) = node.run(&mut state).await {
                log::error!("Session {}: node {} failed: {}", session_id, node_id, e);
                return Err(e);
            }

            if node_id == NodeId::HumanGate {
                let checkpoint = Checkpoint::new(session_id, state.clone(), node_id);
                self.checkpointer.save(&checkpoint).await?;
                log::info!("Session {}: waiting for human approval", session_id);
                return Ok(RunOutcome::Suspended {
                    session_id: session_id.to_string(),
                    state,
                });
            }

            next = graph::transition(node_id, &state)?;
        }
    }
}
