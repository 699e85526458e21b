// SPDX-License-Identifier: MIT

//! Blog workflow state

use crate::adk::error::WorkflowError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Decision {
    Approved,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved => write!(f, "Approved"),
            Decision::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for Decision {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approved" | "approve" => Ok(Decision::Approved),
            "rejected" | "reject" => Ok(Decision::Rejected),
            _ => Err(WorkflowError::InvalidDecision(s.to_string())),
        }
    }
}

/// What the automated reviewer returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewVerdict {
    /// Decision on the blog content: 'Approved' or 'Rejected'
    pub approve_or_reject: Decision,
    /// Reviewer feedback
    pub feedback: String,
}

/// What a person supplies when resuming a paused run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanInput {
    pub decision: Decision,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl HumanInput {
    pub fn approve() -> Self {
        Self {
            decision: Decision::Approved,
            feedback: None,
        }
    }

    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            decision: Decision::Rejected,
            feedback: Some(feedback.into()),
        }
    }
}

/// State threaded through every node of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogState {
    pub topic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reviewer_decision: Option<Decision>,
    #[serde(default)]
    pub human_decision: Option<Decision>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub final_content: Option<String>,
    #[serde(default)]
    pub published_url: Option<String>,
    /// Writer passes so far
    #[serde(default)]
    pub revisions: u32,
}

impl BlogState {
    /// Fresh state with only the topic set
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// Feedback for the writer, if any non-blank feedback is pending
    pub fn pending_feedback(&self) -> Option<&str> {
        self.feedback
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    pub fn is_published(&self) -> bool {
        self.published_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Record a person's decision at the human gate
    pub fn apply_human_input(&mut self, input: HumanInput) {
        self.human_decision = Some(input.decision);
        self.feedback = input.feedback.filter(|f| !f.trim().is_empty());
    }
}
