// SPDX-License-Identifier: MIT

//! Transition table for the blog workflow
//!
//! ```text
//! START -> Writer -> Reviewer --Approved--> HumanGate --Approved--> Publisher -> END
//!            ^          |                      |
//!            +-Rejected-+----------Rejected----+
//! ```

use super::state::{BlogState, Decision};
use crate::adk::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing steps of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    Writer,
    Reviewer,
    HumanGate,
    Publisher,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeId::Writer => "Blog Writer",
            NodeId::Reviewer => "Blog Reviewer",
            NodeId::HumanGate => "Human",
            NodeId::Publisher => "Blog Publisher",
        };
        f.write_str(name)
    }
}

/// Where control goes after a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Node(NodeId),
    End,
}

/// First node of every run
pub const ENTRY: NodeId = NodeId::Writer;

/// Gates: which decision field drives the branch
fn gate_decision(node: NodeId, state: &BlogState) -> Option<Option<Decision>> {
    match node {
        NodeId::Reviewer => Some(state.reviewer_decision),
        NodeId::HumanGate => Some(state.human_decision),
        NodeId::Writer | NodeId::Publisher => None,
    }
}

/// The node that follows `node`, given the current state
pub fn transition(node: NodeId, state: &BlogState) -> Result<Next> {
    let next = match (node, gate_decision(node, state)) {
        (NodeId::Writer, _) => Next::Node(NodeId::Reviewer),
        (NodeId::Reviewer, Some(Some(Decision::Approved))) => Next::Node(NodeId::HumanGate),
        (NodeId::HumanGate, Some(Some(Decision::Approved))) => Next::Node(NodeId::Publisher),
        (NodeId::Reviewer | NodeId::HumanGate, Some(Some(Decision::Rejected))) => {
            Next::Node(NodeId::Writer)
        }
        (NodeId::Reviewer | NodeId::HumanGate, _) => {
            return Err(WorkflowError::MissingDecision {
                gate: node.to_string(),
            }
            .into())
        }
        (NodeId::Publisher, _) => Next::End,
    };
    Ok(next)
}
