// SPDX-License-Identifier: MIT

//! The blog workflow
//!
//! This module provides:
//! - `BlogState` - the record threaded through every node
//! - `transition` - the (node, decision) -> next node table
//! - the four nodes: writer, reviewer, human gate, publisher
//! - `Checkpointer` - storage for runs paused at the human gate
//! - `BlogWorkflow` - the engine tying them together

pub mod checkpoint;
pub mod engine;
pub mod graph;
pub mod nodes;
pub mod state;

pub use checkpoint::{Checkpoint, Checkpointer, FileCheckpointer, MemoryCheckpointer};
pub use engine::{BlogWorkflow, RunOutcome, WorkflowSettings};
pub use graph::{transition, Next, NodeId};
pub use state::{BlogState, Decision, HumanInput, ReviewVerdict};
