// SPDX-License-Identifier: MIT

//! Agent module - defines agent types for AI workflows
//!
//! This module provides the core Agent trait and implementations:
//! - `LLMAgent` - plain text completion over a model
//! - `StructuredAgent` - completion constrained to a JSON schema and
//!   deserialized into a Rust type

mod llm;
mod structured;

pub use llm::LLMAgent;
pub use structured::StructuredAgent;

use crate::adk::error::Result;
use async_trait::async_trait;

/// Core agent trait for text-producing agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    /// Run the agent with the given input
    async fn run(&self, input: String) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Agent that prefixes every input with a label
    struct Labeller(&'static str);

    #[async_trait]
    impl Agent for Labeller {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, input: String) -> Result<String> {
            Ok(format!("[{}] {}", self.0, input))
        }
    }

    #[tokio::test]
    async fn test_agents_are_usable_as_trait_objects() {
        let agents: Vec<Arc<dyn Agent>> = vec![Arc::new(Labeller("draft")), Arc::new(Labeller("edit"))];

        let mut text = "topic".to_string();
        for agent in &agents {
            text = agent.run(text).await.unwrap();
        }
        assert_eq!(text, "[edit] [draft] topic");
        assert_eq!(agents[1].name(), "edit");
    }
}
