// SPDX-License-Identifier: MIT

//! quill-rs: write, review, approve and publish blog posts
//!
//! - [`adk`] - model clients, agents and the crate error type
//! - [`quill`] - the blogging workflow, formatter, Blogger client and
//!   invocation surfaces

pub mod adk;
pub mod quill;
