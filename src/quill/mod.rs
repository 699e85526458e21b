// SPDX-License-Identifier: MIT

pub mod blogger;
pub mod builder;
pub mod config;
pub mod format;
pub mod server;
pub mod workflow;
