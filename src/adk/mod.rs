// SPDX-License-Identifier: MIT

//! Agent development kit: models, agents and the error hierarchy

pub mod agent;
pub mod error;
pub mod model;
