// SPDX-License-Identifier: MIT

//! Blogger publishing client
//!
//! - [`credentials`] - cached OAuth credentials and the interactive consent flow
//! - [`client`] - the `posts.insert` call

pub mod client;
pub mod credentials;

pub use client::BloggerClient;
pub use credentials::{CredentialStore, OAuthFlow, StoredCredential, TokenSource};

use crate::adk::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of a "create post" call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    /// Full HTML document
    pub content: String,
    /// Always "html"; tells the platform how to treat `content`
    pub content_type: String,
    pub custom_meta_data: String,
}

impl PostPayload {
    pub fn html(title: impl Into<String>, content: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            content_type: "html".to_string(),
            custom_meta_data: meta.into(),
        }
    }
}

/// What the platform reports about a created post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub author: String,
    pub status: String,
    pub url: String,
}

/// A destination that can publish one post
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn insert_post(&self, post: &PostPayload) -> Result<PublishedPost>;
}
