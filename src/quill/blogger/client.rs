// SPDX-License-Identifier: MIT

//! Blogger v3 `posts.insert`

use super::{PostPayload, PublishedPost, Publisher, TokenSource};
use crate::adk::error::{ModelError, QuillError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

/// Default Blogger v3 API root
pub const BLOGGER_API_BASE: &str = "https://www.googleapis.com/blogger/v3";

/// Publishes posts to one blog
pub struct BloggerClient {
    client: Client,
    api_base: String,
    blog_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl BloggerClient {
    pub fn new(
        api_base: impl Into<String>,
        blog_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            blog_id: blog_id.into(),
            tokens,
        }
    }

    fn posts_url(&self) -> String {
        format!("{}/blogs/{}/posts", self.api_base, self.blog_id)
    }

    fn request_body(post: &PostPayload) -> serde_json::Value {
        let mut body = serde_json::to_value(post).unwrap_or_else(|_| json!({}));
        body["kind"] = json!("blogger#post");
        body
    }

    /// Pull author, status and URL out of a posts.insert response
    fn parse_post(resp: &serde_json::Value) -> Result<PublishedPost> {
        let field = |value: Option<&str>, name: &str| {
            value.map(str::to_string).ok_or_else(|| {
                QuillError::from(ModelError::InvalidResponse(format!(
                    "Blogger response missing '{}'",
                    name
                )))
            })
        };

        Ok(PublishedPost {
            author: field(resp["author"]["displayName"].as_str(), "author.displayName")?,
            status: field(resp["status"].as_str(), "status")?,
            url: field(resp["url"].as_str(), "url")?,
        })
    }
}

#[async_trait]
impl Publisher for BloggerClient {
    async fn insert_post(&self, post: &PostPayload) -> Result<PublishedPost> {
        let token = self.tokens.access_token().await?;
        let url = self.posts_url();

        log::info!("Publishing '{}' to blog {}", post.title, self.blog_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&Self::request_body(post))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            log::error!("Blogger rejected post: {} {}", status, text);
            return Err(QuillError::api("Blogger", format!("{}: {}", status, text)));
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Blogger response: {}", resp_json);

        Self::parse_post(&resp_json)
    }
}
