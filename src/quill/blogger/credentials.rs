// SPDX-License-Identifier: MIT

//! OAuth credentials for the Blogger API
//!
//! A credential is loaded from a JSON cache file; when none is cached, or the
//! cached one has expired, the installed-app consent flow runs interactively
//! and its result is written back to the cache. Tokens are never refreshed.

use crate::adk::error::{QuillError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use url::Url;

/// OAuth scope granting read/write access to Blogger
pub const BLOGGER_SCOPE: &str = "https://www.googleapis.com/auth/blogger";

/// Expiry margin so a token is not used seconds before it lapses
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Something that can hand out a bearer token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A cached OAuth credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredCredential {
    /// Usable at `now`: non-empty and not within the expiry margin
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now,
            None => true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// JSON file holding the cached credential
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached credential; a missing or unreadable cache is `None`
    pub async fn load(&self) -> Result<Option<StoredCredential>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&data) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable credential cache {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    pub async fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(credential)?;
        tokio::fs::write(&self.path, data).await?;
        log::info!("Stored credentials in {}", self.path.display());
        Ok(())
    }
}

/// Client secret as downloaded from the Google Cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parse a `client_secret.json` document (installed or web app)
    pub fn parse(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| QuillError::auth("client secret has neither 'installed' nor 'web' section"))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            QuillError::auth(format!(
                "cannot read client secret {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&data)
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Installed-app OAuth consent flow backed by a credential cache
pub struct OAuthFlow {
    client: Client,
    client_secret_path: PathBuf,
    store: CredentialStore,
    interactive: bool,
}

impl OAuthFlow {
    pub fn new(client_secret_path: impl Into<PathBuf>, store: CredentialStore) -> Self {
        Self {
            client: Client::new(),
            client_secret_path: client_secret_path.into(),
            store,
            interactive: true,
        }
    }

    /// Never prompt; fail with an auth error when no valid credential is cached
    pub fn cached_only(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Consent URL the user opens in a browser
    pub fn authorization_url(secret: &ClientSecret) -> Result<Url> {
        let url = Url::parse_with_params(
            &secret.auth_uri,
            &[
                ("client_id", secret.client_id.as_str()),
                ("redirect_uri", secret.redirect_uri()),
                ("response_type", "code"),
                ("scope", BLOGGER_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )?;
        Ok(url)
    }

    /// Accept either a bare code or the full URL the browser was redirected to
    pub fn extract_code(input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        match Url::parse(input) {
            Ok(url) => url
                .query_pairs()
                .find(|(k, _)| k == "code")
                .map(|(_, v)| v.into_owned()),
            Err(_) => Some(input.to_string()),
        }
    }

    /// Cached credential if still valid, otherwise run the consent flow
    pub async fn authorize(&self) -> Result<StoredCredential> {
        if let Some(credential) = self.store.load().await? {
            if credential.is_valid() {
                log::debug!("Using cached credentials from {}", self.store.path().display());
                return Ok(credential);
            }
            log::info!("Cached credentials have expired; re-running consent flow");
        }

        if !self.interactive {
            return Err(QuillError::auth(format!(
                "no valid Blogger credential cached at {}; authorise once with `quill-rs run`",
                self.store.path().display()
            )));
        }

        let credential = self.run_flow().await?;
        self.store.save(&credential).await?;
        Ok(credential)
    }

    async fn run_flow(&self) -> Result<StoredCredential> {
        let secret = ClientSecret::load(&self.client_secret_path).await?;
        let url = Self::authorization_url(&secret)?;

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(
                format!(
                    "Open this URL in your browser and grant access:\n\n    {}\n\n\
                     Paste the authorization code (or the URL you were redirected to): ",
                    url
                )
                .as_bytes(),
            )
            .await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        let code = Self::extract_code(&line)
            .ok_or_else(|| QuillError::auth("no authorization code supplied"))?;

        self.exchange_code(&secret, &code).await
    }

    async fn exchange_code(&self, secret: &ClientSecret, code: &str) -> Result<StoredCredential> {
        let resp = self
            .client
            .post(&secret.token_uri)
            .form(&[
                ("code", code),
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("redirect_uri", secret.redirect_uri()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(QuillError::api("Google OAuth", format!("{}: {}", status, text)));
        }

        let token: TokenResponse = resp.json().await?;
        Ok(StoredCredential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_type: token.token_type.unwrap_or_else(default_token_type),
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[async_trait]
impl TokenSource for OAuthFlow {
    async fn access_token(&self) -> Result<String> {
        Ok(self.authorize().await?.access_token)
    }
}

/// A fixed token, e.g. one minted outside this program
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
