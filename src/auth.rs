//! # OAuth Access Tokens
//!
//! The Sheets client authenticates with the token file written by the standard
//! OAuth installed-app flow (the "authorized user" JSON). Access tokens expire after
//! about an hour. [`TokenSource`] refreshes them with the stored refresh token and
//! writes the new token back to the file, so the next start does not need a
//! refresh either.
//!
//! A bare access token on one line is accepted too. It cannot be refreshed.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sync_framework::FrameworkError;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::DeskError;
use crate::sheets::{check_status, remote};

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A token this close to its expiry is refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Contents of the authorized-user token file.
///
/// Fields this client does not use (`scopes`, `account`, ...) are kept in `extra`
/// and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthorizedUser {
    /// A fixed access token with nothing to refresh it with.
    pub fn from_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            refresh_token: None,
            client_id: None,
            client_secret: None,
            token_uri: default_token_uri(),
            expiry: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Parses a token file: authorized-user JSON or a bare token.
    pub fn parse(text: &str) -> Result<Self, String> {
        if !text.trim_start().starts_with('{') {
            let token = text.trim();
            if token.is_empty() {
                return Err("empty token file".to_string());
            }
            return Ok(Self::from_token(token));
        }

        let mut user: AuthorizedUser = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if user.token.is_none() {
            // Some tools write the raw OAuth response instead
            user.token = user
                .extra
                .remove("access_token")
                .and_then(|v| v.as_str().map(str::to_string));
        }
        if user.token.is_none() && !user.can_refresh() {
            return Err("no access token and no refresh credentials".to_string());
        }
        Ok(user)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }

    /// The access token, unless it is missing or about to expire.
    pub fn fresh_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref()?;
        match self.expiry {
            Some(expiry) if expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now => None,
            _ => Some(token),
        }
    }
}

/// Answer of the token endpoint to a refresh grant.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Hands out a valid access token, refreshing it when needed.
pub struct TokenSource {
    user: RwLock<AuthorizedUser>,
    path: Option<PathBuf>,
}

impl TokenSource {
    /// Credentials kept in memory only.
    pub fn new(user: AuthorizedUser) -> Self {
        Self {
            user: RwLock::new(user),
            path: None,
        }
    }

    pub fn from_token(token: &str) -> Self {
        Self::new(AuthorizedUser::from_token(token))
    }

    /// Reads the token file. Refreshed tokens are written back to it.
    pub fn load(path: &Path) -> Result<Self, DeskError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DeskError::ConfigInvalid(format!("Cannot read token file {}: {}", path.display(), e))
        })?;
        let user = AuthorizedUser::parse(&text).map_err(|e| {
            DeskError::ConfigInvalid(format!("Unusable token file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), refreshable = user.can_refresh(), "Token file loaded");
        Ok(Self {
            user: RwLock::new(user),
            path: Some(path.to_path_buf()),
        })
    }

    /// A token that has not expired yet.
    pub async fn bearer(&self, http: &Client) -> Result<String, FrameworkError> {
        {
            let user = self.user.read().await;
            if let Some(token) = user.fresh_token(Utc::now()) {
                return Ok(token.to_string());
            }
        }
        self.refresh(http, None).await
    }

    /// Gets a new access token from the token endpoint.
    ///
    /// `rejected` is the token the server just turned down. If another caller
    /// already replaced it, the newer token is returned without a second refresh.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        http: &Client,
        rejected: Option<&str>,
    ) -> Result<String, FrameworkError> {
        let mut user = self.user.write().await;
        if let Some(current) = user.fresh_token(Utc::now()) {
            if Some(current) != rejected {
                return Ok(current.to_string());
            }
        }

        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            user.refresh_token.clone(),
            user.client_id.clone(),
            user.client_secret.clone(),
        ) else {
            return Err(FrameworkError::Remote(
                "Access token expired or rejected and the token file has no refresh credentials"
                    .to_string(),
            ));
        };

        info!(token_uri = %user.token_uri, "Refreshing access token");
        let response = http
            .post(user.token_uri.as_str())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(remote)?;
        let grant: TokenGrant = check_status(response)
            .await?
            .json()
            .await
            .map_err(remote)?;

        user.token = Some(grant.access_token.clone());
        user.expiry = grant
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        if grant.refresh_token.is_some() {
            user.refresh_token = grant.refresh_token;
        }

        if let Some(path) = &self.path {
            if let Err(e) = save(&user, path).await {
                warn!(path = %path.display(), error = %e, "Refreshed token not saved");
            }
        }
        Ok(grant.access_token)
    }
}

async fn save(user: &AuthorizedUser, path: &Path) -> Result<(), DeskError> {
    let json =
        serde_json::to_string_pretty(user).map_err(|e| DeskError::ConfigInvalid(e.to_string()))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| DeskError::ConfigInvalid(format!("Cannot write {}: {}", path.display(), e)))
}
