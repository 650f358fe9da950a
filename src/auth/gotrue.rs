use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{AuthError, AuthProvider, Identity, Session};
use crate::error::BackendError;
use crate::utils::http::{read_json, send};

/// Client for the hosted auth provider (GoTrue REST API).
pub struct GoTrueAuth {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    email: Option<String>,
    /// Present on sign-up replies. An empty list means the email already
    /// belongs to a confirmed account and nothing was created.
    identities: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    user: UserPayload,
}

impl GoTrueAuth {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, endpoint)
            .header("apikey", &self.api_key)
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        let endpoint = self.endpoint("user");
        let request = self
            .request(Method::GET, &endpoint)
            .bearer_auth(access_token);

        let response = match send(&endpoint, request).await {
            Ok(response) => response,
            Err(BackendError::Status { status, .. }) if status == 401 || status == 403 => {
                debug!(status, "access token rejected by auth provider");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let user: UserPayload = read_json(&endpoint, response).await?;
        Ok(user.email.filter(|email| !email.is_empty()).map(|email| Session {
            identity: Identity { email },
            access_token: access_token.to_string(),
        }))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let endpoint = self.endpoint("signup");
        let request = self
            .request(Method::POST, &endpoint)
            .json(&json!({ "email": email, "password": password }));

        let response = send(&endpoint, request)
            .await
            .map_err(classify_rejection)?;
        let user: UserPayload = read_json(&endpoint, response).await?;

        if matches!(user.identities.as_deref(), Some([])) {
            return Err(AuthError::AlreadyRegistered);
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let endpoint = self.endpoint("token");
        let request = self
            .request(Method::POST, &endpoint)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response = send(&endpoint, request)
            .await
            .map_err(classify_rejection)?;
        let token: TokenPayload = read_json(&endpoint, response).await?;

        Ok(Session {
            identity: Identity {
                email: token.user.email.unwrap_or_else(|| email.to_string()),
            },
            access_token: token.access_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let endpoint = self.endpoint("logout");
        let request = self
            .request(Method::POST, &endpoint)
            .bearer_auth(access_token);

        match send(&endpoint, request).await {
            Ok(_) => Ok(()),
            Err(BackendError::Status { status: 401, .. }) => {
                warn!("sign-out with an already expired session");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Maps the provider's 4xx replies onto the user-facing outcomes.
fn classify_rejection(err: BackendError) -> AuthError {
    match err {
        BackendError::Status {
            status, message, ..
        } if (400..500).contains(&status) => {
            let lowered = message.to_lowercase();
            if lowered.contains("already registered") || lowered.contains("already exists") {
                AuthError::AlreadyRegistered
            } else if lowered.contains("invalid login credentials") || lowered.contains("invalid_grant")
            {
                AuthError::InvalidCredentials
            } else {
                AuthError::Rejected(message)
            }
        }
        other => AuthError::Backend(other),
    }
}
