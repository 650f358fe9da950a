use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::error::BackendError;

/// Sends the request and turns any non-2xx reply into [`BackendError::Status`]
/// carrying the provider's own message.
pub async fn send(endpoint: &str, request: RequestBuilder) -> Result<Response, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|source| BackendError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message: error_message(&body),
    })
}

pub async fn read_json<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<T, BackendError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| BackendError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Extracts a human-readable message from an error body. Table and auth
/// endpoints disagree on the key, so the usual candidates are tried in turn.
pub fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}
