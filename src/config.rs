use std::env;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: Option<String>,
    pub storage_public_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub aws_endpoint_url: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: String,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let supabase_url = normalize_base_url(
            &env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
        )
        .context("SUPABASE_URL must be a valid URL")?;
        let supabase_anon_key =
            env::var("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY must be set")?;
        let supabase_service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY").ok();
        let storage_public_url = match env::var("STORAGE_PUBLIC_URL") {
            Ok(raw) => normalize_base_url(&raw).context("STORAGE_PUBLIC_URL must be a valid URL")?,
            Err(_) => supabase_url.clone(),
        };
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();
        let aws_endpoint_url = env::var("AWS_ENDPOINT_URL")
            .unwrap_or_else(|_| format!("{supabase_url}/storage/v1/s3"));
        let aws_access_key_id = env::var("AWS_ACCESS_KEY_ID").ok();
        let aws_secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok();
        let aws_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            supabase_service_role_key,
            storage_public_url,
            server_host,
            server_port,
            cors_allowed_origin,
            aws_endpoint_url,
            aws_access_key_id,
            aws_secret_access_key,
            aws_region,
            http_timeout_secs,
        })
    }

    pub fn redacted_anon_key(&self) -> String {
        redact_secret(&self.supabase_anon_key)
    }
}

/// Parses a base URL and strips the trailing slash so paths can be appended
/// with a plain `format!`.
fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn redact_secret(raw: &str) -> String {
    let visible: String = raw.chars().take(4).collect();
    if visible.len() == raw.len() {
        "*****".to_string()
    } else {
        format!("{visible}*****")
    }
}
