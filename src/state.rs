use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::{
    auth::{gotrue::GoTrueAuth, AuthProvider},
    config::AppConfig,
    s3::build_client,
    session::{Backend, ScreenContext},
    storage::{ObjectStorage, S3Storage},
    tables::{RestTables, TableStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthProvider>,
    pub backend: Backend,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth: Arc<dyn AuthProvider>,
        tables: Arc<dyn TableStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let backend = Backend::new(tables, storage, config.storage_public_url.clone());
        Self {
            config: Arc::new(config),
            auth,
            backend,
        }
    }

    /// Wires the hosted auth, table and storage clients from configuration.
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        let auth = Arc::new(GoTrueAuth::new(
            http.clone(),
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        ));
        let tables = Arc::new(RestTables::new(
            http,
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        ));
        let storage = Arc::new(S3Storage::new(build_client(&config).await));

        Ok(Self::new(config, auth, tables, storage))
    }

    /// Fresh, not yet activated context for one screen visit.
    pub fn screen(&self) -> ScreenContext {
        ScreenContext::new(self.backend.clone())
    }
}
