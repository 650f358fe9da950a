use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashboard::auth::{AuthError, AuthProvider, Identity, Session};
use dashboard::config::{AppConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use dashboard::error::BackendError;
use dashboard::routes;
use dashboard::session::ScreenContext;
use dashboard::state::AppState;
use dashboard::storage::{ObjectInfo, ObjectStorage};
use dashboard::tables::{Filter, Select, SortDirection, TableStore};
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PUBLIC_BASE: &str = "https://project.test";

#[derive(Default)]
pub struct FakeAuth {
    users: Mutex<HashMap<String, String>>,
    tokens: Mutex<HashMap<String, String>>,
    lookup_fails: AtomicBool,
    issued: AtomicUsize,
}

impl FakeAuth {
    #[allow(dead_code)]
    pub async fn register(&self, email: &str, password: &str) {
        let mut users = self.users.lock().await;
        users.insert(email.to_string(), password.to_string());
    }

    /// Registers the user if needed and hands out a live token.
    #[allow(dead_code)]
    pub async fn issue_token(&self, email: &str) -> String {
        self.register(email, "password").await;
        self.issue_token_for_known(email).await
    }

    #[allow(dead_code)]
    pub fn fail_lookups(&self) {
        self.lookup_fails.store(true, AtomicOrdering::SeqCst);
    }

    #[allow(dead_code)]
    pub async fn token_is_live(&self, token: &str) -> bool {
        self.tokens.lock().await.contains_key(token)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        if self.lookup_fails.load(AtomicOrdering::SeqCst) {
            return Err(AuthError::Backend(BackendError::Status {
                endpoint: "auth/v1/user".into(),
                status: 503,
                message: "unavailable".into(),
            }));
        }
        let tokens = self.tokens.lock().await;
        Ok(tokens.get(access_token).map(|email| Session {
            identity: Identity {
                email: email.clone(),
            },
            access_token: access_token.to_string(),
        }))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let mut users = self.users.lock().await;
        if users.contains_key(email) {
            return Err(AuthError::AlreadyRegistered);
        }
        users.insert(email.to_string(), password.to_string());
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let known = {
            let users = self.users.lock().await;
            users.get(email).map(|stored| stored == password)
        };
        if known != Some(true) {
            return Err(AuthError::InvalidCredentials);
        }
        let token = self.issue_token_for_known(email).await;
        Ok(Session {
            identity: Identity {
                email: email.to_string(),
            },
            access_token: token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens.lock().await.remove(access_token);
        Ok(())
    }
}

impl FakeAuth {
    async fn issue_token_for_known(&self, email: &str) -> String {
        let token = format!(
            "token-{}-{}",
            self.issued.fetch_add(1, AtomicOrdering::SeqCst),
            email
        );
        self.tokens
            .lock()
            .await
            .insert(token.clone(), email.to_string());
        token
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

/// In-memory tables with ids, server timestamps, equality filters, ordering,
/// paging and parent embedding. Failures can be injected per table and
/// operation, and a server-side row cap can be set.
#[derive(Default)]
pub struct FakeTables {
    rows: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicUsize,
    failures: Mutex<HashSet<(String, Op)>>,
    writes: AtomicUsize,
    max_rows: AtomicUsize,
}

fn matches(row: &Value, filter: &Filter) -> bool {
    row.get(&filter.column) == Some(&filter.value)
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn server_timestamp(id: usize) -> Value {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Value::from((base + Duration::seconds(id as i64)).to_rfc3339())
}

impl FakeTables {
    #[allow(dead_code)]
    pub async fn fail(&self, table: &str, op: Op) {
        self.failures.lock().await.insert((table.to_string(), op));
    }

    #[allow(dead_code)]
    pub async fn heal(&self, table: &str, op: Op) {
        self.failures.lock().await.remove(&(table.to_string(), op));
    }

    /// Caps every select at `limit` rows, like a PostgREST `max-rows` setting.
    #[allow(dead_code)]
    pub fn cap_rows(&self, limit: usize) {
        self.max_rows.store(limit, AtomicOrdering::SeqCst);
    }

    /// Write attempts, failed or not.
    #[allow(dead_code)]
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    #[allow(dead_code)]
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.rows
            .lock()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Inserts a row directly, bypassing failure injection and write counts.
    #[allow(dead_code)]
    pub async fn seed(&self, table: &str, row: Value) -> i64 {
        let mut guard = self.rows.lock().await;
        let stored = self.stamp(row);
        let id = stored["id"].as_i64().unwrap_or_default();
        guard.entry(table.to_string()).or_default().push(stored);
        id
    }

    fn stamp(&self, row: Value) -> Value {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let mut object = match row {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        object.insert("id".into(), Value::from(id as i64));
        object
            .entry("created_at")
            .or_insert_with(|| server_timestamp(id));
        object
            .entry("upload_date")
            .or_insert_with(|| server_timestamp(id));
        Value::Object(object)
    }

    async fn check(&self, table: &str, op: Op) -> Result<(), BackendError> {
        if op != Op::Select {
            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        }
        if self.failures.lock().await.contains(&(table.to_string(), op)) {
            return Err(BackendError::Status {
                endpoint: format!("rest/v1/{table}"),
                status: 500,
                message: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for FakeTables {
    async fn select(&self, _token: &str, query: &Select) -> Result<Vec<Value>, BackendError> {
        self.check(&query.table, Op::Select).await?;
        let guard = self.rows.lock().await;
        let mut rows: Vec<Value> = guard
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|filter| matches(row, filter)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let mut limit = query.limit.unwrap_or(usize::MAX);
        let cap = self.max_rows.load(AtomicOrdering::SeqCst);
        if cap > 0 {
            limit = limit.min(cap);
        }
        let mut rows: Vec<Value> = rows
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(limit)
            .collect();

        if let Some(embed) = &query.embed {
            let parents = guard.get(&embed.table).cloned().unwrap_or_default();
            for row in rows.iter_mut() {
                let parent = row.get(&embed.foreign_key).and_then(|parent_id| {
                    parents
                        .iter()
                        .find(|parent| parent.get("id") == Some(parent_id))
                });
                let projected = match parent {
                    Some(parent) => {
                        let mut picked = Map::new();
                        for column in &embed.columns {
                            if let Some(value) = parent.get(column) {
                                picked.insert(column.clone(), value.clone());
                            }
                        }
                        Value::Object(picked)
                    }
                    None => Value::Null,
                };
                if let Value::Object(object) = row {
                    object.insert(embed.table.clone(), projected);
                }
            }
        }

        Ok(rows)
    }

    async fn insert(
        &self,
        _token: &str,
        table: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>, BackendError> {
        self.check(table, Op::Insert).await?;
        let mut guard = self.rows.lock().await;
        let stored: Vec<Value> = rows.into_iter().map(|row| self.stamp(row)).collect();
        guard
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(
        &self,
        _token: &str,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<(), BackendError> {
        self.check(table, Op::Update).await?;
        let mut guard = self.rows.lock().await;
        let Value::Object(patch) = patch else {
            return Ok(());
        };
        for row in guard.entry(table.to_string()).or_default().iter_mut() {
            if !matches(row, filter) {
                continue;
            }
            if let Value::Object(object) = row {
                for (key, value) in &patch {
                    object.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, _token: &str, table: &str, filter: &Filter) -> Result<(), BackendError> {
        self.check(table, Op::Delete).await?;
        let mut guard = self.rows.lock().await;
        if let Some(rows) = guard.get_mut(table) {
            rows.retain(|row| !matches(row, filter));
        }
        Ok(())
    }
}

#[allow(dead_code)]
#[derive(Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
    puts: AtomicUsize,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        self.puts.fetch_add(1, AtomicOrdering::SeqCst);
        ensure!(
            !self.fail_put.load(AtomicOrdering::SeqCst),
            "injected put failure"
        );
        let mut guard = self.objects.lock().await;
        guard.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        if self.fail_delete.load(AtomicOrdering::SeqCst) {
            return Err(anyhow!("injected delete failure for {key}"));
        }
        let mut guard = self.objects.lock().await;
        guard.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let guard = self.objects.lock().await;
        let mut objects: Vec<ObjectInfo> = guard
            .iter()
            .filter(|((b, key), _)| b == bucket && key.starts_with(prefix))
            .map(|((_, key), object)| ObjectInfo {
                key: key.clone(),
                last_modified: Some(object.last_modified),
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

impl FakeStorage {
    #[allow(dead_code)]
    pub async fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let guard = self.objects.lock().await;
        guard.get(&(bucket.to_string(), key.to_string())).cloned()
    }

    #[allow(dead_code)]
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.list_objects(bucket, "")
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|object| object.key)
            .collect()
    }

    /// Stores an object as if it had been written `age` ago.
    #[allow(dead_code)]
    pub async fn put_aged(&self, bucket: &str, key: &str, bytes: &[u8], age: Duration) {
        let mut guard = self.objects.lock().await;
        guard.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: None,
                last_modified: Utc::now() - age,
            },
        );
    }

    #[allow(dead_code)]
    pub fn fail_puts(&self, fail: bool) {
        self.fail_put.store(fail, AtomicOrdering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, AtomicOrdering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn put_count(&self) -> usize {
        self.puts.load(AtomicOrdering::SeqCst)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        supabase_url: PUBLIC_BASE.to_string(),
        supabase_anon_key: "anon-key".to_string(),
        supabase_service_role_key: Some("service-key".to_string()),
        storage_public_url: PUBLIC_BASE.to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_allowed_origin: None,
        aws_endpoint_url: format!("{PUBLIC_BASE}/storage/v1/s3"),
        aws_access_key_id: None,
        aws_secret_access_key: None,
        aws_region: "us-east-1".to_string(),
        http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub auth: Arc<FakeAuth>,
    pub tables: Arc<FakeTables>,
    pub storage: Arc<FakeStorage>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let auth = Arc::new(FakeAuth::default());
        let tables = Arc::new(FakeTables::default());
        let storage = Arc::new(FakeStorage::default());
        let state = AppState::new(test_config(), auth.clone(), tables.clone(), storage.clone());
        let router = routes::create_router(state.clone());

        Self {
            state,
            auth,
            tables,
            storage,
            router,
        }
    }

    /// A screen context already activated for `email`.
    #[allow(dead_code)]
    pub async fn screen_for(&self, email: &str) -> ScreenContext {
        let token = self.auth.issue_token(email).await;
        let mut screen = self.state.screen();
        screen
            .activate(self.state.auth.as_ref(), Some(token.as_str()))
            .await;
        screen
    }

    #[allow(dead_code)]
    pub async fn login_token(&self, email: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json("/auth/signin", &Credentials { email, password }, None)
            .await?;
        ensure!(
            response.status() == StatusCode::OK,
            "sign-in failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct SignInResponse {
            access_token: String,
        }
        let parsed: SignInResponse = serde_json::from_slice(&body)?;
        Ok(parsed.access_token)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(body.map(Body::from).unwrap_or_else(Body::empty))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.send(Method::GET, path, None, token).await
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        self.send(Method::POST, path, Some(body), token).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        self.send(Method::PATCH, path, Some(body), token).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.send(Method::DELETE, path, None, token).await
    }

    #[allow(dead_code)]
    pub async fn upload(
        &self,
        path: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
        name: Option<&str>,
        token: &str,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();
        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend(data);
        body.extend(b"\r\n");

        if let Some(name) = name {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(b"Content-Disposition: form-data; name=\"name\"\r\n\r\n");
            body.extend(name.as_bytes());
            body.extend(b"\r\n");
        }

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn body_json(response: hyper::Response<Body>) -> Result<Value> {
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}
