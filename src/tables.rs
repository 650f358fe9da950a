use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;
use crate::utils::http::{read_json, send};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Equality predicate `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn id(id: i64) -> Self {
        Self::eq("id", id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: SortDirection,
}

/// Parent row pulled in alongside each selected row, keyed by `table` in the
/// result and resolved through `foreign_key` on the child.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: String,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub embed: Option<Embed>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Select {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            embed: None,
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// At most `limit` rows, skipping the first `offset`. The backend may cap
    /// a page below `limit`.
    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn embed(mut self, table: &str, foreign_key: &str, columns: &[&str]) -> Self {
        self.embed = Some(Embed {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        });
        self
    }
}

/// Row-level access to the hosted tables. Every call carries the caller's
/// access token so the backend applies that user's row policies.
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
    async fn select(&self, token: &str, query: &Select) -> Result<Vec<Value>, BackendError>;

    async fn insert(
        &self,
        token: &str,
        table: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>, BackendError>;

    async fn update(
        &self,
        token: &str,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<(), BackendError>;

    async fn delete(&self, token: &str, table: &str, filter: &Filter) -> Result<(), BackendError>;
}

pub async fn fetch<R: DeserializeOwned>(
    tables: &dyn TableStore,
    token: &str,
    query: &Select,
) -> Result<Vec<R>, BackendError> {
    tables
        .select(token, query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

/// Renders a filter operand the way it appears after `eq.` in a query string.
pub fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

pub fn select_params(query: &Select) -> Vec<(String, String)> {
    let mut columns = "*".to_string();
    if let Some(embed) = &query.embed {
        columns.push_str(&format!(
            ",{}!{}({})",
            embed.table,
            embed.foreign_key,
            embed.columns.join(",")
        ));
    }

    let mut params = vec![("select".to_string(), columns)];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        params.push((
            "order".to_string(),
            format!("{}.{}", order.column, order.direction.as_str()),
        ));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| {
            (
                filter.column.clone(),
                format!("eq.{}", filter_value(&filter.value)),
            )
        })
        .collect()
}

/// PostgREST client for the hosted tables.
pub struct RestTables {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestTables {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, endpoint: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }
}

#[async_trait]
impl TableStore for RestTables {
    async fn select(&self, token: &str, query: &Select) -> Result<Vec<Value>, BackendError> {
        let endpoint = self.endpoint(&query.table);
        let request = self
            .request(Method::GET, &endpoint, token)
            .query(&select_params(query));
        let response = send(&endpoint, request).await?;
        read_json(&endpoint, response).await
    }

    async fn insert(
        &self,
        token: &str,
        table: &str,
        rows: Vec<Value>,
    ) -> Result<Vec<Value>, BackendError> {
        let endpoint = self.endpoint(table);
        let request = self
            .request(Method::POST, &endpoint, token)
            .header("Prefer", "return=representation")
            .json(&rows);
        let response = send(&endpoint, request).await?;
        read_json(&endpoint, response).await
    }

    async fn update(
        &self,
        token: &str,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<(), BackendError> {
        let endpoint = self.endpoint(table);
        let request = self
            .request(Method::PATCH, &endpoint, token)
            .query(&filter_params(std::slice::from_ref(filter)))
            .json(&patch);
        send(&endpoint, request).await?;
        Ok(())
    }

    async fn delete(&self, token: &str, table: &str, filter: &Filter) -> Result<(), BackendError> {
        let endpoint = self.endpoint(table);
        let request = self
            .request(Method::DELETE, &endpoint, token)
            .query(&filter_params(std::slice::from_ref(filter)));
        send(&endpoint, request).await?;
        Ok(())
    }
}
