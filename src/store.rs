// 🗄️ Table Store - client for the hosted table API
//
// Persistence lives in the managed backend (Postgres behind a PostgREST-style
// REST surface with row-level security). This module is the thin CRUD client:
// build a query string from filters/sorts/limits, attach the project key and
// the caller's bearer token, and deserialize rows. Authorization decisions
// stay remote - the caller token is forwarded, never interpreted.
//
// Sync HTTP via ureq; handlers block briefly per call, which matches the
// request/response model in use everywhere else in this crate.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("table API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request to table API failed: {0}")]
    Transport(String),

    #[error("failed to parse table API response: {0}")]
    Parse(String),

    #[error("row not found")]
    NotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// TABLE NAMES
// ============================================================================

pub mod tables {
    pub const CATEGORIES: &str = "categories";
    pub const TRANSACTIONS: &str = "transactions";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const SAVINGS_GOALS: &str = "savings_goals";
    pub const ASSETS: &str = "assets";
}

// ============================================================================
// QUERY BUILDER
// ============================================================================

/// Filters, sort, and limit for one table read, rendered PostgREST-style:
/// `?select=*&user_id=eq.abc&date=gte.2025-03-01&order=date.desc&limit=50`
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<usize>,
}

impl TableQuery {
    pub fn new() -> Self {
        TableQuery::default()
    }

    /// Equality filter: `column=eq.value`
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Greater-or-equal filter: `column=gte.value`
    pub fn gte(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    /// Strictly-less filter: `column=lt.value`
    pub fn lt(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("lt.{}", value)));
        self
    }

    /// Ascending sort
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(format!("{}.asc", column));
        self
    }

    /// Descending sort
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{}.desc", column));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the query string (no leading `?`). Filter values are
    /// percent-encoded; a `select=*` always leads.
    pub fn to_query_string(&self) -> String {
        let mut parts = vec!["select=*".to_string()];

        for (column, value) in &self.filters {
            parts.push(format!("{}={}", column, urlencoding::encode(value)));
        }
        if let Some(order) = &self.order {
            parts.push(format!("order={}", order));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }

        parts.join("&")
    }
}

// ============================================================================
// STORE CLIENT
// ============================================================================

pub struct Store {
    base_url: String,
    anon_key: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are handled below
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent()
}

impl Store {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Store {
            base_url,
            anon_key: anon_key.into(),
            agent: make_agent(),
        }
    }

    /// REST endpoint for a table, with query string when present
    fn endpoint(&self, table: &str, query: Option<&TableQuery>) -> String {
        match query {
            Some(q) => format!("{}/rest/v1/{}?{}", self.base_url, table, q.to_query_string()),
            None => format!("{}/rest/v1/{}", self.base_url, table),
        }
    }

    /// Endpoint filtered to a single row by id
    fn row_endpoint(&self, table: &str, id: &str) -> String {
        format!(
            "{}/rest/v1/{}?id=eq.{}",
            self.base_url,
            table,
            urlencoding::encode(id)
        )
    }

    /// The bearer token sent upstream: the caller's token when present
    /// (row-level security scopes the rows), the anon key otherwise.
    fn bearer<'a>(&'a self, token: Option<&'a str>) -> &'a str {
        token.unwrap_or(&self.anon_key)
    }

    // ------------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------------

    /// Read rows matching the query
    pub fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
        token: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        let url = self.endpoint(table, Some(query));
        let response = self
            .agent
            .get(url.as_str())
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer(token)))
            .call()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::parse_rows(response)
    }

    /// Insert one row, returning the stored representation
    pub fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
        token: Option<&str>,
    ) -> StoreResult<R> {
        let url = self.endpoint(table, None);
        let response = self
            .agent
            .post(url.as_str())
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer(token)))
            .header("Prefer", "return=representation")
            .send_json(row)
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let mut rows: Vec<R> = Self::parse_rows(response)?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Patch one row by id, returning the stored representation
    pub fn update<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        patch: &T,
        token: Option<&str>,
    ) -> StoreResult<R> {
        let url = self.row_endpoint(table, id);
        let response = self
            .agent
            .patch(url.as_str())
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer(token)))
            .header("Prefer", "return=representation")
            .send_json(patch)
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let mut rows: Vec<R> = Self::parse_rows(response)?;
        // RLS filters unauthorized rows silently: an empty result means the
        // row does not exist for this caller
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.remove(0))
    }

    /// Delete one row by id
    pub fn delete(&self, table: &str, id: &str, token: Option<&str>) -> StoreResult<()> {
        let url = self.row_endpoint(table, id);
        let response = self
            .agent
            .delete(url.as_str())
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer(token)))
            .call()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(StoreError::Api { status, message });
        }
        Ok(())
    }

    fn parse_rows<T: DeserializeOwned>(
        response: ureq::http::Response<ureq::Body>,
    ) -> StoreResult<Vec<T>> {
        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(StoreError::Api { status, message });
        }

        response
            .into_body()
            .read_json()
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
