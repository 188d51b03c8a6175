//! Warehouse transport
//!
//! The external warehouse is reached through a pair of narrow traits so the
//! rest of the pipeline never touches HTTP directly and tests can script
//! sessions freely. The production implementation speaks a Databricks-style
//! SQL statement REST API and returns loosely-typed JSON rows; the fetch
//! adapters are responsible for turning those into `OrderRecord`s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One raw result row: column name to JSON value
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarehouseError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("statement failed: {0}")]
    Statement(String),
}

/// A warehouse endpoint that can open sessions
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, WarehouseError>;
}

/// An established session that can execute SQL statements
///
/// An empty result set is a valid, non-error outcome.
#[async_trait]
pub trait WarehouseSession: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, WarehouseError>;
}

// ── HTTP implementation ─────────────────────────────────────────────

#[derive(Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    session_id: &'a str,
    statement: &'a str,
}

#[derive(Deserialize)]
struct StatementResponse {
    #[serde(default)]
    rows: Vec<Row>,
}

/// Warehouse client over the SQL statement REST API
pub struct HttpWarehouse {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpWarehouse {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Warehouse for HttpWarehouse {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, WarehouseError> {
        let url = format!("{}/api/2.0/sql/sessions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| WarehouseError::Connect(e.to_string()))?
            .error_for_status()
            .map_err(|e| WarehouseError::Connect(e.to_string()))?;

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| WarehouseError::Connect(e.to_string()))?;

        Ok(Box::new(HttpSession {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            client: self.client.clone(),
            session_id: body.session_id,
        }))
    }
}

struct HttpSession {
    base_url: String,
    token: String,
    client: reqwest::Client,
    session_id: String,
}

#[async_trait]
impl WarehouseSession for HttpSession {
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, WarehouseError> {
        let url = format!("{}/api/2.0/sql/statements", self.base_url);
        let request = StatementRequest {
            session_id: &self.session_id,
            statement,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| WarehouseError::Statement(e.to_string()))?
            .error_for_status()
            .map_err(|e| WarehouseError::Statement(e.to_string()))?;

        let body: StatementResponse = response
            .json()
            .await
            .map_err(|e| WarehouseError::Statement(e.to_string()))?;

        Ok(body.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let wh = HttpWarehouse::new("http://warehouse.local/", "tok");
        assert_eq!(wh.base_url, "http://warehouse.local");
    }

    #[test]
    fn test_statement_response_defaults_to_empty_rows() {
        let body: StatementResponse = serde_json::from_str("{}").unwrap();
        assert!(body.rows.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = WarehouseError::Connect("timed out".to_string());
        assert_eq!(err.to_string(), "connect failed: timed out");
    }
}
