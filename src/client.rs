use std::sync::Arc;

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::models::StatementResponse;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

pub const HEADER_USER: &str = "X-Presto-User";
pub const HEADER_SOURCE: &str = "X-Presto-Source";
pub const HEADER_CATALOG: &str = "X-Presto-Catalog";
pub const HEADER_SCHEMA: &str = "X-Presto-Schema";
pub const HEADER_SESSION: &str = "X-Presto-Session";

/// Low-level client for the engine's statement endpoints.
///
/// Each method is one HTTP round trip. Polling and state tracking live in
/// [`crate::poller::QueryPoller`].
#[derive(Debug)]
pub struct StatementClient<T> {
    config: Arc<ConnectionConfig>,
    transport: Arc<T>,
}

impl<T> Clone for StatementClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> StatementClient<T> {
    pub fn new(config: Arc<ConnectionConfig>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// POST /v1/statement
    /// Submit SQL text. The response carries the first `nextUri`.
    pub async fn submit_statement(&self, sql: &str) -> Result<StatementResponse> {
        let mut request = HttpRequest::new(Method::Post, self.config.statement_url())
            .header(HEADER_USER, &self.config.username)
            .header(HEADER_SOURCE, &self.config.source)
            .header(HEADER_CATALOG, &self.config.catalog)
            .header(HEADER_SCHEMA, &self.config.schema)
            .body(sql);

        if !self.config.session_props.is_empty() {
            let session = self
                .config
                .session_props
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            request = request.header(HEADER_SESSION, session);
        }

        debug!(url = %request.url, "submitting statement");
        let resp = self.transport.fetch(request).await?;
        self.handle_response(resp)
    }

    /// GET {nextUri}
    /// Poll for the statement's status plus the next batch of rows, if any.
    pub async fn get_next(&self, next_uri: &str) -> Result<StatementResponse> {
        let request =
            HttpRequest::new(Method::Get, next_uri).header(HEADER_USER, &self.config.username);

        debug!(url = %next_uri, "polling statement");
        let resp = self.transport.fetch(request).await?;
        self.handle_response(resp)
    }

    /// DELETE {nextUri}
    /// Ask the engine to abandon a running statement.
    pub async fn cancel_statement(&self, next_uri: &str) -> Result<()> {
        let request = HttpRequest::new(Method::Delete, next_uri)
            .header(HEADER_USER, &self.config.username);

        debug!(url = %next_uri, "cancelling statement");
        let resp = self.transport.fetch(request).await?;

        if !resp.is_success() {
            return Err(Error::operational(format!(
                "HTTP {}: {}",
                resp.status, resp.body
            )));
        }

        // Cancel response is empty. Success means the request was accepted.
        Ok(())
    }

    fn handle_response(&self, resp: HttpResponse) -> Result<StatementResponse> {
        if !resp.is_success() {
            return Err(Error::operational(format!(
                "HTTP {}: {}",
                resp.status, resp.body
            )));
        }

        let statement_response = serde_json::from_str(&resp.body)?;
        Ok(statement_response)
    }
}
