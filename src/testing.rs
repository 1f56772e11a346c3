//! In-memory transport that replays scripted engine responses.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{EngineError, Error, Result};
use crate::models::{Column, StatementResponse, StatementStats};
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub const BASE: &str = "http://prestodb:8080/v1/statement/test_query";

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, page: Page) {
        let body = serde_json::to_string(&page.0).unwrap();
        self.push_status(200, &body);
    }

    pub fn push_status(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_transport_error(&self, msg: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Operational(msg.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Scripts a whole query: submit, a queued page, a running page that
    /// announces columns, `rows` split into pages of `batch`, then the final page.
    pub fn script_query(&self, columns: &[(&str, &str)], rows: Vec<Vec<Value>>, batch: usize) {
        let mut seq = 1;
        let mut uri = || {
            let u = format!("{BASE}/{seq}");
            seq += 1;
            u
        };

        self.push_ok(page("QUEUED").next(uri()));
        self.push_ok(page("QUEUED").next(uri()));
        self.push_ok(page("RUNNING").columns(columns).next(uri()));
        for chunk in rows.chunks(batch.max(1)) {
            self.push_ok(
                page("RUNNING")
                    .columns(columns)
                    .data(chunk.to_vec())
                    .next(uri()),
            );
        }
        self.push_ok(page("FINISHED").columns(columns));
    }

    /// Scripts a statement the engine rejects after accepting the submit.
    pub fn script_failure(&self, message: &str) {
        self.push_ok(page("QUEUED").next(format!("{BASE}/1")));
        self.push_ok(page("FAILED").error(message));
    }
}

impl Transport for ScriptedTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request: {} {}", request.method, request.url))
    }
}

/// Builder for one engine status page.
pub struct Page(pub StatementResponse);

pub fn page(state: &str) -> Page {
    Page(StatementResponse {
        id: Some("test_query".to_string()),
        stats: Some(StatementStats {
            state: state.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    })
}

impl Page {
    pub fn next(mut self, uri: impl Into<String>) -> Self {
        self.0.next_uri = Some(uri.into());
        self
    }

    pub fn columns(mut self, columns: &[(&str, &str)]) -> Self {
        self.0.columns = Some(
            columns
                .iter()
                .map(|(name, ty)| Column {
                    name: name.to_string(),
                    type_name: ty.to_string(),
                    extra: Default::default(),
                })
                .collect(),
        );
        self
    }

    pub fn data(mut self, rows: Vec<Vec<Value>>) -> Self {
        self.0.data = Some(rows);
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        self.0.error = Some(EngineError {
            message: message.to_string(),
            error_code: Some(1),
            error_name: Some("SYNTAX_ERROR".to_string()),
            error_type: Some("USER_ERROR".to_string()),
            failure_info: None,
        });
        self
    }
}
