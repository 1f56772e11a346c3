use std::collections::VecDeque;

use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::client::StatementClient;
use crate::coercion::{coerce_row, coercions_for, Coercion};
use crate::error::{Error, Result};
use crate::models::{Column, Row, StatementResponse};
use crate::transport::Transport;

/// Local view of a submitted statement's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PollerState {
    Created,  // Nothing submitted yet
    Queued,   // Accepted, waiting for resources or planning
    Running,  // Executing, or draining result pages
    Finished, // Engine has nothing more to send
    Failed,   // Engine error, HTTP failure or malformed response
    Closed,   // Consumer stopped before a terminal state
}

impl PollerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollerState::Finished | PollerState::Failed | PollerState::Closed
        )
    }

    /// State reached when the engine reports `engine_state` and still hands
    /// out a `nextUri`. Never moves back from `Running` to `Queued`.
    fn advance(self, engine_state: Option<&str>) -> PollerState {
        match engine_state {
            Some("QUEUED" | "WAITING_FOR_RESOURCES" | "DISPATCHING" | "PLANNING" | "STARTING")
                if self != PollerState::Running =>
            {
                PollerState::Queued
            }
            None if self == PollerState::Created => PollerState::Queued,
            None => self,
            _ => PollerState::Running,
        }
    }
}

/// Drives one statement: one submit, then one `nextUri` poll at a time.
///
/// Rows returned by the engine are coerced and parked in `pending_rows`
/// until the owner drains them with [`QueryPoller::take_rows`].
#[derive(Debug)]
pub struct QueryPoller<T> {
    client: StatementClient<T>,
    state: PollerState,
    query_id: Option<String>,
    next_uri: Option<String>,
    columns: Option<Vec<Column>>,
    coercions: Vec<Coercion>,
    pending_rows: VecDeque<Row>,
    last_status: Option<StatementResponse>,
    failure: Option<Error>,
}

impl<T: Transport> QueryPoller<T> {
    pub fn new(client: StatementClient<T>) -> Self {
        Self {
            client,
            state: PollerState::Created,
            query_id: None,
            next_uri: None,
            columns: None,
            coercions: Vec::new(),
            pending_rows: VecDeque::new(),
            last_status: None,
            failure: None,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    pub fn next_uri(&self) -> Option<&str> {
        self.next_uri.as_deref()
    }

    pub fn columns(&self) -> Option<&[Column]> {
        self.columns.as_deref()
    }

    /// Most recent status page, with its `data` already moved to the row queue.
    pub fn last_status(&self) -> Option<&StatementResponse> {
        self.last_status.as_ref()
    }

    /// The error that moved this poller to `Failed`.
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    pub fn take_rows(&mut self) -> VecDeque<Row> {
        std::mem::take(&mut self.pending_rows)
    }

    /// POST the statement. Only valid once, on a freshly created poller.
    pub async fn submit(&mut self, sql: &str) -> Result<()> {
        if self.state != PollerState::Created {
            return Err(Error::programming("statement already submitted"));
        }

        let resp = match self.client.submit_statement(sql).await {
            Ok(resp) => resp,
            Err(e) => return Err(self.fail(e)),
        };

        if resp.error.is_none() && resp.next_uri.is_none() {
            return Err(self.fail(Error::operational(
                "submit response did not include a nextUri",
            )));
        }

        self.process(resp).map(|_| ())
    }

    /// GET the current `nextUri` and fold the page into local state.
    ///
    /// Returns the status page with its rows removed. Polling before submit
    /// or after a terminal state is a programming error and issues no request.
    pub async fn poll(&mut self) -> Result<StatementResponse> {
        let Some(uri) = self.next_uri.clone() else {
            return Err(Error::programming(match self.state {
                PollerState::Created => "no query has been submitted",
                _ => "query is no longer running",
            }));
        };

        match self.client.get_next(&uri).await {
            Ok(resp) => self.process(resp),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Stop polling locally. The engine is not told.
    pub fn close(&mut self) {
        if !self.state.is_terminal() {
            debug!(query_id = ?self.query_id, "closing poller");
            self.state = PollerState::Closed;
        }
        self.next_uri = None;
        self.pending_rows.clear();
    }

    /// Ask the engine to drop the statement, then close.
    pub async fn cancel(&mut self) -> Result<()> {
        let uri = self.next_uri.take();
        self.close();
        match uri {
            Some(uri) => self.client.cancel_statement(&uri).await,
            None => Ok(()),
        }
    }

    fn process(&mut self, mut resp: StatementResponse) -> Result<StatementResponse> {
        if self.query_id.is_none() {
            self.query_id = resp.id.clone();
        }
        if self.columns.is_none() {
            if let Some(columns) = &resp.columns {
                self.coercions = coercions_for(columns);
                self.columns = Some(columns.clone());
            }
        }

        if let Some(rows) = resp.data.take() {
            if self.columns.is_none() {
                return Err(self.fail(Error::operational(
                    "engine returned data before column metadata",
                )));
            }
            let coercions = &self.coercions;
            self.pending_rows
                .extend(rows.into_iter().map(|row| coerce_row(coercions, row)));
        }

        if let Some(engine_error) = resp.error.clone() {
            warn!(
                query_id = ?self.query_id,
                error_name = ?engine_error.error_name,
                "query failed: {}",
                engine_error.message
            );
            self.last_status = Some(resp);
            return Err(self.fail(Error::from(engine_error)));
        }

        let previous = self.state;
        self.next_uri = resp.next_uri.clone();
        self.state = match self.next_uri {
            Some(_) => previous.advance(resp.state()),
            None => PollerState::Finished,
        };
        if previous != self.state {
            debug!(query_id = ?self.query_id, from = %previous, to = %self.state, "query state changed");
        }

        self.last_status = Some(resp.clone());
        Ok(resp)
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = PollerState::Failed;
        self.next_uri = None;
        self.failure = Some(err.clone());
        err
    }
}
