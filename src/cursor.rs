use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use crate::client::StatementClient;
use crate::error::{Error, Result};
use crate::models::{ColumnDescription, Row, StatementResponse};
use crate::params::{substitute, Params};
use crate::poller::{PollerState, QueryPoller};
use crate::transport::Transport;

/// Executes one statement at a time and hands out its rows.
///
/// Every driving method takes `&mut self`, so a cursor never has two
/// requests in flight. Rows are buffered only as far as a fetch call needs
/// them; `fetchall` is the one call that holds a whole result.
#[derive(Debug)]
pub struct Cursor<T> {
    client: StatementClient<T>,
    poller: Option<QueryPoller<T>>,
    description: Option<Vec<ColumnDescription>>,
    row_buffer: VecDeque<Row>,
    rownumber: usize,
    arraysize: usize,
    poll_interval: Duration,
    closed: bool,
}

impl<T: Transport> Cursor<T> {
    pub(crate) fn new(client: StatementClient<T>) -> Self {
        let poll_interval = client.config().poll_interval;
        Self {
            client,
            poller: None,
            description: None,
            row_buffer: VecDeque::new(),
            rownumber: 0,
            arraysize: 1,
            poll_interval,
            closed: false,
        }
    }

    /// Column metadata, once the engine has reported it.
    pub fn description(&self) -> Option<&[ColumnDescription]> {
        self.description.as_deref()
    }

    /// The engine does not report a row count up front.
    pub fn rowcount(&self) -> i64 {
        -1
    }

    /// Rows handed out by fetch calls since the last `execute`.
    pub fn rownumber(&self) -> usize {
        self.rownumber
    }

    pub fn arraysize(&self) -> usize {
        self.arraysize
    }

    pub fn set_arraysize(&mut self, arraysize: usize) {
        self.arraysize = arraysize;
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    pub fn query_id(&self) -> Option<&str> {
        self.poller.as_ref().and_then(|p| p.query_id())
    }

    pub fn state(&self) -> Option<PollerState> {
        self.poller.as_ref().map(|p| p.state())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn setinputsizes(&mut self, _sizes: &[usize]) {}

    pub fn setoutputsize(&mut self, _size: usize, _column: Option<usize>) {}

    /// Submit `sql` and wait until its columns are known or it has failed.
    ///
    /// Any previous statement is dropped locally without being cancelled.
    pub async fn execute(&mut self, sql: &str, params: Option<&Params>) -> Result<()> {
        self.check_open()?;
        self.reset();

        let sql = substitute(sql, params)?;
        debug!(sql = %sql, "executing");

        let mut poller = QueryPoller::new(self.client.clone());
        let submitted = poller.submit(&sql).await;
        self.poller = Some(poller);
        self.absorb();
        submitted?;

        self.advance_until(|c| c.description.is_some()).await
    }

    /// Run `sql` once per parameter set. Each run is polled to completion
    /// before the next starts; only the last one stays fetchable.
    pub async fn executemany(&mut self, sql: &str, seq_of_params: &[Params]) -> Result<()> {
        self.check_open()?;
        let Some((last, rest)) = seq_of_params.split_last() else {
            self.reset();
            return Ok(());
        };

        for params in rest {
            self.execute(sql, Some(params)).await?;
            self.drain_discarding().await?;
        }
        self.execute(sql, Some(last)).await
    }

    pub async fn fetchone(&mut self) -> Result<Option<Row>> {
        self.check_fetchable()?;
        if self.row_buffer.is_empty() {
            self.advance_until(|c| !c.row_buffer.is_empty()).await?;
        }

        let row = self.row_buffer.pop_front();
        if row.is_some() {
            self.rownumber += 1;
        }
        Ok(row)
    }

    /// Up to `size` rows, `arraysize` when `None`. Short only at the end.
    pub async fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.check_fetchable()?;
        let size = size.unwrap_or(self.arraysize);
        if size == 0 {
            return Ok(Vec::new());
        }

        self.advance_until(|c| c.row_buffer.len() >= size).await?;
        Ok(self.take_buffered(size))
    }

    pub async fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.check_fetchable()?;
        self.advance_until(|_| false).await?;
        Ok(self.take_buffered(self.row_buffer.len()))
    }

    /// One poll of the running statement.
    ///
    /// Returns the status page (rows are moved into the fetch buffer), or
    /// `None` once the statement is finished, without any request.
    pub async fn poll(&mut self) -> Result<Option<StatementResponse>> {
        self.check_fetchable()?;
        let poller = self.active_poller()?;
        if let Some(failure) = poller.failure() {
            return Err(failure.clone());
        }
        if poller.is_terminal() {
            return Ok(None);
        }

        let status = poller.poll().await;
        self.absorb();
        status.map(Some)
    }

    /// Ask the engine to drop the running statement. Buffered rows are discarded.
    pub async fn cancel(&mut self) -> Result<()> {
        self.check_open()?;
        self.row_buffer.clear();
        match self.poller.as_mut() {
            Some(poller) => poller.cancel().await,
            None => Ok(()),
        }
    }

    /// Stop using the cursor. Idempotent; the engine is not contacted.
    pub fn close(&mut self) {
        if let Some(poller) = self.poller.as_mut() {
            poller.close();
        }
        self.row_buffer.clear();
        self.closed = true;
    }

    fn reset(&mut self) {
        self.poller = None;
        self.description = None;
        self.row_buffer.clear();
        self.rownumber = 0;
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::programming("cursor is closed"));
        }
        Ok(())
    }

    fn check_fetchable(&self) -> Result<()> {
        self.check_open()?;
        if self.poller.is_none() {
            return Err(Error::programming("no query has been executed"));
        }
        Ok(())
    }

    fn active_poller(&mut self) -> Result<&mut QueryPoller<T>> {
        self.poller
            .as_mut()
            .ok_or_else(|| Error::programming("no query has been executed"))
    }

    /// Moves newly reported columns and rows from the poller into the cursor.
    fn absorb(&mut self) {
        let Some(poller) = self.poller.as_mut() else {
            return;
        };
        if self.description.is_none() {
            if let Some(columns) = poller.columns() {
                self.description = Some(columns.iter().map(ColumnDescription::from).collect());
            }
        }
        self.row_buffer.extend(poller.take_rows());
    }

    /// Polls until `done` holds or the statement is terminal, sleeping
    /// `poll_interval` after each poll that did not get there.
    ///
    /// A failed statement returns its error on every call.
    async fn advance_until(&mut self, done: impl Fn(&Self) -> bool) -> Result<()> {
        loop {
            if done(&*self) {
                return Ok(());
            }
            let poller = self.active_poller()?;
            if let Some(failure) = poller.failure() {
                return Err(failure.clone());
            }
            if poller.is_terminal() {
                return Ok(());
            }

            let polled = poller.poll().await;
            self.absorb();
            polled?;

            let terminal = self.poller.as_ref().map_or(true, |p| p.is_terminal());
            if !terminal && !done(&*self) && !self.poll_interval.is_zero() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    /// Polls the current statement to its end, dropping its rows.
    async fn drain_discarding(&mut self) -> Result<()> {
        self.row_buffer.clear();
        while self.poll().await?.is_some() {
            let progressed = !self.row_buffer.is_empty();
            self.row_buffer.clear();

            let running = self.state().is_some_and(|s| !s.is_terminal());
            if running && !progressed && !self.poll_interval.is_zero() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Ok(())
    }

    fn take_buffered(&mut self, n: usize) -> Vec<Row> {
        let n = n.min(self.row_buffer.len());
        self.rownumber += n;
        self.row_buffer.drain(..n).collect()
    }
}
