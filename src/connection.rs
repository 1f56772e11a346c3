use std::sync::Arc;

use tracing::debug;

use crate::client::StatementClient;
use crate::config::ConnectionConfig;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::transport::{ReqwestTransport, Transport};

/// Opens a connection over the default reqwest transport.
///
/// No request is made until a cursor executes a statement.
pub fn connect(config: ConnectionConfig) -> Connection<ReqwestTransport> {
    Connection::new(config)
}

/// Shared, immutable connection parameters plus the transport.
///
/// Cursors created from one connection share nothing mutable with each other.
#[derive(Debug)]
pub struct Connection<T = ReqwestTransport> {
    client: StatementClient<T>,
    transport: Arc<T>,
    closed: bool,
}

impl Connection<ReqwestTransport> {
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> Connection<T> {
    pub fn with_transport(config: ConnectionConfig, transport: T) -> Self {
        let transport = Arc::new(transport);
        debug!(url = %config.base_url(), source = %config.source, "opening connection");
        Self {
            client: StatementClient::new(Arc::new(config), Arc::clone(&transport)),
            transport,
            closed: false,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        self.client.config()
    }

    pub fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }

    pub fn cursor(&self) -> Result<Cursor<T>> {
        if self.closed {
            return Err(Error::programming("connection is closed"));
        }
        Ok(Cursor::new(self.client.clone()))
    }

    /// Statements are auto-committed by the engine.
    pub fn commit(&self) -> Result<()> {
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        Err(Error::programming("transactions are not supported"))
    }

    /// Idempotent. Open cursors keep working; new ones cannot be created.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
