//! Async client for the Presto HTTP statement protocol, with a
//! connection → cursor → execute → fetch interface.
//!
//! ```no_run
//! use presto_sql_client::{connect, ConnectionConfig, Params};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), presto_sql_client::Error> {
//! let conn = connect(ConnectionConfig::new("prestodb").catalog("hive"));
//! let mut cursor = conn.cursor()?;
//!
//! cursor
//!     .execute("SELECT name FROM users WHERE id = %d", Some(&Params::positional([7])))
//!     .await?;
//! while let Some(row) = cursor.fetchone().await? {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Statements are submitted once and then polled through the engine's
//! `nextUri` links. Fetch calls poll only as far as they need rows.
//! Dropping a cursor stops polling; call [`Cursor::cancel`] to also tell
//! the engine.

pub mod client;
pub mod coercion;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod models;
pub mod params;
pub mod poller;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ConnectionConfig;
pub use connection::{connect, Connection};
pub use cursor::Cursor;
pub use error::{EngineError, Error, Result};
pub use models::{Column, ColumnDescription, Row, StatementResponse};
pub use params::{Param, Params};
pub use poller::{PollerState, QueryPoller};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
