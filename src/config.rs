use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CATALOG: &str = "hive";
pub const DEFAULT_SCHEMA: &str = "default";
pub const DEFAULT_SOURCE: &str = "presto-sql-client";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connection parameters. Passed through to the engine as request headers
/// and never mutated once a [`crate::Connection`] owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// "http" or "https"
    pub protocol: String,
    pub username: String,
    pub source: String,
    pub catalog: String,
    pub schema: String,
    pub session_props: BTreeMap<String, String>,
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            protocol: "http".to_string(),
            username: default_username(),
            source: DEFAULT_SOURCE.to_string(),
            catalog: DEFAULT_CATALOG.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            session_props: BTreeMap::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Reads `PRESTO_HOST` (required) and the optional `PRESTO_PORT`,
    /// `PRESTO_USER`, `PRESTO_SOURCE`, `PRESTO_CATALOG`, `PRESTO_SCHEMA`.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("PRESTO_HOST")
            .map_err(|_| Error::programming("PRESTO_HOST is not set"))?;
        let mut config = Self::new(host);

        if let Ok(port) = std::env::var("PRESTO_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::programming(format!("invalid PRESTO_PORT: {port}")))?;
        }
        if let Ok(user) = std::env::var("PRESTO_USER") {
            config.username = user;
        }
        if let Ok(source) = std::env::var("PRESTO_SOURCE") {
            config.source = source;
        }
        if let Ok(catalog) = std::env::var("PRESTO_CATALOG") {
            config.catalog = catalog;
        }
        if let Ok(schema) = std::env::var("PRESTO_SCHEMA") {
            config.schema = schema;
        }
        Ok(config)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn session_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session_props.insert(key.into(), value.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Base URL without a trailing slash, e.g. `http://prestodb:8080`.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.protocol,
            self.host.trim_end_matches('/'),
            self.port
        )
    }

    pub fn statement_url(&self) -> String {
        format!("{}/v1/statement", self.base_url())
    }
}

fn default_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "presto".to_string())
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
