use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// Status document returned by both the submit POST and every `nextUri` GET.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_uri: Option<String>,
    /// Absent once the engine has nothing more to send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
    /// A batch of result rows, cells still in wire form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatementStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
    /// Everything else the engine sent (`updateType`, `updateCount`,
    /// `warnings`, ...), untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatementResponse {
    /// Engine-reported state string, e.g. "QUEUED", "RUNNING", "FINISHED".
    pub fn state(&self) -> Option<&str> {
        self.stats.as_ref().map(|s| s.state.as_str())
    }
}

/// Column metadata as reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// e.g. `typeSignature`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Progress counters. Only `state` is interpreted. The common counters are
/// typed; any other field lands in `extra` as sent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatementStats {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_splits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_splits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_bytes: Option<u64>,
    /// `elapsedTimeMillis`, `cpuTimeMillis`, `queuedSplits`, `rootStage`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One decoded result row.
pub type Row = Vec<Value>;

/// One entry of [`crate::Cursor::description`].
///
/// Mirrors the conventional seven-field column description; the five
/// size/precision fields are never reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_code: String,
    pub display_size: Option<i64>,
    pub internal_size: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub null_ok: bool,
}

impl From<&Column> for ColumnDescription {
    fn from(c: &Column) -> Self {
        Self {
            name: c.name.clone(),
            type_code: c.type_name.clone(),
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: true,
        }
    }
}
