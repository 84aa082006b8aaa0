//! Represents an object (file) listed from the bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Projection of a stored object returned by `GET /files`.
///
/// Only the key, modification time and size are ever surfaced. Attributes the
/// backend did not report are left out of the JSON entirely.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Object key, equal to the original upload filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Timestamp when the object was last written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}
