//! Durable envelopes for writes that could not reach the backend.
//!
//! An envelope is addressed by a logical key that encodes what it is; the
//! kind is parsed back out of the key at replay time, so an envelope written
//! by an older build remains routable as long as its key shape is known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kv-store prefix under which all envelopes are filed
pub const OFFLINE_PREFIX: &str = "offline_";

const COMPLETE_TASK_PREFIX: &str = "complete_task_";

/// Logical key for one completion submission attempt
pub fn completion_key(order_id: i64, attempted_at_unix: i64) -> String {
    format!("{COMPLETE_TASK_PREFIX}{order_id}_{attempted_at_unix}")
}

/// Full kv-store key for a logical envelope key
pub fn storage_key(key: &str) -> String {
    format!("{OFFLINE_PREFIX}{key}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfflineEnvelope {
    pub key: String,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
}

impl OfflineEnvelope {
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        Self {
            key: key.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// What an envelope's key says it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// A buffered packout completion for `order_id`
    CompleteTask { order_id: i64 },
    /// Key shape this build does not know how to deliver
    Unknown,
}

impl EnvelopeKind {
    pub fn parse(key: &str) -> Self {
        let Some(rest) = key.strip_prefix(COMPLETE_TASK_PREFIX) else {
            return EnvelopeKind::Unknown;
        };
        let Some((id_part, ts_part)) = rest.split_once('_') else {
            return EnvelopeKind::Unknown;
        };
        match (id_part.parse::<i64>(), ts_part.parse::<i64>()) {
            (Ok(order_id), Ok(_)) => EnvelopeKind::CompleteTask { order_id },
            _ => EnvelopeKind::Unknown,
        }
    }
}
