use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const MAX_KEY_LEN: usize = 255;

/// Remembers which booking a client's `Idempotency-Key` produced.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyRecord {
    pub client_id: String,
    pub key: String,
    pub booking_id: String,
    /// Hex sha256 of the canonical request body.
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(IdempotencyRecord, table = "IdempotencyKeys", partition = |r| r.client_id.clone(), row = |r| &r.key);

impl IdempotencyRecord {
    pub fn new(client_id: String, key: String, booking_id: String, fingerprint: String) -> Self {
        Self {
            client_id,
            key,
            booking_id,
            fingerprint,
            created_at: Utc::now(),
            etag: None,
            timestamp: None,
        }
    }
}
