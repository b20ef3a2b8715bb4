use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDate {
    pub id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(BlockedDate, table = "BlockedDates", partition = |b| b.provider_id.clone(), row = |b| &b.id);

impl BlockedDate {
    pub fn new(provider_id: String, date: NaiveDate, reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            date,
            reason,
            etag: None,
            timestamp: None,
        }
    }
}
