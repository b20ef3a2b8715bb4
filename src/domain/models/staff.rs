use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(Staff, table = "Staff", partition = |s| s.provider_id.clone(), row = |s| &s.id);

impl Staff {
    pub fn new(provider_id: String, name: String, role: String, avatar: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            name,
            role,
            avatar,
            etag: None,
            timestamp: None,
        }
    }
}
