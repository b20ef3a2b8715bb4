use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub const PROVIDER_PARTITION: &str = "PROVIDER";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hero_image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub theme_color: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub instagram: Option<String>,
    pub working_hours_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(ProviderProfile, table = "ProviderProfiles", partition = |_p| PROVIDER_PARTITION.to_string(), row = |p| &p.id);

impl ProviderProfile {
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            description: String::new(),
            hero_image: String::new(),
            category: String::new(),
            theme_color: String::new(),
            address: None,
            phone: None,
            instagram: None,
            working_hours_json: None,
            etag: None,
            timestamp: None,
        }
    }

    pub fn slug_matches(&self, slug: &str) -> bool {
        self.slug.eq_ignore_ascii_case(slug)
    }
}
