use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Client,
    Provider,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Client => "CLIENT",
            UserRole::Provider => "PROVIDER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("CLIENT") {
            Ok(UserRole::Client)
        } else if s.eq_ignore_ascii_case("PROVIDER") {
            Ok(UserRole::Provider)
        } else {
            Err(())
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(User, table = "Users", partition = |u| u.role.to_string(), row = |u| &u.id);

impl User {
    pub fn new(email: String, name: String, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            role,
            avatar: None,
            etag: None,
            timestamp: None,
        }
    }
}
