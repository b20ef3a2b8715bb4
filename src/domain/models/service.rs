use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    /// Standard one-to-one appointment (haircut, doctor).
    Appointment,
    /// Classes and workshops; many guests share one slot.
    Event,
    /// Performed at the client's address.
    OnSite,
    /// Restaurant table reservations.
    Table,
}

impl ServiceType {
    pub fn takes_guests(self) -> bool {
        matches!(self, ServiceType::Event | ServiceType::Table)
    }

    pub fn requires_location(self) -> bool {
        matches!(self, ServiceType::OnSite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Appointment => "APPOINTMENT",
            ServiceType::Event => "EVENT",
            ServiceType::OnSite => "ON_SITE",
            ServiceType::Table => "TABLE",
        }
    }
}

impl FromStr for ServiceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ServiceType::Appointment, ServiceType::Event, ServiceType::OnSite, ServiceType::Table]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub category: String,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub requires_staff_selection: bool,
    pub max_capacity: Option<u32>,
    #[serde(default)]
    pub assigned_staff_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(Service, table = "Services", partition = |s| s.provider_id.clone(), row = |s| &s.id);

impl Service {
    pub fn new(provider_id: String, name: String, price: f64, duration_minutes: u32, service_type: ServiceType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            name,
            description: String::new(),
            price,
            duration_minutes,
            category: String::new(),
            image: None,
            service_type,
            requires_staff_selection: false,
            max_capacity: None,
            assigned_staff_ids: BTreeSet::new(),
            etag: None,
            timestamp: None,
        }
    }

    /// EVENT/TABLE services with a capacity share a slot between bookings
    /// up to the guest limit instead of holding it exclusively.
    pub fn shared_capacity(&self) -> Option<u32> {
        if self.service_type.takes_guests() {
            self.max_capacity
        } else {
            None
        }
    }

    /// Whether `staff_id` may perform this service. A service that requires
    /// staff selection only accepts its assigned staff, even when none are.
    pub fn accepts_staff(&self, staff_id: &str) -> bool {
        if self.requires_staff_selection || !self.assigned_staff_ids.is_empty() {
            self.assigned_staff_ids.contains(staff_id)
        } else {
            true
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Service name is required".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("Price must be a non-negative number".into());
        }
        if self.duration_minutes == 0 || self.duration_minutes > 24 * 60 {
            return Err("durationMinutes must be between 1 and 1440".into());
        }
        if self.max_capacity == Some(0) {
            return Err("maxCapacity must be positive".into());
        }
        Ok(())
    }
}
