use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// PENDING -> CONFIRMED | CANCELLED, CONFIRMED -> CANCELLED.
    /// CANCELLED is terminal.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    pub fn is_active(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Cancelled]
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Serializes a `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .map_err(|_| D::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub staff_id: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Service duration at creation time. Server-owned.
    #[serde(default)]
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub guests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(
    Booking,
    table = "Bookings",
    partition = |b| b.client_id.clone(),
    row = |b| &b.id,
    secondary = |b| Some(b.provider_id.as_str()),
);

pub struct NewBookingParams {
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub staff_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub guests: Option<u32>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            service_id: params.service_id,
            client_id: params.client_id,
            provider_id: params.provider_id,
            staff_id: params.staff_id,
            date: params.date,
            time: params.time,
            duration_minutes: params.duration_minutes,
            status: BookingStatus::Pending,
            notes: params.notes,
            location: params.location,
            guests: params.guests,
            etag: None,
            timestamp: None,
        }
    }

    pub fn start_minute(&self) -> u32 {
        self.time.hour() * 60 + self.time.minute()
    }

    pub fn end_minute(&self) -> u32 {
        self.start_minute() + self.duration_minutes.max(1)
    }

    /// Seats held by this booking on a shared-capacity slot.
    pub fn seats(&self) -> u32 {
        self.guests.unwrap_or(1).max(1)
    }
}
