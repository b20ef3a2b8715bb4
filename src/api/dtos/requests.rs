use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use crate::domain::models::schedule::WeeklySchedule;
use crate::domain::services::booking_service::BookingDraft;
use crate::error::AppError;

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format (YYYY-MM-DD)".into()))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| AppError::Validation("Invalid time format (HH:MM)".into()))
}

/// Blank strings from form inputs count as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderProfileRequest {
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
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub image: Option<String>,
    #[serde(default)]
    pub requires_staff_selection: bool,
    pub max_capacity: Option<u32>,
    pub assigned_staff_ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRequest {
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: String,
}

/// Omitted day fields keep the default week (Mon-Fri 09:00-18:00).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub provider_id: String,
    pub monday_enabled: Option<bool>,
    pub monday_hours: Option<String>,
    pub tuesday_enabled: Option<bool>,
    pub tuesday_hours: Option<String>,
    pub wednesday_enabled: Option<bool>,
    pub wednesday_hours: Option<String>,
    pub thursday_enabled: Option<bool>,
    pub thursday_hours: Option<String>,
    pub friday_enabled: Option<bool>,
    pub friday_hours: Option<String>,
    pub saturday_enabled: Option<bool>,
    pub saturday_hours: Option<String>,
    pub sunday_enabled: Option<bool>,
    pub sunday_hours: Option<String>,
}

impl CreateScheduleRequest {
    pub fn into_schedule(self) -> WeeklySchedule {
        fn day(enabled: &mut bool, hours: &mut Option<String>, new_enabled: Option<bool>, new_hours: Option<String>) {
            if let Some(e) = new_enabled {
                *enabled = e;
            }
            if new_hours.is_some() {
                *hours = new_hours;
            }
        }

        let mut s = WeeklySchedule::new(self.provider_id);
        day(&mut s.monday_enabled, &mut s.monday_hours, self.monday_enabled, self.monday_hours);
        day(&mut s.tuesday_enabled, &mut s.tuesday_hours, self.tuesday_enabled, self.tuesday_hours);
        day(&mut s.wednesday_enabled, &mut s.wednesday_hours, self.wednesday_enabled, self.wednesday_hours);
        day(&mut s.thursday_enabled, &mut s.thursday_hours, self.thursday_enabled, self.thursday_hours);
        day(&mut s.friday_enabled, &mut s.friday_hours, self.friday_enabled, self.friday_hours);
        day(&mut s.saturday_enabled, &mut s.saturday_hours, self.saturday_enabled, self.saturday_hours);
        day(&mut s.sunday_enabled, &mut s.sunday_hours, self.sunday_enabled, self.sunday_hours);
        s
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockedDateRequest {
    pub provider_id: String,
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub date: String,
    pub time: String,
    pub staff_id: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub guests: Option<u32>,
}

impl CreateBookingRequest {
    pub fn into_draft(self) -> Result<BookingDraft, AppError> {
        Ok(BookingDraft {
            date: parse_date(&self.date)?,
            time: parse_time(&self.time)?,
            service_id: self.service_id,
            client_id: self.client_id,
            provider_id: self.provider_id,
            staff_id: non_blank(self.staff_id),
            notes: self.notes,
            location: non_blank(self.location),
            guests: self.guests,
        })
    }
}

#[derive(Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuery {
    pub provider_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    pub client_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailabilityQuery {
    pub date: String,
    pub service_id: Option<String>,
    pub staff_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDatesQuery {
    pub start: String,
    pub end: String,
    pub service_id: Option<String>,
    pub staff_id: Option<String>,
}
