use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, Weekday};

pub const DEFAULT_WEEKDAY_HOURS: &str = "09:00-18:00";
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinuteInterval {
    pub start: u32,
    pub end: u32,
}

impl MinuteInterval {
    pub fn contains_window(&self, start: u32, end: u32) -> bool {
        self.start <= start && end <= self.end
    }

    pub fn overlaps(&self, other: &MinuteInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Parsed form of an hours string such as `"09:00-13:00,15:00-19:00"`:
/// sorted, disjoint intervals. Overlapping or touching ranges are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenHours(Vec<MinuteInterval>);

impl OpenHours {
    /// Fails closed: an empty string or any malformed segment yields no
    /// open intervals at all.
    pub fn parse(raw: &str) -> Self {
        let mut intervals = Vec::new();
        for segment in raw.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match parse_range(segment) {
                Some(interval) => intervals.push(interval),
                None => return Self::default(),
            }
        }
        Self::from_intervals(intervals)
    }

    /// Strict variant used to warn about input that `parse` would drop.
    pub fn is_well_formed(raw: &str) -> bool {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .all(|s| parse_range(s).is_some())
    }

    pub fn from_intervals(mut intervals: Vec<MinuteInterval>) -> Self {
        intervals.sort();
        let mut merged: Vec<MinuteInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }
        Self(merged)
    }

    pub fn intervals(&self) -> &[MinuteInterval] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `[start, start + duration)` lies inside a single interval.
    pub fn fits(&self, start: u32, duration: u32) -> bool {
        let end = start + duration;
        self.0.iter().any(|i| i.contains_window(start, end))
    }
}

fn parse_range(segment: &str) -> Option<MinuteInterval> {
    let (start, end) = segment.split_once('-')?;
    let start = parse_clock(start.trim())?;
    let end = parse_clock(end.trim())?;
    if start >= end {
        return None;
    }
    Some(MinuteInterval { start, end })
}

/// `HH:MM` to minutes since midnight; `24:00` is accepted as end of day.
pub fn parse_clock(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if m >= 60 {
        return None;
    }
    let total = h * 60 + m;
    (total <= MINUTES_PER_DAY).then_some(total)
}

pub fn format_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySchedule<'a> {
    pub enabled: bool,
    pub hours: Option<&'a str>,
}

impl DaySchedule<'_> {
    pub fn open_hours(&self) -> OpenHours {
        match (self.enabled, self.hours) {
            (true, Some(raw)) => OpenHours::parse(raw),
            _ => OpenHours::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    pub id: String,
    pub provider_id: String,
    pub monday_enabled: bool,
    pub monday_hours: Option<String>,
    pub tuesday_enabled: bool,
    pub tuesday_hours: Option<String>,
    pub wednesday_enabled: bool,
    pub wednesday_hours: Option<String>,
    pub thursday_enabled: bool,
    pub thursday_hours: Option<String>,
    pub friday_enabled: bool,
    pub friday_hours: Option<String>,
    pub saturday_enabled: bool,
    pub saturday_hours: Option<String>,
    pub sunday_enabled: bool,
    pub sunday_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

table_entity!(WeeklySchedule, table = "WeeklySchedules", partition = |s| s.provider_id.clone(), row = |s| &s.id);

impl WeeklySchedule {
    /// Monday to Friday 09:00-18:00, weekend closed.
    pub fn new(provider_id: String) -> Self {
        let weekday = || Some(DEFAULT_WEEKDAY_HOURS.to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            provider_id,
            monday_enabled: true,
            monday_hours: weekday(),
            tuesday_enabled: true,
            tuesday_hours: weekday(),
            wednesday_enabled: true,
            wednesday_hours: weekday(),
            thursday_enabled: true,
            thursday_hours: weekday(),
            friday_enabled: true,
            friday_hours: weekday(),
            saturday_enabled: false,
            saturday_hours: None,
            sunday_enabled: false,
            sunday_hours: None,
            etag: None,
            timestamp: None,
        }
    }

    pub fn day(&self, weekday: Weekday) -> DaySchedule<'_> {
        let (enabled, hours) = match weekday {
            Weekday::Mon => (self.monday_enabled, &self.monday_hours),
            Weekday::Tue => (self.tuesday_enabled, &self.tuesday_hours),
            Weekday::Wed => (self.wednesday_enabled, &self.wednesday_hours),
            Weekday::Thu => (self.thursday_enabled, &self.thursday_hours),
            Weekday::Fri => (self.friday_enabled, &self.friday_hours),
            Weekday::Sat => (self.saturday_enabled, &self.saturday_hours),
            Weekday::Sun => (self.sunday_enabled, &self.sunday_hours),
        };
        DaySchedule { enabled, hours: hours.as_deref() }
    }

    /// Weekdays that are enabled but whose hours would parse to nothing.
    pub fn malformed_days(&self) -> Vec<Weekday> {
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat, Weekday::Sun]
            .into_iter()
            .filter(|wd| {
                let day = self.day(*wd);
                day.enabled && !day.hours.is_some_and(|h| OpenHours::is_well_formed(h) && !OpenHours::parse(h).is_empty())
            })
            .collect()
    }
}
