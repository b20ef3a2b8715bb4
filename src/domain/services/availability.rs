use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::HashMap;
use crate::domain::models::blocked_date::BlockedDate;
use crate::domain::models::booking::Booking;
use crate::domain::models::schedule::{format_clock, OpenHours, WeeklySchedule};
use crate::domain::models::service::Service;

/// Everything the resolver needs to know about one provider on one date.
pub struct DayContext<'a> {
    pub date: NaiveDate,
    pub schedule: Option<&'a WeeklySchedule>,
    pub blocked: &'a [BlockedDate],
    /// Bookings of the provider on `date`; cancelled ones are ignored.
    pub bookings: &'a [Booking],
    /// Provider's services keyed by id, used to tell shared bookings apart.
    pub services: &'a HashMap<String, Service>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedReason {
    NoSchedule,
    WeekdayClosed,
    Blocked(Option<String>),
    NoOpenHours,
}

impl ClosedReason {
    pub fn message(&self) -> &'static str {
        match self {
            ClosedReason::NoSchedule => "provider has no weekly schedule",
            ClosedReason::WeekdayClosed => "provider closed this weekday",
            ClosedReason::Blocked(_) => "date blocked",
            ClosedReason::NoOpenHours => "no open hours",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRejection {
    Closed(ClosedReason),
    OutsideHours,
    Overlap,
    CapacityExceeded { remaining: u32 },
}

impl SlotRejection {
    pub fn message(&self) -> String {
        match self {
            SlotRejection::Closed(ClosedReason::Blocked(Some(reason))) => format!("date blocked: {reason}"),
            SlotRejection::Closed(reason) => reason.message().to_string(),
            SlotRejection::OutsideHours => "requested time is outside opening hours".to_string(),
            SlotRejection::Overlap => "slot is no longer available".to_string(),
            SlotRejection::CapacityExceeded { remaining } => {
                format!("not enough capacity for this slot ({remaining} places left)")
            }
        }
    }
}

/// What is being placed: its length, how it competes for the slot, and
/// which booking (if any) is being moved and must not block itself.
#[derive(Debug, Clone)]
pub struct SlotRequest<'a> {
    pub duration: u32,
    pub shared: Option<SharedSlot<'a>>,
    pub staff_scope: Option<&'a str>,
    pub guests: u32,
    pub exclude_booking: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct SharedSlot<'a> {
    pub service_id: &'a str,
    pub capacity: u32,
}

impl<'a> SlotRequest<'a> {
    pub fn for_service(service: &'a Service, staff_id: Option<&'a str>, guests: Option<u32>) -> Self {
        Self {
            duration: service.duration_minutes,
            shared: service.shared_capacity().map(|capacity| SharedSlot {
                service_id: &service.id,
                capacity,
            }),
            staff_scope: if service.requires_staff_selection { staff_id } else { None },
            guests: guests.unwrap_or(1).max(1),
            exclude_booking: None,
        }
    }

    /// A generic exclusive window, used when no service is given.
    pub fn generic(duration: u32, staff_id: Option<&'a str>) -> Self {
        Self {
            duration,
            shared: None,
            staff_scope: staff_id,
            guests: 1,
            exclude_booking: None,
        }
    }

    pub fn excluding(mut self, booking_id: &'a str) -> Self {
        self.exclude_booking = Some(booking_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCheck {
    pub remaining_capacity: Option<u32>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntervalView {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_capacity: Option<u32>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub weekday: String,
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    pub intervals: Vec<IntervalView>,
    pub slots: Vec<SlotView>,
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Opening hours of the day, or why there are none. A blocked date wins
/// over the weekly schedule.
pub fn open_hours(ctx: &DayContext<'_>) -> Result<OpenHours, ClosedReason> {
    let schedule = ctx.schedule.ok_or(ClosedReason::NoSchedule)?;
    let day = schedule.day(ctx.date.weekday());
    if !day.enabled {
        return Err(ClosedReason::WeekdayClosed);
    }
    if let Some(blocked) = ctx.blocked.iter().find(|b| b.date == ctx.date) {
        return Err(ClosedReason::Blocked(blocked.reason.clone()));
    }
    let hours = day.open_hours();
    if hours.is_empty() {
        return Err(ClosedReason::NoOpenHours);
    }
    Ok(hours)
}

/// Decides whether `request` can start at `start` (minutes since midnight).
pub fn check_slot(ctx: &DayContext<'_>, request: &SlotRequest<'_>, start: u32) -> Result<SlotCheck, SlotRejection> {
    let hours = open_hours(ctx).map_err(SlotRejection::Closed)?;
    if request.duration == 0 || !hours.fits(start, request.duration) {
        return Err(SlotRejection::OutsideHours);
    }
    check_against_bookings(ctx, request, start)
}

fn active_bookings<'b>(ctx: &'b DayContext<'_>, request: &'b SlotRequest<'_>) -> impl Iterator<Item = &'b Booking> {
    ctx.bookings.iter().filter(move |b| {
        b.status.is_active() && b.date == ctx.date && Some(b.id.as_str()) != request.exclude_booking
    })
}

fn is_shared(ctx: &DayContext<'_>, booking: &Booking) -> bool {
    ctx.services
        .get(&booking.service_id)
        .is_some_and(|s| s.shared_capacity().is_some())
}

fn check_against_bookings(ctx: &DayContext<'_>, request: &SlotRequest<'_>, start: u32) -> Result<SlotCheck, SlotRejection> {
    if let Some(shared) = request.shared {
        let used: u32 = active_bookings(ctx, request)
            .filter(|b| b.service_id == shared.service_id && b.start_minute() == start)
            .map(Booking::seats)
            .sum();
        let remaining = shared.capacity.saturating_sub(used);
        if request.guests > remaining {
            return Err(SlotRejection::CapacityExceeded { remaining });
        }
        return Ok(SlotCheck { remaining_capacity: Some(remaining) });
    }

    let end = start + request.duration;
    let clash = active_bookings(ctx, request)
        .filter(|b| !is_shared(ctx, b))
        .filter(|b| match request.staff_scope {
            Some(staff) => b.staff_id.as_deref() == Some(staff),
            None => true,
        })
        .any(|b| b.start_minute() < end && start < b.end_minute());
    if clash {
        return Err(SlotRejection::Overlap);
    }
    Ok(SlotCheck { remaining_capacity: None })
}

/// Open slots of the day. Each interval is walked from its start in steps
/// of the request duration. With `candidate_staff` set, a slot is listed
/// when at least one of those staff members is free.
pub fn day_availability(ctx: &DayContext<'_>, request: &SlotRequest<'_>, candidate_staff: &[&str]) -> DayAvailability {
    let mut view = DayAvailability {
        date: ctx.date,
        weekday: weekday_name(ctx.date.weekday()).to_string(),
        open: false,
        closed_reason: None,
        blocked_reason: None,
        intervals: Vec::new(),
        slots: Vec::new(),
    };

    let hours = match open_hours(ctx) {
        Ok(hours) => hours,
        Err(reason) => {
            view.closed_reason = Some(reason.message().to_string());
            if let ClosedReason::Blocked(blocked) = reason {
                view.blocked_reason = blocked;
            }
            return view;
        }
    };

    view.open = true;
    view.intervals = hours
        .intervals()
        .iter()
        .map(|i| IntervalView { start: format_clock(i.start), end: format_clock(i.end) })
        .collect();

    if request.duration == 0 {
        return view;
    }

    for interval in hours.intervals() {
        let mut cursor = interval.start;
        while cursor + request.duration <= interval.end {
            let check = if candidate_staff.is_empty() {
                check_against_bookings(ctx, request, cursor).ok()
            } else {
                candidate_staff.iter().find_map(|staff| {
                    let scoped = SlotRequest { staff_scope: Some(*staff), ..request.clone() };
                    check_against_bookings(ctx, &scoped, cursor).ok()
                })
            };
            if let Some(check) = check {
                view.slots.push(SlotView {
                    time: format_clock(cursor),
                    remaining_capacity: check.remaining_capacity,
                });
            }
            cursor += request.duration;
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::booking::{BookingStatus, NewBookingParams};
    use crate::domain::models::service::ServiceType;
    use chrono::NaiveTime;

    // 2025-01-06 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn schedule(hours: &str) -> WeeklySchedule {
        let mut s = WeeklySchedule::new("p1".into());
        s.monday_hours = Some(hours.into());
        s
    }

    fn booking(service: &Service, time: &str, staff: Option<&str>, guests: Option<u32>) -> Booking {
        Booking::new(NewBookingParams {
            service_id: service.id.clone(),
            client_id: "c1".into(),
            provider_id: "p1".into(),
            staff_id: staff.map(Into::into),
            date: monday(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            duration_minutes: service.duration_minutes,
            notes: None,
            location: None,
            guests,
        })
    }

    fn services(list: &[&Service]) -> HashMap<String, Service> {
        list.iter().map(|s| (s.id.clone(), (*s).clone())).collect()
    }

    fn slot_times(view: &DayAvailability) -> Vec<&str> {
        view.slots.iter().map(|s| s.time.as_str()).collect()
    }

    #[test]
    fn test_no_schedule_is_closed() {
        let catalog = HashMap::new();
        let ctx = DayContext { date: monday(), schedule: None, blocked: &[], bookings: &[], services: &catalog };
        let view = day_availability(&ctx, &SlotRequest::generic(30, None), &[]);
        assert!(!view.open);
        assert!(view.slots.is_empty());
        assert_eq!(view.closed_reason.as_deref(), Some("provider has no weekly schedule"));
    }

    #[test]
    fn test_disabled_weekday_is_closed_regardless_of_hours() {
        let mut sched = schedule("09:00-12:00");
        sched.monday_enabled = false;
        let catalog = HashMap::new();
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &[], services: &catalog };
        assert_eq!(
            check_slot(&ctx, &SlotRequest::generic(30, None), 540),
            Err(SlotRejection::Closed(ClosedReason::WeekdayClosed))
        );
        let view = day_availability(&ctx, &SlotRequest::generic(30, None), &[]);
        assert_eq!(view.closed_reason.as_deref(), Some("provider closed this weekday"));
    }

    #[test]
    fn test_blocked_date_wins() {
        let sched = schedule("09:00-12:00");
        let blocked = vec![BlockedDate::new("p1".into(), monday(), Some("holiday".into()))];
        let catalog = HashMap::new();
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &blocked, bookings: &[], services: &catalog };

        let view = day_availability(&ctx, &SlotRequest::generic(30, None), &[]);
        assert!(!view.open);
        assert_eq!(view.closed_reason.as_deref(), Some("date blocked"));
        assert_eq!(view.blocked_reason.as_deref(), Some("holiday"));
        assert_eq!(
            check_slot(&ctx, &SlotRequest::generic(30, None), 540).unwrap_err().message(),
            "date blocked: holiday"
        );
    }

    #[test]
    fn test_malformed_hours_fail_closed() {
        let sched = schedule("nine-ish");
        let catalog = HashMap::new();
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &[], services: &catalog };
        let view = day_availability(&ctx, &SlotRequest::generic(30, None), &[]);
        assert!(!view.open);
        assert!(view.slots.is_empty());
    }

    #[test]
    fn test_slots_step_by_duration_and_respect_intervals() {
        let sched = schedule("09:00-12:00,11:00-12:30");
        let svc = Service::new("p1".into(), "Cut".into(), 20.0, 60, ServiceType::Appointment);
        let catalog = services(&[&svc]);
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &[], services: &catalog };

        let view = day_availability(&ctx, &SlotRequest::for_service(&svc, None, None), &[]);
        assert_eq!(view.intervals.len(), 1);
        assert_eq!(slot_times(&view), vec!["09:00", "10:00", "11:00"]);
        assert_eq!(
            check_slot(&ctx, &SlotRequest::for_service(&svc, None, None), 12 * 60),
            Err(SlotRejection::OutsideHours)
        );
    }

    #[test]
    fn test_overlap_blocks_unaligned_start() {
        let sched = schedule("09:00-12:00");
        let svc = Service::new("p1".into(), "Cut".into(), 20.0, 60, ServiceType::Appointment);
        let existing = vec![booking(&svc, "09:00", None, None)];
        let catalog = services(&[&svc]);
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &existing, services: &catalog };
        let req = SlotRequest::for_service(&svc, None, None);

        assert_eq!(check_slot(&ctx, &req, 540), Err(SlotRejection::Overlap));
        assert_eq!(check_slot(&ctx, &req, 570), Err(SlotRejection::Overlap));
        assert!(check_slot(&ctx, &req, 600).is_ok());

        let moving = req.clone().excluding(&existing[0].id);
        assert!(check_slot(&ctx, &moving, 540).is_ok());
    }

    #[test]
    fn test_cancelled_booking_frees_slot() {
        let sched = schedule("09:00-12:00");
        let svc = Service::new("p1".into(), "Cut".into(), 20.0, 60, ServiceType::Appointment);
        let mut existing = vec![booking(&svc, "09:00", None, None)];
        existing[0].status = BookingStatus::Cancelled;
        let catalog = services(&[&svc]);
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &existing, services: &catalog };
        assert!(check_slot(&ctx, &SlotRequest::for_service(&svc, None, None), 540).is_ok());
    }

    #[test]
    fn test_staff_scoping() {
        let sched = schedule("09:00-12:00");
        let mut svc = Service::new("p1".into(), "Cut".into(), 20.0, 60, ServiceType::Appointment);
        svc.requires_staff_selection = true;
        svc.assigned_staff_ids = ["ana".to_string(), "bo".to_string()].into();
        let existing = vec![booking(&svc, "09:00", Some("ana"), None)];
        let catalog = services(&[&svc]);
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &existing, services: &catalog };

        assert_eq!(
            check_slot(&ctx, &SlotRequest::for_service(&svc, Some("ana"), None), 540),
            Err(SlotRejection::Overlap)
        );
        assert!(check_slot(&ctx, &SlotRequest::for_service(&svc, Some("bo"), None), 540).is_ok());

        // Either staff member free is enough for the listing.
        let view = day_availability(&ctx, &SlotRequest::for_service(&svc, None, None), &["ana", "bo"]);
        assert_eq!(slot_times(&view), vec!["09:00", "10:00", "11:00"]);
        let only_ana = day_availability(&ctx, &SlotRequest::for_service(&svc, Some("ana"), None), &[]);
        assert_eq!(slot_times(&only_ana), vec!["10:00", "11:00"]);
    }

    #[test]
    fn test_capacity_counts_guests_at_exact_slot() {
        let sched = schedule("18:00-22:00");
        let mut tables = Service::new("p1".into(), "Dinner".into(), 0.0, 120, ServiceType::Table);
        tables.max_capacity = Some(10);
        let cut = Service::new("p1".into(), "Cut".into(), 20.0, 60, ServiceType::Appointment);
        let existing = vec![
            booking(&tables, "18:00", None, Some(6)),
            booking(&tables, "18:00", None, None),
            booking(&cut, "18:00", None, None),
        ];
        let catalog = services(&[&tables, &cut]);
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &existing, services: &catalog };

        let three = SlotRequest::for_service(&tables, None, Some(3));
        assert_eq!(check_slot(&ctx, &three, 18 * 60), Ok(SlotCheck { remaining_capacity: Some(3) }));
        let four = SlotRequest::for_service(&tables, None, Some(4));
        assert_eq!(
            check_slot(&ctx, &four, 18 * 60),
            Err(SlotRejection::CapacityExceeded { remaining: 3 })
        );

        // Shared bookings do not block exclusive services.
        let view = day_availability(&ctx, &SlotRequest::for_service(&cut, None, None), &[]);
        assert_eq!(slot_times(&view), vec!["19:00", "20:00", "21:00"]);
    }

    #[test]
    fn test_unknown_service_booking_is_exclusive() {
        let sched = schedule("09:00-12:00");
        let gone = Service::new("p1".into(), "Old".into(), 0.0, 60, ServiceType::Event);
        let existing = vec![booking(&gone, "10:00", None, Some(2))];
        let catalog = HashMap::new();
        let ctx = DayContext { date: monday(), schedule: Some(&sched), blocked: &[], bookings: &existing, services: &catalog };
        assert_eq!(check_slot(&ctx, &SlotRequest::generic(30, None), 630), Err(SlotRejection::Overlap));
    }
}
