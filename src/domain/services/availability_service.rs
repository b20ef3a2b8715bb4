use std::collections::HashMap;
use std::sync::Arc;
use chrono::NaiveDate;
use tracing::debug;
use crate::domain::models::blocked_date::BlockedDate;
use crate::domain::models::booking::Booking;
use crate::domain::models::provider::{ProviderProfile, PROVIDER_PARTITION};
use crate::domain::models::schedule::WeeklySchedule;
use crate::domain::models::service::Service;
use crate::domain::models::staff::Staff;
use crate::domain::ports::EntityStore;
use crate::domain::services::availability::{day_availability, DayAvailability, DayContext, SlotRequest};
use crate::error::AppError;

/// Provider data loaded once and shared by every date it is resolved for.
pub struct ProviderCalendar {
    pub schedule: Option<WeeklySchedule>,
    pub blocked: Vec<BlockedDate>,
    pub bookings: Vec<Booking>,
    pub services: HashMap<String, Service>,
}

impl ProviderCalendar {
    pub fn context(&self, date: NaiveDate) -> DayContext<'_> {
        DayContext {
            date,
            schedule: self.schedule.as_ref(),
            blocked: &self.blocked,
            bookings: &self.bookings,
            services: &self.services,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SlotQuery {
    pub service_id: Option<String>,
    pub staff_id: Option<String>,
}

/// The service and staff a query resolved to.
struct Target {
    service: Option<Service>,
    staff_id: Option<String>,
    candidates: Vec<String>,
    bookable: bool,
}

impl Target {
    fn request(&self, granularity: u32) -> SlotRequest<'_> {
        match &self.service {
            Some(service) => SlotRequest::for_service(service, self.staff_id.as_deref(), None),
            None => SlotRequest::generic(granularity, self.staff_id.as_deref()),
        }
    }

    fn candidates(&self) -> Vec<&str> {
        self.candidates.iter().map(String::as_str).collect()
    }
}

pub struct AvailabilityService {
    providers: Arc<dyn EntityStore<ProviderProfile>>,
    schedules: Arc<dyn EntityStore<WeeklySchedule>>,
    blocked_dates: Arc<dyn EntityStore<BlockedDate>>,
    services: Arc<dyn EntityStore<Service>>,
    staff: Arc<dyn EntityStore<Staff>>,
    bookings: Arc<dyn EntityStore<Booking>>,
    slot_granularity_min: u32,
    max_date_range_days: u32,
}

#[allow(clippy::too_many_arguments)]
impl AvailabilityService {
    pub fn new(
        providers: Arc<dyn EntityStore<ProviderProfile>>,
        schedules: Arc<dyn EntityStore<WeeklySchedule>>,
        blocked_dates: Arc<dyn EntityStore<BlockedDate>>,
        services: Arc<dyn EntityStore<Service>>,
        staff: Arc<dyn EntityStore<Staff>>,
        bookings: Arc<dyn EntityStore<Booking>>,
        slot_granularity_min: u32,
        max_date_range_days: u32,
    ) -> Self {
        Self {
            providers,
            schedules,
            blocked_dates,
            services,
            staff,
            bookings,
            slot_granularity_min,
            max_date_range_days,
        }
    }

    /// Loads schedule, blocked dates, services and bookings of a provider.
    /// With `date` set, only bookings and blocked dates of that day are kept.
    pub async fn load_calendar(&self, provider_id: &str, date: Option<NaiveDate>) -> Result<ProviderCalendar, AppError> {
        let (schedules, mut blocked, mut bookings, services) = tokio::try_join!(
            self.schedules.list_partition(provider_id),
            self.blocked_dates.list_partition(provider_id),
            self.bookings.list_secondary(provider_id),
            self.services.list_partition(provider_id),
        )?;

        if let Some(date) = date {
            blocked.retain(|b| b.date == date);
            bookings.retain(|b| b.date == date);
        }

        Ok(ProviderCalendar {
            schedule: schedules.into_iter().next(),
            blocked,
            bookings,
            services: services.into_iter().map(|s| (s.id.clone(), s)).collect(),
        })
    }

    async fn ensure_provider(&self, provider_id: &str) -> Result<(), AppError> {
        self.providers
            .get(PROVIDER_PARTITION, provider_id)
            .await?
            .ok_or(AppError::NotFound("Provider not found".into()))?;
        Ok(())
    }

    async fn resolve_target(&self, provider_id: &str, calendar: &ProviderCalendar, query: &SlotQuery) -> Result<Target, AppError> {
        let service = match &query.service_id {
            Some(id) => Some(
                calendar
                    .services
                    .get(id)
                    .cloned()
                    .ok_or(AppError::NotFound("Service not found".into()))?,
            ),
            None => None,
        };

        if let Some(staff_id) = &query.staff_id {
            self.staff
                .get(provider_id, staff_id)
                .await?
                .ok_or(AppError::NotFound("Staff not found".into()))?;
            if let Some(service) = &service
                && !service.accepts_staff(staff_id)
            {
                return Err(AppError::Validation("Staff member is not assigned to this service".into()));
            }
        }

        let needs_staff = service.as_ref().is_some_and(|s| s.requires_staff_selection);
        let candidates: Vec<String> = match (&service, &query.staff_id) {
            (Some(s), None) if needs_staff => s.assigned_staff_ids.iter().cloned().collect(),
            _ => Vec::new(),
        };
        let bookable = !(needs_staff && query.staff_id.is_none() && candidates.is_empty());

        Ok(Target { service, staff_id: query.staff_id.clone(), candidates, bookable })
    }

    pub async fn day(&self, provider_id: &str, date: NaiveDate, query: &SlotQuery) -> Result<DayAvailability, AppError> {
        self.ensure_provider(provider_id).await?;
        let calendar = self.load_calendar(provider_id, Some(date)).await?;
        let target = self.resolve_target(provider_id, &calendar, query).await?;

        let mut view = day_availability(
            &calendar.context(date),
            &target.request(self.slot_granularity_min),
            &target.candidates(),
        );
        if !target.bookable {
            view.slots.clear();
        }
        debug!(provider_id, %date, slots = view.slots.len(), "Resolved day availability");
        Ok(view)
    }

    /// Dates in `[start, end]` with at least one open slot.
    pub async fn available_dates(
        &self,
        provider_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        query: &SlotQuery,
    ) -> Result<Vec<NaiveDate>, AppError> {
        if end < start {
            return Err(AppError::Validation("end must not be before start".into()));
        }
        let span = (end - start).num_days() + 1;
        if span > i64::from(self.max_date_range_days) {
            return Err(AppError::Validation(format!(
                "Date range cannot exceed {} days",
                self.max_date_range_days
            )));
        }

        self.ensure_provider(provider_id).await?;
        let calendar = self.load_calendar(provider_id, None).await?;
        let target = self.resolve_target(provider_id, &calendar, query).await?;
        if !target.bookable {
            return Ok(Vec::new());
        }

        let request = target.request(self.slot_granularity_min);
        let candidates = target.candidates();
        let dates = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !day_availability(&calendar.context(*d), &request, &candidates).slots.is_empty())
            .collect();
        Ok(dates)
    }
}
