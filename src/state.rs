use std::sync::Arc;
use crate::config::Config;
use crate::domain::models::{
    blocked_date::BlockedDate, booking::Booking, idempotency::IdempotencyRecord,
    provider::ProviderProfile, schedule::WeeklySchedule, service::Service, staff::Staff, user::User,
};
use crate::domain::ports::EntityStore;
use crate::domain::services::availability_service::AvailabilityService;
use crate::domain::services::booking_service::BookingService;
use crate::domain::services::locks::KeyedLocks;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_store: Arc<dyn EntityStore<User>>,
    pub provider_store: Arc<dyn EntityStore<ProviderProfile>>,
    pub service_store: Arc<dyn EntityStore<Service>>,
    pub staff_store: Arc<dyn EntityStore<Staff>>,
    pub schedule_store: Arc<dyn EntityStore<WeeklySchedule>>,
    pub blocked_date_store: Arc<dyn EntityStore<BlockedDate>>,
    pub booking_store: Arc<dyn EntityStore<Booking>>,
    pub idempotency_store: Arc<dyn EntityStore<IdempotencyRecord>>,
    pub availability_service: Arc<AvailabilityService>,
    pub booking_service: Arc<BookingService>,
    /// Serializes uniqueness checks on catalog natural keys with their write.
    pub catalog_locks: KeyedLocks,
}

/// The raw stores an [`AppState`] is assembled from.
pub struct Stores {
    pub users: Arc<dyn EntityStore<User>>,
    pub providers: Arc<dyn EntityStore<ProviderProfile>>,
    pub services: Arc<dyn EntityStore<Service>>,
    pub staff: Arc<dyn EntityStore<Staff>>,
    pub schedules: Arc<dyn EntityStore<WeeklySchedule>>,
    pub blocked_dates: Arc<dyn EntityStore<BlockedDate>>,
    pub bookings: Arc<dyn EntityStore<Booking>>,
    pub idempotency: Arc<dyn EntityStore<IdempotencyRecord>>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        let availability_service = Arc::new(AvailabilityService::new(
            stores.providers.clone(),
            stores.schedules.clone(),
            stores.blocked_dates.clone(),
            stores.services.clone(),
            stores.staff.clone(),
            stores.bookings.clone(),
            config.slot_granularity_min,
            config.max_date_range_days,
        ));
        let booking_service = Arc::new(BookingService::new(
            stores.bookings.clone(),
            stores.idempotency.clone(),
            stores.providers.clone(),
            stores.services.clone(),
            stores.staff.clone(),
            availability_service.clone(),
        ));

        Self {
            config,
            user_store: stores.users,
            provider_store: stores.providers,
            service_store: stores.services,
            staff_store: stores.staff,
            schedule_store: stores.schedules,
            blocked_date_store: stores.blocked_dates,
            booking_store: stores.bookings,
            idempotency_store: stores.idempotency,
            availability_service,
            booking_service,
            catalog_locks: KeyedLocks::new(),
        }
    }
}
