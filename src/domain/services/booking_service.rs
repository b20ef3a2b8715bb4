use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use crate::domain::models::booking::{Booking, BookingStatus, NewBookingParams};
use crate::domain::models::idempotency::IdempotencyRecord;
use crate::domain::models::provider::{ProviderProfile, PROVIDER_PARTITION};
use crate::domain::models::service::Service;
use crate::domain::models::staff::Staff;
use crate::domain::ports::EntityStore;
use crate::domain::services::availability::{check_slot, SlotRequest};
use crate::domain::services::availability_service::AvailabilityService;
use crate::domain::services::locks::{KeyedGuard, KeyedLocks};
use crate::error::AppError;

/// A validated booking request, before it is checked against the calendar.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub staff_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub guests: Option<u32>,
}

impl BookingDraft {
    /// Stable digest of the request, used to detect idempotency-key reuse.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }
}

#[derive(Debug)]
pub enum BookingOutcome {
    Created(Booking),
    /// The idempotency key was seen before with the same request.
    Replayed(Booking),
}

pub struct BookingService {
    bookings: Arc<dyn EntityStore<Booking>>,
    idempotency: Arc<dyn EntityStore<IdempotencyRecord>>,
    providers: Arc<dyn EntityStore<ProviderProfile>>,
    services: Arc<dyn EntityStore<Service>>,
    staff: Arc<dyn EntityStore<Staff>>,
    availability: Arc<AvailabilityService>,
    locks: KeyedLocks,
}

fn slot_lock_key(provider_id: &str, date: NaiveDate) -> String {
    format!("slot:{provider_id}:{date}")
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn EntityStore<Booking>>,
        idempotency: Arc<dyn EntityStore<IdempotencyRecord>>,
        providers: Arc<dyn EntityStore<ProviderProfile>>,
        services: Arc<dyn EntityStore<Service>>,
        staff: Arc<dyn EntityStore<Staff>>,
        availability: Arc<AvailabilityService>,
    ) -> Self {
        Self {
            bookings,
            idempotency,
            providers,
            services,
            staff,
            availability,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        let mut bookings = self.bookings.list_all().await?;
        sort_chronologically(&mut bookings);
        Ok(bookings)
    }

    pub async fn list_by_client(&self, client_id: &str) -> Result<Vec<Booking>, AppError> {
        let mut bookings = self.bookings.list_partition(client_id).await?;
        sort_chronologically(&mut bookings);
        Ok(bookings)
    }

    pub async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError> {
        let mut bookings = self.bookings.list_secondary(provider_id).await?;
        sort_chronologically(&mut bookings);
        Ok(bookings)
    }

    pub async fn get(&self, client_id: &str, id: &str) -> Result<Booking, AppError> {
        self.bookings
            .get(client_id, id)
            .await?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }

    pub async fn delete(&self, client_id: &str, id: &str) -> Result<(), AppError> {
        self.bookings.delete(client_id, id).await?;
        info!(booking_id = id, client_id, "Booking deleted");
        Ok(())
    }

    /// Creates a PENDING booking. With an idempotency key, a repeated request
    /// returns the booking created the first time instead of a new one.
    pub async fn create(&self, draft: BookingDraft, idempotency_key: Option<String>) -> Result<BookingOutcome, AppError> {
        let Some(key) = idempotency_key else {
            return self.place(&draft).await.map(BookingOutcome::Created);
        };

        let _key_guard = self.locks.lock(format!("idem:{}:{}", draft.client_id, key)).await;
        let fingerprint = draft.fingerprint();

        if let Some(record) = self.idempotency.get(&draft.client_id, &key).await? {
            if record.fingerprint != fingerprint {
                warn!(client_id = %draft.client_id, "Idempotency key reused with a different request");
                return Err(AppError::Conflict(
                    "Idempotency-Key was already used with a different request".into(),
                ));
            }
            let booking = self
                .bookings
                .get(&record.client_id, &record.booking_id)
                .await?
                .ok_or(AppError::Conflict(
                    "The booking created with this Idempotency-Key no longer exists".into(),
                ))?;
            info!(booking_id = %booking.id, "Idempotent replay of booking creation");
            return Ok(BookingOutcome::Replayed(booking));
        }

        let booking = self.place(&draft).await?;
        let record = IdempotencyRecord::new(draft.client_id.clone(), key, booking.id.clone(), fingerprint);
        if let Err(e) = self.idempotency.create(&record).await {
            error!(booking_id = %booking.id, "Failed to store idempotency key, rolling back booking: {}", e);
            if let Err(rollback) = self.bookings.delete(&booking.client_id, &booking.id).await {
                error!(booking_id = %booking.id, "Rollback failed: {}", rollback);
            }
            return Err(e);
        }
        Ok(BookingOutcome::Created(booking))
    }

    async fn place(&self, draft: &BookingDraft) -> Result<Booking, AppError> {
        if draft.client_id.trim().is_empty() {
            return Err(AppError::Validation("clientId is required".into()));
        }
        self.providers
            .get(PROVIDER_PARTITION, &draft.provider_id)
            .await?
            .ok_or(AppError::Validation("Unknown provider".into()))?;
        let service = self.load_service(&draft.provider_id, &draft.service_id).await?;
        self.validate_for_service(&service, draft.staff_id.as_deref(), draft.location.as_deref(), draft.guests)
            .await?;

        let _slot_guard = self.locks.lock(slot_lock_key(&draft.provider_id, draft.date)).await;

        let calendar = self.availability.load_calendar(&draft.provider_id, Some(draft.date)).await?;
        let request = SlotRequest::for_service(&service, draft.staff_id.as_deref(), draft.guests);
        if let Err(rejection) = check_slot(&calendar.context(draft.date), &request, minute_of_day(draft.time)) {
            warn!(
                provider_id = %draft.provider_id,
                date = %draft.date,
                time = %draft.time,
                "Booking rejected: {}",
                rejection.message()
            );
            return Err(AppError::Conflict(rejection.message()));
        }

        let booking = Booking::new(NewBookingParams {
            service_id: draft.service_id.clone(),
            client_id: draft.client_id.clone(),
            provider_id: draft.provider_id.clone(),
            staff_id: draft.staff_id.clone(),
            date: draft.date,
            time: draft.time,
            duration_minutes: service.duration_minutes,
            notes: draft.notes.clone(),
            location: draft.location.clone(),
            guests: draft.guests,
        });
        let created = match self.bookings.create(&booking).await {
            Ok(created) => created,
            Err(AppError::StoreTimeout(op)) => self.recover_timed_out_create(&booking, op).await?,
            Err(e) => return Err(e),
        };
        info!(
            booking_id = %created.id,
            provider_id = %created.provider_id,
            date = %created.date,
            time = %created.time.format("%H:%M"),
            "Booking created"
        );
        Ok(created)
    }

    /// A create that ran out of time may still have committed. Look the row
    /// up once more so a committed booking is not reported as failed.
    async fn recover_timed_out_create(&self, booking: &Booking, op: String) -> Result<Booking, AppError> {
        match self.bookings.get(&booking.client_id, &booking.id).await {
            Ok(Some(stored)) => {
                warn!(booking_id = %stored.id, "Booking create timed out but the row was committed");
                Ok(stored)
            }
            Ok(None) => Err(AppError::StoreTimeout(op)),
            Err(e) => {
                error!(booking_id = %booking.id, "Booking create outcome unknown after timeout: {}", e);
                Err(AppError::StoreTimeout(op))
            }
        }
    }

    async fn load_service(&self, provider_id: &str, service_id: &str) -> Result<Service, AppError> {
        self.services
            .get(provider_id, service_id)
            .await?
            .ok_or(AppError::Validation("Unknown service for this provider".into()))
    }

    /// Staff, location and guest rules that depend on the service type.
    async fn validate_for_service(
        &self,
        service: &Service,
        staff_id: Option<&str>,
        location: Option<&str>,
        guests: Option<u32>,
    ) -> Result<(), AppError> {
        match staff_id {
            Some(staff_id) => {
                self.staff
                    .get(&service.provider_id, staff_id)
                    .await?
                    .ok_or(AppError::Validation("Unknown staff member for this provider".into()))?;
                if !service.accepts_staff(staff_id) {
                    return Err(AppError::Validation("Staff member is not assigned to this service".into()));
                }
            }
            None if service.requires_staff_selection => {
                return Err(AppError::Validation("This service requires selecting a staff member".into()));
            }
            None => {}
        }

        if service.service_type.requires_location() && location.is_none_or(|l| l.trim().is_empty()) {
            return Err(AppError::Validation("A location is required for on-site services".into()));
        }

        if service.service_type.takes_guests() {
            match guests {
                Some(0) => return Err(AppError::Validation("guests must be at least 1".into())),
                Some(n) if service.max_capacity.is_some_and(|cap| n > cap) => {
                    return Err(AppError::Validation(format!(
                        "guests cannot exceed the service capacity of {}",
                        service.max_capacity.unwrap_or_default()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub async fn confirm(&self, client_id: &str, id: &str) -> Result<Booking, AppError> {
        self.transition(client_id, id, BookingStatus::Confirmed).await
    }

    pub async fn cancel(&self, client_id: &str, id: &str) -> Result<Booking, AppError> {
        self.transition(client_id, id, BookingStatus::Cancelled).await
    }

    /// Applies a state-machine transition, conditional on the etag read here.
    pub async fn transition(&self, client_id: &str, id: &str, next: BookingStatus) -> Result<Booking, AppError> {
        let mut booking = self.get(client_id, id).await?;
        let current = booking.status;
        if !current.can_transition_to(next) {
            return Err(AppError::Conflict(format!("Cannot change booking status from {current} to {next}")));
        }

        booking.status = next;
        let etag = booking.etag.clone();
        let updated = self.bookings.replace(&booking, etag.as_deref()).await?;
        info!(booking_id = id, from = %current, to = %next, "Booking status changed");
        Ok(updated)
    }

    /// Full-record replace. Foreign keys are immutable and status follows the
    /// state machine. An active booking must satisfy the service rules, and a
    /// moved one must fit the calendar again.
    pub async fn update(&self, mut incoming: Booking) -> Result<Booking, AppError> {
        let existing = match self.bookings.get(&incoming.client_id, &incoming.id).await? {
            Some(existing) => existing,
            None => {
                let moved_client = self
                    .bookings
                    .list_secondary(&incoming.provider_id)
                    .await?
                    .into_iter()
                    .any(|b| b.id == incoming.id);
                if moved_client {
                    return Err(AppError::Validation("clientId cannot be changed".into()));
                }
                return Err(AppError::NotFound("Booking not found".into()));
            }
        };

        if incoming.service_id != existing.service_id {
            return Err(AppError::Validation("serviceId cannot be changed".into()));
        }
        if incoming.provider_id != existing.provider_id {
            return Err(AppError::Validation("providerId cannot be changed".into()));
        }
        if incoming.status != existing.status && !existing.status.can_transition_to(incoming.status) {
            return Err(AppError::Conflict(format!(
                "Cannot change booking status from {} to {}",
                existing.status, incoming.status
            )));
        }

        incoming.duration_minutes = existing.duration_minutes;
        let if_match = incoming.etag.clone().or_else(|| existing.etag.clone());

        let slot_changed = incoming.date != existing.date
            || incoming.time != existing.time
            || incoming.staff_id != existing.staff_id
            || incoming.guests != existing.guests;

        if !incoming.status.is_active() {
            return self.save_in_place(&incoming, if_match.as_deref()).await;
        }

        // A booking whose service was deleted can still be edited in place.
        let service = match self.services.get(&existing.provider_id, &existing.service_id).await? {
            Some(service) => service,
            None if !slot_changed => return self.save_in_place(&incoming, if_match.as_deref()).await,
            None => return Err(AppError::Validation("Unknown service for this provider".into())),
        };
        self.validate_for_service(&service, incoming.staff_id.as_deref(), incoming.location.as_deref(), incoming.guests)
            .await?;

        if !slot_changed {
            return self.save_in_place(&incoming, if_match.as_deref()).await;
        }

        let _guards: Vec<KeyedGuard> = self
            .locks
            .lock_all([
                slot_lock_key(&existing.provider_id, existing.date),
                slot_lock_key(&existing.provider_id, incoming.date),
            ])
            .await;

        let calendar = self.availability.load_calendar(&existing.provider_id, Some(incoming.date)).await?;
        let request = SlotRequest::for_service(&service, incoming.staff_id.as_deref(), incoming.guests)
            .excluding(&existing.id);
        if let Err(rejection) = check_slot(&calendar.context(incoming.date), &request, minute_of_day(incoming.time)) {
            warn!(booking_id = %existing.id, "Booking move rejected: {}", rejection.message());
            return Err(AppError::Conflict(rejection.message()));
        }

        let updated = self.bookings.replace(&incoming, if_match.as_deref()).await?;
        info!(
            booking_id = %updated.id,
            date = %updated.date,
            time = %updated.time.format("%H:%M"),
            "Booking rescheduled"
        );
        Ok(updated)
    }

    async fn save_in_place(&self, booking: &Booking, if_match: Option<&str>) -> Result<Booking, AppError> {
        let updated = self.bookings.replace(booking, if_match).await?;
        info!(booking_id = %updated.id, "Booking updated");
        Ok(updated)
    }
}

fn sort_chronologically(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| (a.date, a.time, &a.id).cmp(&(b.date, b.time, &b.id)));
}
