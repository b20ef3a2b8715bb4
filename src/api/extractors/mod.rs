pub mod idempotency;
pub mod json;
