pub mod availability;
pub mod availability_service;
pub mod booking_service;
pub mod locks;
