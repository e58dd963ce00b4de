//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod health;
pub mod reservations;
pub mod resources;

pub use health::{health_check, metrics, readiness_check};
pub use reservations::{cancel_reservation, list_reservations, register};
pub use resources::{create_resource, get_availability, get_resource};
