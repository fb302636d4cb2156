//! Citizenship verification stage for the registration processing pipeline.
//!
//! The crate hosts the citizenship-by-birth eligibility engine together with the
//! configuration, telemetry, and HTTP plumbing needed to run it as a service.

pub mod citizenship;
pub mod config;
pub mod error;
pub mod telemetry;
