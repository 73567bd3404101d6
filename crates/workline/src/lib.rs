//! Core library for the Workline services marketplace.
//!
//! The crate currently ships one workflow: the booking lifecycle engine that
//! carries a booking from a worker's application through settlement. Request
//! handling, persistence engines, and outbound messaging live behind the
//! traits in [`workflows::bookings`] so hosting services can supply their own
//! adapters.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
