//! Library surface for the leave workflow service: configuration, telemetry,
//! application errors, and the workflow modules themselves.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
