//! Hormur support-ticket router — lean delivery core.

pub mod config;
pub mod datastore;
pub mod demo;
pub mod envelope;
pub mod error;
pub mod qualify;
pub mod reconciler;
pub mod routes;
pub mod sanitize;
pub mod sinks;
pub mod validate;
