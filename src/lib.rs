//! Lookup service - instrumented demo HTTP API for users and notes
//!
//! This library provides the request instrumentation core (metric registry,
//! in-flight tracking, identifier conversion counting) and the Axum routes
//! that serve lookups from an in-memory store.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod shared;
pub mod store;
pub mod telemetry;
