//! HTTP middleware for request instrumentation
//!
//! Provides the instrumentation layer that keeps in-flight gauges and the
//! duration histogram consistent around every lookup request.

pub mod instrument;

pub use instrument::{
    InFlightGuard, RequestContext, RequestOutcome, extract_entity, instrument_middleware,
    method_label,
};
