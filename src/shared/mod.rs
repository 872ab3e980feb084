//! Shared utilities used across multiple handlers
//!
//! The identifier conversion guard lives here because every lookup route
//! parses its `id` path parameter the same way.

pub mod id;
