//! Shared utilities for `trellis`.
//!
//! Common functionality used across modules:
//! - Formatted ID rendering and parsing (`PREFIX-N`)
//! - Timestamp encoding for the database (RFC3339)

pub mod id;
pub mod time;

pub use id::{format_id, parse_id};
pub use time::{format_timestamp, parse_timestamp};
