//! Utility functions for UUID generation and timestamp handling.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Generates a random v4 UUID.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Returns the current time as an RFC3339/ISO-8601 string with microsecond
/// precision.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
