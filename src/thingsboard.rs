//! ThingsBoard device API helpers.
//!
//! Devices authenticate with their access token as the MQTT username and
//! publish JSON objects to a single telemetry topic.

use core::fmt::Write;

use heapless::String;

use crate::config::MAX_MESSAGE_SEND_SIZE;
use crate::error::Error;

pub const TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";

pub type Payload = String<MAX_MESSAGE_SEND_SIZE>;

/// Build `{"<key>":<value>}` for a single telemetry point.
pub fn telemetry_payload(key: &str, value: f32) -> Result<Payload, Error> {
    if key.is_empty() || key.contains(['"', '\\']) || key.chars().any(char::is_control) {
        return Err(Error::InvalidKey);
    }
    if !value.is_finite() {
        return Err(Error::InvalidValue);
    }

    let mut payload = Payload::new();
    write!(payload, "{{\"{key}\":{value}}}").map_err(|_| Error::PayloadTooLarge)?;
    Ok(payload)
}
