//! Unified error type for the node.
//!
//! Variants carry only fixed-size data so the type stays `Copy` and needs no
//! allocator.

use core::fmt;

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Display
    /// I²C transaction to the OLED failed, or the controller did not answer.
    Display,

    // Sensor
    /// DHT11 transaction failed.
    Sensor(SensorError),

    // WiFi
    /// The radio could not be configured or started in station mode.
    WifiStart,
    /// The association request was rejected by the driver.
    WifiConnect,

    // Broker
    /// Broker hostname did not resolve to an IPv4 address.
    Dns,
    /// TCP connection to the broker failed.
    Tcp,
    /// MQTT CONNECT was refused; carries the raw reason code.
    MqttConnect(u8),
    /// A PUBLISH was not accepted by the client.
    Publish,
    /// The broker session is gone.
    Disconnected,

    // Telemetry payload
    /// Payload does not fit in the send buffer.
    PayloadTooLarge,
    /// Telemetry key would produce malformed JSON.
    InvalidKey,
    /// Telemetry value is NaN or infinite.
    InvalidValue,

    // Configuration
    /// A build-time credential was not provided.
    MissingCredential(&'static str),
}

/// DHT11 failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// A pulse edge never arrived.
    Timeout,
    /// The fifth byte did not match the sum of the first four.
    Checksum,
    /// The sensor did not pull the line low after the start signal.
    NotReady,
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Error::Sensor(e)
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Timeout => f.write_str("timeout"),
            SensorError::Checksum => f.write_str("checksum mismatch"),
            SensorError::NotReady => f.write_str("no response"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Display => f.write_str("display error"),
            Error::Sensor(e) => write!(f, "sensor error: {e}"),
            Error::WifiStart => f.write_str("wifi start failed"),
            Error::WifiConnect => f.write_str("wifi connect failed"),
            Error::Dns => f.write_str("broker hostname did not resolve"),
            Error::Tcp => f.write_str("tcp connection to broker failed"),
            Error::MqttConnect(code) => write!(f, "mqtt connect refused (reason 0x{code:02X})"),
            Error::Publish => f.write_str("publish failed"),
            Error::Disconnected => f.write_str("broker session closed"),
            Error::PayloadTooLarge => f.write_str("payload too large"),
            Error::InvalidKey => f.write_str("invalid telemetry key"),
            Error::InvalidValue => f.write_str("invalid telemetry value"),
            Error::MissingCredential(name) => write!(f, "missing credential {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;
    use core::fmt::Write;

    #[test]
    fn sensor_error_converts_into_error() {
        let e: Error = SensorError::Checksum.into();
        assert_eq!(e, Error::Sensor(SensorError::Checksum));
    }

    #[test]
    fn mqtt_reason_code_is_shown_in_hex() {
        let mut s = String::<64>::new();
        write!(s, "{}", Error::MqttConnect(0x86)).unwrap();
        assert_eq!(s.as_str(), "mqtt connect refused (reason 0x86)");
    }
}
