//! Compile-time configuration.
//!
//! Pin assignments, timing and broker settings live here. Credentials are
//! baked in from build-time environment variables:
//!
//! ```text
//! WIFI_SSID=... WIFI_PASSWORD=... THINGSBOARD_TOKEN=... cargo build --features embedded
//! ```
//!
//! `THINGSBOARD_HOST` overrides the default broker host.

use embassy_time::Duration;

use crate::error::Error;

// Console

/// Baud rate of the serial debug console.
pub const SERIAL_DEBUG_BAUD: u32 = 115_200;

// Pins (ESP32-S3)
//
//   OLED SDA  → GPIO11
//   OLED SCL  → GPIO12
//   DHT11 DAT → GPIO6

/// I²C address of the SSD1306 controller.
pub const DISPLAY_I2C_ADDRESS: u8 = 0x3C;
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;

// Timing

pub const TELEMETRY_INTERVAL_MS: u64 = 8_000;
/// Startup association: poll this many times...
pub const WIFI_ASSOCIATION_ATTEMPTS: u8 = 20;
/// ...this far apart (20 × 500 ms = 10 s).
pub const WIFI_ASSOCIATION_POLL_MS: u64 = 500;
pub const WIFI_RETRY_DELAY_MS: u64 = 2_000;
pub const BROKER_RETRY_DELAY_MS: u64 = 5_000;
/// Pause between two services of the broker event loop.
pub const BROKER_SERVICE_PERIOD_MS: u64 = 100;

// Broker

pub const DEFAULT_THINGSBOARD_HOST: &str = "app.coreiot.io";
pub const THINGSBOARD_PORT: u16 = 1883;
pub const MQTT_CLIENT_ID: &str = "climate-node";
pub const MQTT_KEEP_ALIVE_SECS: u16 = 60;
pub const MAX_MESSAGE_SEND_SIZE: usize = 256;
pub const MAX_MESSAGE_RECEIVE_SIZE: usize = 256;

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => default,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: &'static str,
    pub password: &'static str,
}

/// Where and how to reach the ThingsBoard broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: &'static str,
    pub port: u16,
    /// Device access token, sent as the MQTT username.
    pub token: &'static str,
    pub client_id: &'static str,
    pub keep_alive_secs: u16,
}

/// Delays used by both tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub telemetry_interval: Duration,
    pub association_attempts: u8,
    pub association_poll: Duration,
    pub wifi_retry: Duration,
    pub broker_retry: Duration,
    pub service_period: Duration,
}

impl Timing {
    pub const fn new() -> Self {
        Self {
            telemetry_interval: Duration::from_millis(TELEMETRY_INTERVAL_MS),
            association_attempts: WIFI_ASSOCIATION_ATTEMPTS,
            association_poll: Duration::from_millis(WIFI_ASSOCIATION_POLL_MS),
            wifi_retry: Duration::from_millis(WIFI_RETRY_DELAY_MS),
            broker_retry: Duration::from_millis(BROKER_RETRY_DELAY_MS),
            service_period: Duration::from_millis(BROKER_SERVICE_PERIOD_MS),
        }
    }
}

/// Milliseconds to hand to a `DelayNs`, saturating at `u32::MAX` (~49 days).
pub fn delay_ms(wait: Duration) -> u32 {
    u32::try_from(wait.as_millis()).unwrap_or(u32::MAX)
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything both tasks need, built once at startup and shared by
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub wifi: WifiCredentials,
    pub broker: BrokerEndpoint,
    pub timing: Timing,
}

impl Config {
    /// Configuration assembled from the build environment.
    pub const fn compiled() -> Self {
        Self {
            wifi: WifiCredentials {
                ssid: env_or(option_env!("WIFI_SSID"), ""),
                password: env_or(option_env!("WIFI_PASSWORD"), ""),
            },
            broker: BrokerEndpoint {
                host: env_or(option_env!("THINGSBOARD_HOST"), DEFAULT_THINGSBOARD_HOST),
                port: THINGSBOARD_PORT,
                token: env_or(option_env!("THINGSBOARD_TOKEN"), ""),
                client_id: MQTT_CLIENT_ID,
                keep_alive_secs: MQTT_KEEP_ALIVE_SECS,
            },
            timing: Timing::new(),
        }
    }

    /// Reports the first credential that was left empty.
    ///
    /// Open WiFi networks have no password, so only the SSID, host and token
    /// are required.
    pub fn validate(&self) -> Result<(), Error> {
        if self.wifi.ssid.is_empty() {
            return Err(Error::MissingCredential("WIFI_SSID"));
        }
        if self.broker.host.is_empty() {
            return Err(Error::MissingCredential("THINGSBOARD_HOST"));
        }
        if self.broker.token.is_empty() {
            return Err(Error::MissingCredential("THINGSBOARD_TOKEN"));
        }
        Ok(())
    }
}
