//! Climate telemetry node: DHT11 → SSD1306 + ThingsBoard over WiFi/MQTT.
//!
//! The hardware-independent modules build and test on the host:
//!
//! ```text
//! cargo test --lib --tests
//! ```
//!
//! Drivers for the ESP32-S3 (radio, network stack, OLED, DHT11 pin driver)
//! and the firmware binaries sit behind the `embedded` feature.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dht;
pub mod error;
pub mod handoff;
pub mod logic;
pub mod model;
pub mod supervisor;
pub mod thingsboard;
pub mod traits;

#[cfg(feature = "embedded")]
pub mod display;
#[cfg(feature = "embedded")]
pub mod hardware;
#[cfg(feature = "embedded")]
pub mod net;

pub use config::Config;
pub use error::Error;
pub use handoff::Handoff;
pub use model::Reading;
