//! Hardware abstraction traits

use core::net::Ipv4Addr;

use crate::config::{BrokerEndpoint, WifiCredentials};
use crate::error::Error;

/// Trait for temperature/humidity sensors
///
/// Both reads return `f32::NAN` when the measurement failed.
pub trait ClimateSensor {
    /// Read temperature in Celsius
    fn read_temperature(&mut self) -> f32;

    /// Read relative humidity in percent
    fn read_humidity(&mut self) -> f32;
}

/// Glyph size used by [`Display::draw_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    /// Label text, 6×10 px glyphs.
    Small,
    /// Value text, 9×15 px glyphs.
    Large,
}

/// Trait for display devices
pub trait Display {
    /// Initialize the display
    fn init(&mut self) -> Result<(), Error>;

    /// Clear the display
    fn clear(&mut self) -> Result<(), Error>;

    /// Draw text with its top-left corner at the given position
    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: TextSize) -> Result<(), Error>;

    /// Update/flush the display (show the buffer)
    fn update(&mut self) -> Result<(), Error>;
}

/// Station-mode network link.
pub trait WifiLink {
    /// Configure credentials and start associating. Does not wait.
    fn begin(&mut self, credentials: &WifiCredentials) -> Result<(), Error>;

    /// Associated and holding an IPv4 lease.
    fn is_connected(&mut self) -> bool;

    /// Kick off a new association attempt. Does not wait.
    fn reconnect(&mut self) -> Result<(), Error>;

    fn local_ip(&self) -> Option<Ipv4Addr>;
}

/// An established broker session.
#[allow(async_fn_in_trait)]
pub trait Session {
    fn is_connected(&self) -> bool;

    /// Publish a single key/value telemetry point.
    async fn publish_telemetry(&mut self, key: &str, value: f32) -> Result<(), Error>;

    /// Service the protocol event loop once (keep-alive, inbound packets).
    async fn poll(&mut self) -> Result<(), Error>;
}

/// Broker connector. A session borrows the connector's buffers, so at most
/// one session exists at a time.
#[allow(async_fn_in_trait)]
pub trait Broker {
    type Session<'a>: Session
    where
        Self: 'a;

    async fn connect(&mut self, endpoint: &BrokerEndpoint) -> Result<Self::Session<'_>, Error>;
}
