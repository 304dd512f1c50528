//! Business logic layer (hardware-independent)
//!
//! The telemetry side of the node: read the sensor, draw the screen and hand
//! valid readings to the connectivity task.

use core::fmt::Write;

use embedded_hal_async::delay::DelayNs;
use heapless::String;
use log::{info, warn};

use crate::config::{Config, delay_ms};
use crate::error::Error;
use crate::handoff::Handoff;
use crate::model::Reading;
use crate::traits::{ClimateSensor, Display, TextSize};

pub const SENSOR_ERROR_TEXT: &str = "Sensor Error!";

/// What a single telemetry tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Either value was NaN; nothing was offered for publication.
    SensorFault,
    /// Reading shown and offered to the broker session.
    Queued(Reading),
    /// Reading shown, but no broker session was up.
    Skipped(Reading),
}

/// Bring the display up blank. Any failure here is fatal to the caller.
pub fn boot_display<D: Display>(display: &mut D) -> Result<(), Error> {
    display.init()?;
    display.clear()?;
    display.update()
}

/// Format a value the way it appears on screen, e.g. `24.50 C`.
pub fn format_value(value: f32, unit: &str) -> String<16> {
    let mut buffer = String::new();
    let _ = write!(buffer, "{value:.2} {unit}");
    buffer
}

/// Draw both values with their labels.
pub fn render_reading<D: Display>(display: &mut D, reading: &Reading) -> Result<(), Error> {
    display.clear()?;
    display.draw_text("Temperature:", 0, 0, TextSize::Small)?;
    display.draw_text(
        format_value(reading.temperature, "C").as_str(),
        0,
        16,
        TextSize::Large,
    )?;
    display.draw_text("Humidity:", 0, 40, TextSize::Small)?;
    display.draw_text(
        format_value(reading.humidity, "%").as_str(),
        0,
        48,
        TextSize::Large,
    )?;
    display.update()
}

pub fn render_sensor_error<D: Display>(display: &mut D) -> Result<(), Error> {
    display.clear()?;
    display.draw_text(SENSOR_ERROR_TEXT, 0, 0, TextSize::Small)?;
    display.update()
}

/// One pass of the telemetry loop.
///
/// Humidity is read before temperature so a driver that caches one
/// transaction serves both values from the same sample.
pub fn tick<S: ClimateSensor, D: Display>(
    sensor: &mut S,
    display: &mut D,
    handoff: &Handoff,
) -> Tick {
    let humidity = sensor.read_humidity();
    let temperature = sensor.read_temperature();

    let Some(reading) = Reading::from_raw(temperature, humidity) else {
        warn!("telemetry: failed to read from sensor");
        if let Err(e) = render_sensor_error(display) {
            warn!("telemetry: display update failed: {e}");
        }
        return Tick::SensorFault;
    };

    info!(
        "telemetry: temperature={:.2} C, humidity={:.2} %",
        reading.temperature, reading.humidity
    );
    if let Err(e) = render_reading(display, &reading) {
        warn!("telemetry: display update failed: {e}");
    }

    if handoff.broker_up() {
        handoff.offer(reading);
        Tick::Queued(reading)
    } else {
        info!("telemetry: not connected to broker, skipping send");
        Tick::Skipped(reading)
    }
}

/// Telemetry task body. Never returns.
pub async fn run_telemetry<S, D, P>(
    sensor: &mut S,
    display: &mut D,
    handoff: &Handoff,
    config: &Config,
    delay: &mut P,
) -> !
where
    S: ClimateSensor,
    D: Display,
    P: DelayNs,
{
    let interval_ms = delay_ms(config.timing.telemetry_interval);
    loop {
        tick(sensor, display, handoff);
        delay.delay_ms(interval_ms).await;
    }
}
