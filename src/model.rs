// Model of the data read in this app

/// Telemetry key for the temperature value.
pub const TEMPERATURE_KEY: &str = "temperature";
/// Telemetry key for the relative humidity value.
pub const HUMIDITY_KEY: &str = "humidity";

/// One valid measurement. Only ever built from two non-NaN values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Percent relative humidity.
    pub humidity: f32,
}

impl Reading {
    /// Returns `None` when either raw value is the NaN sentinel.
    pub fn from_raw(temperature: f32, humidity: f32) -> Option<Self> {
        if temperature.is_nan() || humidity.is_nan() {
            None
        } else {
            Some(Self {
                temperature,
                humidity,
            })
        }
    }

    /// Key/value pairs in publication order.
    pub fn points(&self) -> [(&'static str, f32); 2] {
        [
            (TEMPERATURE_KEY, self.temperature),
            (HUMIDITY_KEY, self.humidity),
        ]
    }
}
