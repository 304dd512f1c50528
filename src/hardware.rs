use embassy_time::{Duration, Instant};
use esp_hal::gpio::AnyPin;
use esp_hal::{
    delay::Delay,
    gpio::{DriveMode, Flex, OutputConfig, Pull},
    i2c::master::{Config as I2cConfig, I2c},
    peripherals::I2C0,
    time::{Instant as CycleInstant, Rate},
};
use log::{debug, warn};

use crate::dht::{self, Frame, Measurement};
use crate::error::{Error, SensorError};
use crate::traits::ClimateSensor;

const I2C_FREQ_KHZ: u32 = 400;

/// The DHT11 needs at least 1 s between conversions; 2 s keeps it stable.
const DHT_MIN_SAMPLE_INTERVAL_MS: u64 = 2_000;
/// Start signal: hold the line low for at least 18 ms.
const DHT_START_LOW_MS: u32 = 20;
/// Longest any single level lasts in a healthy transaction (80 µs nominal).
const DHT_PULSE_TIMEOUT_US: u64 = 200;

pub struct SSD1306Hardware<'a> {
    pub i2c: I2c<'a, esp_hal::Blocking>,
}

impl<'a> SSD1306Hardware<'a> {
    pub fn new<SDA, SCL>(i2c_periph: I2C0<'a>, sda: SDA, scl: SCL) -> Result<Self, Error>
    where
        SDA: Into<AnyPin<'a>>,
        SCL: Into<AnyPin<'a>>,
    {
        let i2c = I2c::new(
            i2c_periph,
            I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQ_KHZ)),
        )
        .map_err(|_| Error::Display)?
        .with_sda(sda.into())
        .with_scl(scl.into());

        Ok(Self { i2c })
    }
}

/// Bit-banged DHT11 on a single open-drain line.
pub struct Dht11Hardware<'a> {
    pin: Flex<'a>,
    delay: Delay,
    last: Option<(Instant, Result<Measurement, SensorError>)>,
}

impl<'a> Dht11Hardware<'a> {
    pub fn new<DAT>(data_gpio: DAT) -> Self
    where
        DAT: Into<AnyPin<'a>>,
    {
        let mut pin = Flex::new(data_gpio.into());
        pin.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        pin.set_high();
        pin.set_output_enable(true);
        pin.set_input_enable(true);

        Self {
            pin,
            delay: Delay::new(),
            last: None,
        }
    }

    /// Run one transaction and return the raw frame.
    pub fn read_frame(&mut self) -> Result<Frame, SensorError> {
        self.pin.set_low();
        self.delay.delay_millis(DHT_START_LOW_MS);

        // The bit timing must not be stretched by interrupts.
        critical_section::with(|_| {
            self.pin.set_high();
            let this = &*self;
            dht::capture_frame(|high| this.pulse_width(high))
        })
    }

    /// Time, in µs, the line stays at `high`.
    fn pulse_width(&self, high: bool) -> Result<u32, SensorError> {
        let start = CycleInstant::now();
        while self.pin.is_high() == high {
            if start.elapsed().as_micros() > DHT_PULSE_TIMEOUT_US {
                return Err(SensorError::Timeout);
            }
        }
        Ok(start.elapsed().as_micros() as u32)
    }

    /// Latest measurement, reusing a recent one so a humidity read followed
    /// by a temperature read costs a single transaction.
    fn sample(&mut self) -> Result<Measurement, SensorError> {
        if let Some((at, result)) = self.last
            && at.elapsed() < Duration::from_millis(DHT_MIN_SAMPLE_INTERVAL_MS)
        {
            return result;
        }

        let result = self.read_frame().and_then(|frame| dht::decode(&frame));
        match &result {
            Ok(m) => debug!("[DHT11] {:.1} C {:.1} %", m.temperature, m.humidity),
            Err(e) => warn!("[DHT11] read failed: {e}"),
        }
        self.last = Some((Instant::now(), result));
        result
    }
}

impl ClimateSensor for Dht11Hardware<'_> {
    fn read_temperature(&mut self) -> f32 {
        self.sample().map_or(f32::NAN, |m| m.temperature)
    }

    fn read_humidity(&mut self) -> f32 {
        self.sample().map_or(f32::NAN, |m| m.humidity)
    }
}
