//! Host-side stand-ins for the node's hardware and network.

#![allow(dead_code)]

use core::net::Ipv4Addr;

use climate_node::config::{BrokerEndpoint, WifiCredentials};
use climate_node::traits::{Broker, ClimateSensor, Display, Session, TextSize, WifiLink};
use climate_node::Error;
use embedded_hal_async::delay::DelayNs;

/// Sensor that returns a scripted sequence of (temperature, humidity) pairs,
/// repeating the last one.
pub struct ScriptedSensor {
    samples: Vec<(f32, f32)>,
    next: usize,
    current: (f32, f32),
}

impl ScriptedSensor {
    pub fn new(samples: &[(f32, f32)]) -> Self {
        Self {
            samples: samples.to_vec(),
            next: 0,
            current: (f32::NAN, f32::NAN),
        }
    }
}

impl ClimateSensor for ScriptedSensor {
    // Humidity is read first each tick, so it advances the script.
    fn read_humidity(&mut self) -> f32 {
        if let Some(&sample) = self.samples.get(self.next) {
            self.current = sample;
            self.next += 1;
        }
        self.current.1
    }

    fn read_temperature(&mut self) -> f32 {
        self.current.0
    }
}

/// Display that keeps the text of the last completed frame.
#[derive(Default)]
pub struct ScreenLog {
    pub fail_init: bool,
    pub initialized: bool,
    pub drawing: Vec<String>,
    pub frame: Vec<String>,
    pub frames: usize,
}

impl Display for ScreenLog {
    fn init(&mut self) -> Result<(), Error> {
        if self.fail_init {
            return Err(Error::Display);
        }
        self.initialized = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.drawing.clear();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, _x: i32, _y: i32, _size: TextSize) -> Result<(), Error> {
        self.drawing.push(text.into());
        Ok(())
    }

    fn update(&mut self) -> Result<(), Error> {
        self.frame = self.drawing.clone();
        self.frames += 1;
        Ok(())
    }
}

/// WiFi link that is either always up or never comes up.
pub struct StaticWifi {
    pub up: bool,
    pub begun: u32,
    pub reconnects: u32,
}

impl StaticWifi {
    pub fn new(up: bool) -> Self {
        Self {
            up,
            begun: 0,
            reconnects: 0,
        }
    }
}

impl WifiLink for StaticWifi {
    fn begin(&mut self, _credentials: &WifiCredentials) -> Result<(), Error> {
        self.begun += 1;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.up
    }

    fn reconnect(&mut self) -> Result<(), Error> {
        self.reconnects += 1;
        Ok(())
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.up.then(|| Ipv4Addr::new(10, 0, 0, 7))
    }
}

/// Broker that accepts every connection and records published points.
#[derive(Default)]
pub struct RecordingBroker {
    pub refuse: bool,
    pub published: Vec<(String, f32)>,
}

pub struct RecordingSession<'a> {
    broker: &'a mut RecordingBroker,
}

impl Broker for RecordingBroker {
    type Session<'a>
        = RecordingSession<'a>
    where
        Self: 'a;

    async fn connect(
        &mut self,
        _endpoint: &BrokerEndpoint,
    ) -> Result<RecordingSession<'_>, Error> {
        if self.refuse {
            return Err(Error::MqttConnect(0x86));
        }
        Ok(RecordingSession { broker: self })
    }
}

impl Session for RecordingSession<'_> {
    fn is_connected(&self) -> bool {
        true
    }

    async fn publish_telemetry(&mut self, key: &str, value: f32) -> Result<(), Error> {
        self.broker.published.push((key.into(), value));
        Ok(())
    }

    async fn poll(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Delay that returns immediately and adds up what was asked for.
#[derive(Default)]
pub struct ClockDelay {
    pub elapsed_ms: u64,
}

impl DelayNs for ClockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ms += u64::from(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms += u64::from(ms);
    }
}
