#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;

use climate_node::{
    Reading, dht,
    display::Oled,
    hardware::{Dht11Hardware, SSD1306Hardware},
    logic::{boot_display, format_value, render_reading},
    thingsboard::telemetry_payload,
    traits::ClimateSensor,
};

esp_bootloader_esp_idf::esp_app_desc!();

/// Pass/fail tally, printed as it goes.
#[derive(Default)]
struct TestResults {
    passed: u32,
    failed: u32,
}

impl TestResults {
    fn record(&mut self, ok: bool, name: &str) -> bool {
        if ok {
            self.passed += 1;
            esp_println::println!("  ✓ {}", name);
        } else {
            self.failed += 1;
            esp_println::println!("  ✗ {} FAILED", name);
        }
        ok
    }

    fn assert(&mut self, condition: bool, name: &str) {
        self.record(condition, name);
    }

    fn assert_eq<T: PartialEq + core::fmt::Debug>(&mut self, left: T, right: T, name: &str) {
        if !self.record(left == right, name) {
            esp_println::println!("      left:  {:?}\n      right: {:?}", left, right);
        }
    }

    fn print_summary(&self) {
        esp_println::println!("\n==========================================");
        esp_println::println!(
            "{} passed, {} failed, {} total",
            self.passed,
            self.failed,
            self.passed + self.failed
        );
        if self.failed == 0 {
            esp_println::println!("✓ ALL TESTS PASSED");
        } else {
            esp_println::println!("✗ SOME TESTS FAILED");
        }
        esp_println::println!("==========================================");
    }
}

fn test_logic(results: &mut TestResults) {
    esp_println::println!("\n[TEST] Logic Tests");

    results.assert(
        Reading::from_raw(f32::NAN, 50.0).is_none(),
        "NaN temperature rejected",
    );
    results.assert(
        Reading::from_raw(21.0, f32::NAN).is_none(),
        "NaN humidity rejected",
    );
    results.assert_eq(
        format_value(24.5, "C").as_str(),
        "24.50 C",
        "value formatting",
    );

    let decoded = dht::decode(&[60, 0, 24, 5, 89]);
    results.assert(decoded.is_ok(), "DHT11 frame decodes");
    results.assert(
        dht::decode(&[60, 0, 24, 5, 0]).is_err(),
        "DHT11 checksum enforced",
    );

    match telemetry_payload("temperature", 24.5) {
        Ok(p) => results.assert_eq(p.as_str(), "{\"temperature\":24.5}", "telemetry payload"),
        Err(_) => results.assert(false, "telemetry payload"),
    }
}

async fn test_dht11_sensor(results: &mut TestResults, sensor: &mut Dht11Hardware<'static>) {
    esp_println::println!("\n[TEST] DHT11 Sensor Tests");

    // The sensor caches a sample for 2 s, so space the reads out.
    esp_println::println!("  Reading climate (3 samples)...");
    let mut readings = heapless::Vec::<Reading, 3>::new();
    for i in 0..3 {
        Timer::after(Duration::from_millis(2_100)).await;
        let humidity = sensor.read_humidity();
        let temperature = sensor.read_temperature();
        match Reading::from_raw(temperature, humidity) {
            Some(r) => {
                esp_println::println!(
                    "    Sample {}: {:.1}°C {:.1}%",
                    i + 1,
                    r.temperature,
                    r.humidity
                );
                let _ = readings.push(r);
            }
            None => esp_println::println!("    Sample {}: read failed", i + 1),
        }
    }

    results.assert_eq(readings.len(), 3, "collected 3 samples");

    // DHT11 operating range: 0-50 °C, 20-90 %RH
    for r in readings.iter() {
        results.assert(
            r.temperature >= 0.0 && r.temperature <= 50.0,
            "temperature in DHT11 range",
        );
        results.assert(
            r.humidity >= 20.0 && r.humidity <= 90.0,
            "humidity in DHT11 range",
        );
    }

    if readings.len() == 3 {
        let min = readings.iter().fold(f32::INFINITY, |a, r| a.min(r.temperature));
        let max = readings.iter().fold(f32::NEG_INFINITY, |a, r| a.max(r.temperature));
        results.assert(max - min < 2.0, "temperature readings stable (within 2°C)");
    }
}

fn test_display(results: &mut TestResults, display: &mut Oled<'static>) {
    esp_println::println!("\n[TEST] SSD1306 Display Tests");

    results.assert(boot_display(display).is_ok(), "display init");

    let sample = Reading {
        temperature: 24.5,
        humidity: 60.0,
    };
    results.assert(render_reading(display, &sample).is_ok(), "render reading");
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::println!("\n==========================================");
    esp_println::println!("=== Hardware Unit Test Runner ===");
    esp_println::println!("==========================================");

    let mut results = TestResults::default();

    // Run tests that don't need hardware
    test_logic(&mut results);

    // Initialize RTOS timer for embassy (this consumes TIMG0)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Run hardware tests
    match SSD1306Hardware::new(peripherals.I2C0, peripherals.GPIO11, peripherals.GPIO12) {
        Ok(hw) => {
            let mut display = Oled::new(hw);
            test_display(&mut results, &mut display);
        }
        Err(_) => results.assert(false, "I2C bus setup"),
    }

    let mut sensor = Dht11Hardware::new(peripherals.GPIO6);
    test_dht11_sensor(&mut results, &mut sensor).await;

    // Print summary
    results.print_summary();

    esp_println::println!("\nTest run complete. Looping...");
    loop {
        Timer::after(Duration::from_millis(1000)).await;
    }
}
