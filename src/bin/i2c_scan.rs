//! I2C bus scan for the display bus.
//!
//! Probes every 7-bit address on I2C0 (SDA => GPIO11, SCL => GPIO12) and
//! reports whether the SSD1306 answered at its configured address.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    i2c::master::{Config, I2c},
    time::Rate,
    timer::timg::TimerGroup,
};

use climate_node::config::DISPLAY_I2C_ADDRESS;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let mut i2c0 = match I2c::new(
        peripherals.I2C0,
        Config::default().with_frequency(Rate::from_khz(400)),
    ) {
        Ok(i2c) => i2c
            .with_sda(peripherals.GPIO11)
            .with_scl(peripherals.GPIO12)
            .into_async(),
        Err(e) => {
            esp_println::println!("[ERROR] I2C config rejected: {:?}", e);
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };

    esp_println::println!("I2C scan start");
    let mut found = 0u32;
    let mut display_present = false;
    for address in 0x03u8..0x78 {
        let mut buf = [0u8; 1];
        if i2c0.write_read_async(address, &[], &mut buf).await.is_ok() {
            esp_println::println!("Found device at address 0x{:02X}", address);
            found += 1;
            display_present |= address == DISPLAY_I2C_ADDRESS;
        }
    }
    esp_println::println!("I2C scan done: {} device(s)", found);

    if display_present {
        esp_println::println!("SSD1306 present at 0x{:02X}", DISPLAY_I2C_ADDRESS);
    } else {
        esp_println::println!("SSD1306 NOT found at 0x{:02X}", DISPLAY_I2C_ADDRESS);
    }

    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
