//! WiFi bring-up check.
//!
//! Associates with the configured network using the same bounded routine as
//! the firmware, prints the DHCP address, then resolves the broker host.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use embassy_time::{Delay, Duration, Instant, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiDevice;
use static_cell::StaticCell;

use climate_node::{
    Config,
    net::{init_wifi, resolve},
    supervisor::Supervisor,
    traits::WifiLink,
};

static CONFIG: Config = Config::compiled();
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

async fn idle() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    esp_println::println!("\n=== WiFi Test ===");

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    if let Err(e) = CONFIG.validate() {
        esp_println::println!("[ERROR] {}", e);
        idle().await
    }
    esp_println::println!("SSID: {}", CONFIG.wifi.ssid);

    let radio = match esp_radio::init() {
        Ok(radio) => RADIO.init(radio),
        Err(e) => {
            esp_println::println!("[ERROR] esp_radio init failed: {:?}", e);
            idle().await
        }
    };

    let resources = STACK_RESOURCES.init(StackResources::new());
    let (mut wifi, runner) =
        match init_wifi(radio, peripherals.WIFI, resources, Instant::now().as_ticks()) {
            Ok(parts) => parts,
            Err(e) => {
                esp_println::println!("[ERROR] {}", e);
                idle().await
            }
        };
    if let Err(e) = spawner.spawn(net_task(runner)) {
        esp_println::println!("[ERROR] Failed to spawn net task: {:?}", e);
        idle().await
    }

    let mut supervisor = Supervisor::new(&CONFIG);
    let started = Instant::now();
    if !supervisor.associate(&mut wifi, &mut Delay).await {
        esp_println::println!("✗ Not associated after {} ms", started.elapsed().as_millis());
        idle().await
    }

    match wifi.local_ip() {
        Some(ip) => esp_println::println!(
            "✓ Associated in {} ms, IP {}",
            started.elapsed().as_millis(),
            ip
        ),
        None => esp_println::println!("✗ Associated but no DHCP lease"),
    }

    match resolve(wifi.stack(), CONFIG.broker.host).await {
        Ok(address) => esp_println::println!(
            "✓ {} resolves to {}",
            CONFIG.broker.host,
            address
        ),
        Err(e) => esp_println::println!("✗ {}: {}", CONFIG.broker.host, e),
    }

    esp_println::println!("\nWiFi test complete.");
    idle().await
}
