#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use embassy_time::{Delay, Duration, Instant, Timer};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiDevice;
use log::warn;
use static_cell::StaticCell;

use climate_node::{
    Config, Handoff,
    config::SERIAL_DEBUG_BAUD,
    display::Oled,
    hardware::{Dht11Hardware, SSD1306Hardware},
    logic::{boot_display, run_telemetry},
    net::{EspWifi, ThingsBoardBroker, init_wifi},
    supervisor::Supervisor,
};

/// Let the DHT11 settle after power-up before the first transaction.
const SENSOR_WARMUP_MS: u64 = 1_000;

static CONFIG: Config = Config::compiled();
static HANDOFF: Handoff = Handoff::new();

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static BROKER: StaticCell<ThingsBoardBroker> = StaticCell::new();

esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Sole owner of the sensor and the display.
#[embassy_executor::task]
async fn telemetry_task(mut sensor: Dht11Hardware<'static>, mut display: Oled<'static>) -> ! {
    run_telemetry(&mut sensor, &mut display, &HANDOFF, &CONFIG, &mut Delay).await
}

/// Sole owner of the WiFi link and the broker session.
#[embassy_executor::task]
async fn connectivity_task(mut wifi: EspWifi, broker: &'static mut ThingsBoardBroker) -> ! {
    let mut supervisor = Supervisor::new(&CONFIG);
    supervisor.associate(&mut wifi, &mut Delay).await;
    supervisor
        .run(&mut wifi, broker, &HANDOFF, &mut Delay)
        .await
}

async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    esp_println::println!("=== Climate Node === (console {} baud)", SERIAL_DEBUG_BAUD);

    // Initialize RTOS timer for embassy
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    Timer::after(Duration::from_millis(SENSOR_WARMUP_MS)).await;
    let sensor = Dht11Hardware::new(peripherals.GPIO6);

    // Without a display the node is useless: stop here, before any task runs.
    let mut display = match SSD1306Hardware::new(peripherals.I2C0, peripherals.GPIO11, peripherals.GPIO12) {
        Ok(hw) => Oled::new(hw),
        Err(e) => {
            esp_println::println!("[ERROR] I2C setup failed: {}", e);
            halt().await
        }
    };
    if let Err(e) = boot_display(&mut display) {
        esp_println::println!("[ERROR] SSD1306 allocation failed: {}", e);
        halt().await
    }

    if let Err(e) = CONFIG.validate() {
        warn!("config: {e}; the broker will stay unreachable");
    }

    if let Err(e) = spawner.spawn(telemetry_task(sensor, display)) {
        esp_println::println!("[ERROR] Failed to spawn telemetry task: {:?}", e);
    }

    let radio = match esp_radio::init() {
        Ok(radio) => RADIO.init(radio),
        Err(e) => {
            esp_println::println!("[ERROR] esp_radio init failed: {:?}", e);
            halt().await
        }
    };

    let resources = STACK_RESOURCES.init(StackResources::new());
    match init_wifi(radio, peripherals.WIFI, resources, Instant::now().as_ticks()) {
        Ok((wifi, runner)) => {
            let broker = BROKER.init(ThingsBoardBroker::new(wifi.stack()));
            if let Err(e) = spawner.spawn(net_task(runner)) {
                esp_println::println!("[ERROR] Failed to spawn net task: {:?}", e);
            }
            if let Err(e) = spawner.spawn(connectivity_task(wifi, broker)) {
                esp_println::println!("[ERROR] Failed to spawn connectivity task: {:?}", e);
            }
        }
        Err(e) => esp_println::println!("[ERROR] WiFi bring-up failed: {}", e),
    }

    halt().await
}
