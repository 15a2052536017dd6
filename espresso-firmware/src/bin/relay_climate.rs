// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};

// ESP32-C6 HAL
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

use espresso_core::{LoopConfig, RelayClimate, Runtime};
use espresso32::config::{SENSOR_INTERVAL_SECS, TB_SESSION};
use espresso32::{ShutdownSignal, SimulatedClimate, board};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
esp_bootloader_esp_idf::esp_app_desc!();

static SHUTDOWN: ShutdownSignal = ShutdownSignal::new();

/// Sketch 3: Relais (low-aktiv) + Klima-Telemetrie
///
/// `setValue(true)` zieht den Relais-Pin auf HIGH, gemeldet wird
/// `value = !pin`. Dazu `ext_value` (Rückmelde-Eingang), `temperature` und
/// `humidity` als Telemetrie.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    let network = board::start_network(
        &spawner,
        peripherals.TIMG0,
        peripherals.SW_INTERRUPT,
        peripherals.WIFI,
    );

    // Relais an GPIO4 (startet LOW), Rückmeldung an GPIO5
    let relay = Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default());
    let feedback = Input::new(
        peripherals.GPIO5,
        InputConfig::default().with_pull(Pull::Down),
    );
    let sensor = SimulatedClimate::new(Rng::new(), Duration::from_secs(SENSOR_INTERVAL_SECS));
    let sketch = RelayClimate::new(relay, feedback, sensor).expect("Failed to drive relay pin");

    let mut runtime = Runtime::new(
        network.link,
        network.broker,
        sketch,
        Delay,
        &SHUTDOWN,
        TB_SESSION,
        LoopConfig::default(),
    )
    .expect("Invalid RPC handler table");
    runtime.run().await;

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
