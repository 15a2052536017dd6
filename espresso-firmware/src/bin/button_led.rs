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

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

use espresso_core::{ButtonLed, LoopConfig, Runtime};
use espresso32::config::{BUTTON_DEBOUNCE_POLLS, TB_SESSION};
use espresso32::{ShutdownSignal, board};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
esp_bootloader_esp_idf::esp_app_desc!();

static SHUTDOWN: ShutdownSignal = ShutdownSignal::new();

/// Sketch 2: LED + Taster
///
/// Ein Druck auf den BOOT-Taster schaltet die LED um. Zustand von LED und
/// Taster wird als Attribute `led` und `button` gemeldet.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    let network = board::start_network(
        &spawner,
        peripherals.TIMG0,
        peripherals.SW_INTERRUPT,
        peripherals.WIFI,
    );

    // LED an GPIO15, BOOT-Taster an GPIO9 (low-aktiv, interner Pull-Up)
    let led = Output::new(peripherals.GPIO15, Level::Low, OutputConfig::default());
    let button = Input::new(
        peripherals.GPIO9,
        InputConfig::default().with_pull(Pull::Up),
    );
    let sketch =
        ButtonLed::new(led, button, true, BUTTON_DEBOUNCE_POLLS).expect("Failed to drive LED pin");

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
