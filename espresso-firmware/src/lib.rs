// Library-Root: Board-Bring-up, WLAN-Link, Broker-Client und Sensoren
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod board;
pub mod config;
pub mod hal;
pub mod net;

// Re-exports für die Sketch-Binaries
pub use hal::SimulatedClimate;
pub use net::{TbBroker, TbSession, WifiLink};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Shutdown-Signal der Schleife
///
/// Auf dem Gerät wird es nie ausgelöst; die Schleife läuft bis zum Reset.
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ()>;
