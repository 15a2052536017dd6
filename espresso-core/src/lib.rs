//! Espresso Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert die Traits der externen Kollaborateure (WLAN, Broker,
//! Sensoren), das Broker-Protokoll, die Sketch-Varianten und die
//! Verbindungs- und Dispatch-Schleife.

#![no_std]

// Muss vor den anderen Modulen stehen (Logging-Makros)
#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod logic;
pub mod protocol;
pub mod report;
pub mod rpc;
pub mod runtime;
pub mod sketches;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use config::{BackoffConfig, LoopConfig};
pub use error::{
    DeviceError, LinkError, LoopError, ProtocolError, SessionError, SubscribeError, TableError,
};
pub use logic::{Backoff, Debouncer};
pub use report::{ChangeTracker, Readings};
pub use rpc::{HandlerTable, RpcRegistry};
pub use runtime::{LoopContext, LoopStats, Runtime, ensure_link};
pub use sketches::{ButtonLed, GpioOutput, OutputHandler, RelayClimate, RpcLed, Sketch};
pub use traits::{Broker, ClimateSensor, Link, Session};
pub use types::{
    ClimateReading, ConnectivityState, Reading, ReportKind, RpcRequest, RpcValue, SessionParams,
    Value,
};
