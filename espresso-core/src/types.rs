//! Core Types für die Broker-Anbindung
//!
//! Datenstrukturen ohne Hardware-Dependencies

use heapless::String;

/// Maximale Länge eines RPC-Methodennamens
pub const METHOD_NAME_LEN: usize = 32;

/// Standard-Port des Brokers (MQTT unverschlüsselt)
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Verbindungszustand der Schleife
///
/// Wird ausschließlich durch Polling von Link und Session verändert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityState {
    Disconnected,
    LinkUp,
    SessionEstablished,
    SessionSubscribed,
}

/// Parameter für den Aufbau einer Broker-Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams<'a> {
    /// Hostname oder IP-Adresse des Brokers
    pub server: &'a str,
    /// Device Access Token (wird als MQTT-Username übertragen)
    pub token: &'a str,
    /// Optionaler Port, sonst [`DEFAULT_BROKER_PORT`]
    pub port: Option<u16>,
}

impl<'a> SessionParams<'a> {
    pub const fn new(server: &'a str, token: &'a str) -> Self {
        Self {
            server,
            token,
            port: None,
        }
    }

    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Effektiver Port (Fallback auf 1883)
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_BROKER_PORT)
    }
}

/// Wert eines RPC-Parameters oder einer RPC-Antwort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RpcValue {
    /// Kein oder nicht unterstützter Parameter (`{}`, `null`, Strings, ...)
    None,
    Bool(bool),
    Int(i64),
}

impl RpcValue {
    /// Wahrheitswert für GPIO-Pegel: `data ? HIGH : LOW`
    pub fn is_truthy(self) -> bool {
        match self {
            RpcValue::None => false,
            RpcValue::Bool(b) => b,
            RpcValue::Int(n) => n != 0,
        }
    }
}

impl From<bool> for RpcValue {
    fn from(value: bool) -> Self {
        RpcValue::Bool(value)
    }
}

/// Eingehender RPC-Aufruf (bereits aus Topic und Payload dekodiert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    /// Request-ID aus dem Topic `v1/devices/me/rpc/request/{id}`
    pub id: u32,
    pub method: String<METHOD_NAME_LEN>,
    pub params: RpcValue,
}

/// Kanal, über den ein Messwert veröffentlicht wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    /// Zeitreihen-Werte (z.B. `temperature`)
    Telemetry,
    /// Diskrete Gerätezustände (z.B. `led`)
    Attribute,
}

/// Veröffentlichter Wert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Bool(bool),
    Int(i32),
}

/// Ein einzelner Messwert mit festem Schlüssel
///
/// Die Schlüssel (`temperature`, `led`, ...) sind Teil des externen Vertrags
/// mit dem Dashboard und dürfen nicht verändert werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub kind: ReportKind,
    pub key: &'static str,
    pub value: Value,
}

impl Reading {
    pub const fn telemetry(key: &'static str, value: Value) -> Self {
        Self {
            kind: ReportKind::Telemetry,
            key,
            value,
        }
    }

    pub const fn attribute(key: &'static str, value: Value) -> Self {
        Self {
            kind: ReportKind::Attribute,
            key,
            value,
        }
    }
}

/// Messwert eines Klima-Sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClimateReading {
    /// Temperatur in °C
    pub temperature: i32,
    /// Relative Luftfeuchtigkeit in %
    pub humidity: i32,
}
