//! Hardware Abstraction Traits
//!
//! Diese Traits definieren die externen Kollaborateure der Schleife
//! (WLAN-Treiber, Broker-Client, Sensoren) ohne konkrete Implementierung.
//! GPIOs werden direkt über die `embedded-hal` Digital-Traits angesprochen.
//!
//! # Implementierungen
//! - **Production:** `WifiLink`, `TbBroker`, `SimulatedClimate` (espresso-firmware)
//! - **Testing:** Mocks in espresso-tests

use crate::error::{LinkError, SessionError, SubscribeError};
use crate::types::{ClimateReading, RpcRequest, SessionParams};

/// Trait für den Netzwerk-Link (WLAN-Assoziierung)
#[allow(async_fn_in_trait)]
pub trait Link {
    /// Meldet ob der Link benutzbar ist (assoziiert und IP konfiguriert)
    fn is_up(&self) -> bool;

    /// Startet bzw. wiederholt die Assoziierung mit dem Access Point
    ///
    /// Kehrt zurück sobald der Versuch abgeschlossen ist. Ein `Ok` garantiert
    /// noch keinen benutzbaren Link (DHCP kann noch laufen), daher prüft der
    /// Aufrufer danach erneut [`Link::is_up`].
    async fn join(&mut self) -> Result<(), LinkError>;
}

/// Trait für eine offene Broker-Session
///
/// Eine Session lebt genau so lange wie die zugrunde liegende Verbindung.
/// Subscriptions überleben einen Session-Wechsel nicht.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// `false` sobald die Verbindung verloren wurde
    fn is_connected(&self) -> bool;

    /// Abonniert einen Topic-Filter
    async fn subscribe(&mut self, filter: &str) -> Result<(), SubscribeError>;

    /// Veröffentlicht eine Nachricht (QoS 0)
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError>;

    /// Pumpt eingehende Nachrichten
    ///
    /// Liefert `Ok(None)` wenn in diesem Zeitfenster kein RPC-Aufruf vorlag.
    /// Nachrichten auf anderen Topics werden verworfen.
    async fn poll(&mut self) -> Result<Option<RpcRequest>, SessionError>;
}

/// Trait für den Broker-Client
#[allow(async_fn_in_trait)]
pub trait Broker {
    /// Session-Typ, leiht sich Puffer und Socket vom Client
    type Session<'s>: Session
    where
        Self: 's;

    /// Öffnet eine neue Session mit (Server, Token, optionaler Port)
    async fn open(
        &mut self,
        params: &SessionParams<'static>,
    ) -> Result<Self::Session<'_>, SessionError>;
}

/// Trait für Temperatur/Luftfeuchte-Sensoren
pub trait ClimateSensor {
    /// Liefert einen neuen Messwert oder `None` wenn (noch) keiner vorliegt
    fn read(&mut self) -> Option<ClimateReading>;
}
