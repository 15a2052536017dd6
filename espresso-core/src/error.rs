//! Fehler-Typen der Verbindungs-Schleife
//!
//! Die Ursache wird als Enum mitgeführt, am Verhalten der Schleife ändert das nichts:
//! Fehler werden geloggt, die Iteration abgebrochen und später wiederholt.

/// WLAN-Link konnte nicht aufgebaut werden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Treiber konnte nicht konfiguriert oder gestartet werden
    Driver,
    /// Access Point hat die Assoziierung abgelehnt oder ist nicht erreichbar
    AssociationFailed,
}

/// Broker-Session konnte nicht geöffnet werden oder ist abgebrochen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// DNS-Auflösung fehlgeschlagen oder TCP-Verbindung abgelehnt
    Unreachable,
    /// Broker hat den Access Token abgelehnt
    Rejected,
    /// Transport-Fehler während einer laufenden Session
    Transport,
    /// Unerwartete oder ungültige Antwort des Brokers
    Protocol,
    /// Session ist nicht (mehr) verbunden
    NotConnected,
}

/// Registrierung eines RPC-Handlers fehlgeschlagen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubscribeError {
    /// Broker hat das Subscribe abgelehnt
    Rejected,
    /// Session während des Subscribes verloren
    Session(SessionError),
    /// Registry der aktiven Handler ist voll
    Capacity,
}

/// Fehler beim Kodieren/Dekodieren von Broker-Nachrichten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Topic passt nicht zum erwarteten Schema
    UnexpectedTopic,
    /// Request-ID im Topic ist keine Zahl
    InvalidRequestId,
    /// Payload ist kein gültiges JSON oder `method` fehlt
    MalformedPayload,
    /// Methodenname länger als erlaubt
    MethodTooLong,
    /// Payload passt nicht in den Puffer
    PayloadTooLarge,
}

/// Fehler beim Aufbau der Handler-Tabelle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// Handler-Name ist bereits vergeben
    DuplicateName,
    /// Tabelle ist voll
    Full,
}

/// Fehler beim Zugriff auf GPIOs innerhalb eines Sketches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    Gpio,
}

/// Gesamtfehler einer Schleifen-Iteration
///
/// Taxonomie: Link-, Session- und Subscription-Fehler werden identisch
/// behandelt. `Cancelled` beendet die Schleife.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopError {
    Link(LinkError),
    Session(SessionError),
    Subscribe(SubscribeError),
    Cancelled,
}

impl From<LinkError> for LoopError {
    fn from(err: LinkError) -> Self {
        LoopError::Link(err)
    }
}

impl From<SessionError> for LoopError {
    fn from(err: SessionError) -> Self {
        LoopError::Session(err)
    }
}

impl From<SubscribeError> for LoopError {
    fn from(err: SubscribeError) -> Self {
        LoopError::Subscribe(err)
    }
}

impl From<SessionError> for SubscribeError {
    fn from(err: SessionError) -> Self {
        SubscribeError::Session(err)
    }
}
