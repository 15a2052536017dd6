// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

use espresso_core::SessionParams;
use espresso_core::types::DEFAULT_BROKER_PORT;

// ============================================================================
// GPIO Konfiguration
// ============================================================================

/// GPIO-Pin für die LED (rpc-led, button-led)
pub const LED_GPIO_PIN: u8 = 15;

/// GPIO-Pin für den Taster (BOOT-Taster, low-aktiv)
pub const BUTTON_GPIO_PIN: u8 = 9;

/// Anzahl stabiler Abtastungen bis ein Tastendruck zählt
/// Bei 10 ms Idle-Pause entspricht das ~30 ms Entprellzeit
pub const BUTTON_DEBOUNCE_POLLS: u8 = 3;

/// GPIO-Pin für das Relais (relay-climate, low-aktiv)
pub const RELAY_GPIO_PIN: u8 = 4;

/// GPIO-Pin für den Rückmelde-Eingang des Relais
pub const FEEDBACK_GPIO_PIN: u8 = 5;

/// Abtast-Intervall des Klima-Sensors in Sekunden
pub const SENSOR_INTERVAL_SECS: u64 = 10;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Maximale Wartezeit auf DHCP nach erfolgreicher Assoziierung
pub const DHCP_TIMEOUT_SECS: u64 = 10;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// Gesamt-Heap: ~100 KB für WiFi-Stack

// ============================================================================
// Broker Konfiguration (ThingsBoard)
// ============================================================================

/// Broker Hostname oder IP-Adresse
/// Wird zur Build-Zeit aus der Environment Variable TB_SERVER geladen
pub const TB_SERVER: &str = env!(
    "TB_SERVER",
    "TB_SERVER nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Device Access Token (wird als MQTT-Username gesendet)
/// Wird zur Build-Zeit aus der Environment Variable TB_TOKEN geladen
pub const TB_TOKEN: &str = env!(
    "TB_TOKEN",
    "TB_TOKEN nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Broker Port
/// Optional über TB_PORT, sonst Standard-MQTT-Port 1883
pub const TB_PORT: u16 = match option_env!("TB_PORT") {
    Some(port) => parse_port(port),
    None => DEFAULT_BROKER_PORT,
};

/// MQTT Client ID
/// Optional über TB_CLIENT_ID (ThingsBoard identifiziert das Gerät über den Token)
pub const TB_CLIENT_ID: &str = match option_env!("TB_CLIENT_ID") {
    Some(id) => id,
    None => "espresso32",
};

/// Verbindungsparameter für die Schleife (Server, Token, Port)
pub const TB_SESSION: SessionParams<'static> =
    SessionParams::new(TB_SERVER, TB_TOKEN).with_port(TB_PORT);

/// Maximale Größe eines MQTT-Pakets in Bytes (Senden und Empfangen)
/// Zu kleine Werte: Nachrichten werden verworfen
pub const MAX_MESSAGE_SIZE: usize = 256;

/// MQTT Keep-Alive in Sekunden
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;

/// TCP Buffer-Größen in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// TCP Socket Timeout in Sekunden
pub const TCP_TIMEOUT_SECS: u64 = 10;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

/// Parst einen Port zur Compile-Zeit
///
/// Ungültige Werte brechen den Build ab.
const fn parse_port(value: &str) -> u16 {
    let bytes = value.as_bytes();
    assert!(!bytes.is_empty(), "TB_PORT ist leer");

    let mut port: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        assert!(digit.is_ascii_digit(), "TB_PORT ist keine Zahl");
        port = port * 10 + (digit - b'0') as u32;
        assert!(port <= u16::MAX as u32, "TB_PORT ist zu groß");
        i += 1;
    }
    port as u16
}
