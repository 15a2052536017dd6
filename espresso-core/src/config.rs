//! Laufzeit-Konfiguration der Verbindungs-Schleife

/// Parameter für exponentielles Backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Erste Wartezeit in Millisekunden
    pub initial_ms: u32,
    /// Obergrenze in Millisekunden
    pub max_ms: u32,
    /// Multiplikator pro Fehlversuch
    pub factor: u32,
}

impl BackoffConfig {
    pub const fn new(initial_ms: u32, max_ms: u32, factor: u32) -> Self {
        Self {
            initial_ms,
            max_ms,
            factor,
        }
    }
}

/// Konfiguration der Verbindungs-Schleife
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Backoff während auf den WLAN-Link gewartet wird
    pub link_backoff: BackoffConfig,
    /// Backoff nach fehlgeschlagenem Session-Aufbau oder Subscribe
    pub session_backoff: BackoffConfig,
    /// Pause am Ende jeder Iteration (gibt CPU an andere Tasks ab)
    pub idle_ms: u32,
    /// Maximale Anzahl RPC-Aufrufe pro Iteration
    pub max_drain: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            // 500 ms, dann verdoppeln bis 30 s
            link_backoff: BackoffConfig::new(500, 30_000, 2),
            session_backoff: BackoffConfig::new(1_000, 60_000, 2),
            idle_ms: 10,
            max_drain: 8,
        }
    }
}
