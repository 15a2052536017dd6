//! Pure Business Logic
//!
//! Backoff und Tasten-Entprellung ohne Hardware-Dependencies (testbar!)

use crate::config::BackoffConfig;

/// Exponentielles Backoff mit Obergrenze
///
/// # Beispiele
///
/// ```
/// # use espresso_core::{Backoff, BackoffConfig};
/// let mut backoff = Backoff::new(BackoffConfig::new(500, 2_000, 2));
/// assert_eq!(backoff.next_delay_ms(), 500);
/// assert_eq!(backoff.next_delay_ms(), 1_000);
/// assert_eq!(backoff.next_delay_ms(), 2_000);
/// assert_eq!(backoff.next_delay_ms(), 2_000); // gedeckelt
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    config: BackoffConfig,
    current_ms: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current_ms: config.initial_ms.min(config.max_ms),
        }
    }

    /// Nächste Wartezeit; erhöht die folgende um `factor` bis `max_ms`
    pub fn next_delay_ms(&mut self) -> u32 {
        let delay = self.current_ms;
        self.current_ms = self
            .current_ms
            .saturating_mul(self.config.factor.max(1))
            .min(self.config.max_ms);
        delay
    }

    /// Zurück auf die Start-Wartezeit (nach Erfolg)
    pub fn reset(&mut self) {
        self.current_ms = self.config.initial_ms.min(self.config.max_ms);
    }
}

/// Zähler-basierte Entprellung eines Tasters
///
/// Ein neuer Pegel wird erst übernommen, wenn er `threshold` aufeinander
/// folgende Abtastungen stabil anliegt.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    stable: bool,
    candidate: bool,
    count: u8,
    threshold: u8,
}

impl Debouncer {
    pub const fn new(initial: bool, threshold: u8) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            count: 0,
            threshold,
        }
    }

    /// Entprellter Pegel
    pub fn state(&self) -> bool {
        self.stable
    }

    /// Verarbeitet eine Abtastung
    ///
    /// Gibt `Some(neuer_pegel)` zurück wenn sich der entprellte Pegel ändert.
    pub fn update(&mut self, raw: bool) -> Option<bool> {
        if raw == self.stable {
            self.candidate = raw;
            self.count = 0;
            return None;
        }

        if raw != self.candidate {
            self.candidate = raw;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        if self.count >= self.threshold {
            self.stable = raw;
            self.count = 0;
            Some(raw)
        } else {
            None
        }
    }
}
