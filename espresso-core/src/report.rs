//! Änderungs-Erkennung für Telemetrie und Attribute
//!
//! Es werden nur Werte veröffentlicht, die sich seit der letzten
//! *erfolgreichen* Veröffentlichung geändert haben.

use heapless::Vec;

use crate::types::{Reading, ReportKind, Value};

/// Maximale Anzahl Messwerte pro Sketch
pub const MAX_READINGS: usize = 8;

/// Sammlung der aktuellen Messwerte einer Iteration
pub type Readings = Vec<Reading, MAX_READINGS>;

/// Merkt sich den zuletzt veröffentlichten Wert je Schlüssel
#[derive(Debug, Default)]
pub struct ChangeTracker {
    published: Vec<(&'static str, Value), MAX_READINGS>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Liefert die geänderten Werte einer Art (Telemetrie oder Attribut)
    pub fn changed(&self, readings: &[Reading], kind: ReportKind) -> Readings {
        readings
            .iter()
            .filter(|reading| reading.kind == kind)
            .filter(|reading| self.last(reading.key) != Some(reading.value))
            .copied()
            .collect()
    }

    /// Markiert Werte als veröffentlicht
    pub fn commit(&mut self, readings: &[Reading]) {
        for reading in readings {
            match self
                .published
                .iter_mut()
                .find(|(key, _)| *key == reading.key)
            {
                Some(entry) => entry.1 = reading.value,
                None => {
                    // Mehr Schlüssel als Platz: Wert wird dann bei jeder Iteration erneut gesendet
                    let _ = self.published.push((reading.key, reading.value));
                }
            }
        }
    }

    /// Vergisst alle veröffentlichten Werte (neue Session → Vollbild)
    pub fn invalidate(&mut self) {
        self.published.clear();
    }

    pub fn last(&self, key: &str) -> Option<Value> {
        self.published
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, value)| value)
    }
}
