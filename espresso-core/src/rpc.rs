//! RPC-Handler-Tabelle und Session-Registry
//!
//! Die Tabelle bildet Methodennamen auf getaggte Handler-Varianten des
//! jeweiligen Sketches ab. Sie wird einmal beim Start aufgebaut.
//! Die Registry merkt sich, welche Handler in der *aktuellen* Session beim
//! Broker angemeldet sind, und wird bei jedem Session-Wechsel geleert.

use heapless::Vec;

use crate::error::{SubscribeError, TableError};
use crate::protocol::TOPIC_RPC_REQUEST_FILTER;
use crate::traits::Session;

/// Maximale Anzahl RPC-Handler pro Sketch
pub const MAX_HANDLERS: usize = 8;

/// Tabelle Methodenname → Handler-Variante
///
/// Namen sind eindeutig; doppelte Einträge werden abgelehnt.
#[derive(Debug, Clone)]
pub struct HandlerTable<H> {
    entries: Vec<(&'static str, H), MAX_HANDLERS>,
}

impl<H: Copy> HandlerTable<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Baut die Tabelle aus einer statischen Liste von Bindungen
    pub fn from_bindings(bindings: &[(&'static str, H)]) -> Result<Self, TableError> {
        let mut table = Self::new();
        for &(name, handler) in bindings {
            table.insert(name, handler)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: &'static str, handler: H) -> Result<(), TableError> {
        if self.resolve(name).is_some() {
            return Err(TableError::DuplicateName);
        }
        self.entries
            .push((name, handler))
            .map_err(|_| TableError::Full)
    }

    /// Sucht die Handler-Variante zu einem Methodennamen
    pub fn resolve(&self, name: &str) -> Option<H> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, handler)| handler)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|&(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Copy> Default for HandlerTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Beim Broker angemeldete Handler der laufenden Session
#[derive(Debug, Default)]
pub struct RpcRegistry {
    filter_active: bool,
    active: Vec<&'static str, MAX_HANDLERS>,
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meldet einen Handler in der Session an
    ///
    /// Der erste Handler abonniert den gemeinsamen RPC-Topic-Filter.
    pub async fn register<S: Session>(
        &mut self,
        session: &mut S,
        name: &'static str,
    ) -> Result<(), SubscribeError> {
        if self.is_registered(name) {
            return Ok(());
        }
        if !self.filter_active {
            session.subscribe(TOPIC_RPC_REQUEST_FILTER).await?;
            self.filter_active = true;
        }
        self.active.push(name).map_err(|_| SubscribeError::Capacity)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.active.iter().any(|&active| active == name)
    }

    /// Vergisst alle Anmeldungen (neue Session oder Rollback)
    pub fn clear(&mut self) {
        self.filter_active = false;
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
