//! Verbindungs- und Dispatch-Schleife
//!
//! Pro Iteration:
//! 1. Link sicherstellen (Backoff, abbrechbar)
//! 2. Session sicherstellen (bei Fehler: loggen, Backoff, nächste Iteration)
//! 3. Handler registrieren (alles-oder-nichts)
//! 4. Eingehende RPC-Aufrufe verteilen, geänderte Messwerte veröffentlichen
//!
//! Alle Fehler sind nicht fatal. Die Schleife endet nur über das
//! Shutdown-Signal.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;

use crate::config::LoopConfig;
use crate::error::{LoopError, SessionError, SubscribeError, TableError};
use crate::logic::Backoff;
use crate::protocol::{self, TOPIC_ATTRIBUTES, TOPIC_TELEMETRY};
use crate::report::{ChangeTracker, Readings};
use crate::rpc::{HandlerTable, RpcRegistry};
use crate::sketches::Sketch;
use crate::traits::{Broker, Link, Session};
use crate::types::{ConnectivityState, ReportKind, RpcRequest, SessionParams};

/// Zähler für Diagnose und Tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopStats {
    /// Erfolgreich geöffnete Sessions
    pub sessions_opened: u32,
    /// Ausgeführte RPC-Aufrufe
    pub rpc_dispatched: u32,
    /// Veröffentlichte Telemetrie-/Attribut-Nachrichten
    pub reports_published: u32,
}

/// Gesamter veränderlicher Zustand der Schleife
///
/// Sketch, Handler-Tabelle und Registry gehören der Schleife, es gibt keine
/// globalen Flags wie `subscribed`.
pub struct LoopContext<S: Sketch> {
    sketch: S,
    table: HandlerTable<S::Handler>,
    registry: RpcRegistry,
    tracker: ChangeTracker,
    state: ConnectivityState,
    subscribed: bool,
    link_backoff: Backoff,
    session_backoff: Backoff,
    stats: LoopStats,
}

impl<S: Sketch> LoopContext<S> {
    /// Baut den Kontext und löst die Handler-Tabelle einmalig auf
    pub fn new(sketch: S, config: &LoopConfig) -> Result<Self, TableError> {
        let table = HandlerTable::from_bindings(sketch.bindings())?;
        Ok(Self {
            sketch,
            table,
            registry: RpcRegistry::new(),
            tracker: ChangeTracker::new(),
            state: ConnectivityState::Disconnected,
            subscribed: false,
            link_backoff: Backoff::new(config.link_backoff),
            session_backoff: Backoff::new(config.session_backoff),
            stats: LoopStats::default(),
        })
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn sketch(&self) -> &S {
        &self.sketch
    }

    pub fn sketch_mut(&mut self) -> &mut S {
        &mut self.sketch
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Frische Session: nichts registriert, alle Werte gelten als unveröffentlicht
    fn begin_session(&mut self) {
        self.registry.clear();
        self.subscribed = false;
        self.tracker.invalidate();
        self.session_backoff.reset();
        self.state = ConnectivityState::SessionEstablished;
        self.stats.sessions_opened = self.stats.sessions_opened.wrapping_add(1);
    }

    fn end_session(&mut self, link_up: bool) {
        self.registry.clear();
        self.subscribed = false;
        self.state = if link_up {
            ConnectivityState::LinkUp
        } else {
            ConnectivityState::Disconnected
        };
    }

    /// Registriert alle Handler der Tabelle
    ///
    /// Schlägt eine einzelne Registrierung fehl, wird die Registry komplett
    /// geleert: entweder sind alle Handler aktiv oder keiner.
    pub async fn subscribe_all<X: Session>(&mut self, session: &mut X) -> Result<(), SubscribeError> {
        info!("Broker: Subscribing for RPC...");
        for name in self.table.names() {
            if let Err(e) = self.registry.register(session, name).await {
                self.registry.clear();
                self.subscribed = false;
                return Err(e);
            }
        }
        self.subscribed = true;
        self.state = ConnectivityState::SessionSubscribed;
        info!("Broker: Subscribe done ({} handlers)", self.registry.len());
        Ok(())
    }

    /// Eingänge abtasten, RPC-Aufrufe verteilen, Änderungen veröffentlichen
    pub async fn service<X: Session>(
        &mut self,
        session: &mut X,
        max_drain: usize,
    ) -> Result<(), SessionError> {
        for _ in 0..max_drain {
            match session.poll().await? {
                Some(request) => self.dispatch(session, request).await?,
                None => break,
            }
        }

        if let Err(e) = self.sketch.poll_inputs() {
            warn!("Sketch: Failed to read inputs: {:?}", e);
        }

        self.emit(session).await
    }

    async fn dispatch<X: Session>(
        &mut self,
        session: &mut X,
        request: RpcRequest,
    ) -> Result<(), SessionError> {
        let method = request.method.as_str();
        if !self.subscribed || !self.registry.is_registered(method) {
            debug!("RPC: Ignoring '{}' (not registered)", method);
            return Ok(());
        }
        let Some(handler) = self.table.resolve(method) else {
            return Ok(());
        };

        debug!("RPC: Received '{}' (id {})", method, request.id);
        let response = match self.sketch.invoke(handler, request.params) {
            Ok(response) => response,
            Err(e) => {
                error!("RPC: Handler '{}' failed: {:?}", method, e);
                return Ok(());
            }
        };
        self.stats.rpc_dispatched = self.stats.rpc_dispatched.wrapping_add(1);

        let encoded = protocol::response_topic(request.id)
            .and_then(|topic| protocol::encode_response(response).map(|payload| (topic, payload)));
        match encoded {
            Ok((topic, payload)) => session.publish(&topic, payload.as_bytes()).await,
            Err(e) => {
                warn!("RPC: Cannot encode response: {:?}", e);
                Ok(())
            }
        }
    }

    async fn emit<X: Session>(&mut self, session: &mut X) -> Result<(), SessionError> {
        let mut readings = Readings::new();
        self.sketch.readings(&mut readings);

        for (kind, topic) in [
            (ReportKind::Telemetry, TOPIC_TELEMETRY),
            (ReportKind::Attribute, TOPIC_ATTRIBUTES),
        ] {
            let changed = self.tracker.changed(&readings, kind);
            if changed.is_empty() {
                continue;
            }
            match protocol::encode_readings(changed.iter()) {
                Ok(payload) => {
                    session.publish(topic, payload.as_bytes()).await?;
                    self.tracker.commit(&changed);
                    self.stats.reports_published = self.stats.reports_published.wrapping_add(1);
                    debug!("Broker: Published {} to {}", payload.as_str(), topic);
                }
                Err(e) => warn!("Broker: Cannot encode readings: {:?}", e),
            }
        }
        Ok(())
    }
}

/// Verbindungs- und Dispatch-Schleife
///
/// Besitzt Link-Treiber, Broker-Client und Sketch exklusiv; kein Locking.
///
/// # Parameter
/// - `L`: WLAN-Link
/// - `B`: Broker-Client
/// - `S`: Sketch-Variante (Pins, Handler, Messwerte)
/// - `D`: Delay für Backoff und Idle-Pausen
/// - `M`: Mutex-Typ des Shutdown-Signals
pub struct Runtime<'a, L, B, S, D, M>
where
    S: Sketch,
    M: RawMutex,
{
    link: L,
    broker: B,
    delay: D,
    shutdown: &'a Signal<M, ()>,
    params: SessionParams<'static>,
    config: LoopConfig,
    ctx: LoopContext<S>,
}

impl<'a, L, B, S, D, M> Runtime<'a, L, B, S, D, M>
where
    L: Link,
    B: Broker,
    S: Sketch,
    D: DelayNs,
    M: RawMutex,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        link: L,
        broker: B,
        sketch: S,
        delay: D,
        shutdown: &'a Signal<M, ()>,
        params: SessionParams<'static>,
        config: LoopConfig,
    ) -> Result<Self, TableError> {
        Ok(Self {
            link,
            broker,
            delay,
            shutdown,
            params,
            ctx: LoopContext::new(sketch, &config)?,
            config,
        })
    }

    pub fn context(&self) -> &LoopContext<S> {
        &self.ctx
    }

    pub fn state(&self) -> ConnectivityState {
        self.ctx.state
    }

    /// Läuft bis das Shutdown-Signal gesetzt wird
    pub async fn run(&mut self) {
        let shutdown = self.shutdown;
        let config = self.config;
        let link = &mut self.link;
        let broker = &mut self.broker;
        let delay = &mut self.delay;
        let params = &self.params;
        let ctx = &mut self.ctx;

        info!("Loop: Started");
        loop {
            if shutdown.signaled() {
                break;
            }

            if let Err(e) = ensure_link(link, delay, shutdown, ctx).await {
                if e == LoopError::Cancelled {
                    break;
                }
                continue;
            }

            info!("Broker: Connecting to {}...", params.server);
            let mut session = match broker.open(params).await {
                Ok(session) => session,
                Err(e) => {
                    warn!("Broker: Failed to connect: {:?}", e);
                    let backoff = ctx.session_backoff.next_delay_ms();
                    if pause(delay, shutdown, backoff).await.is_err() {
                        break;
                    }
                    continue;
                }
            };
            ctx.begin_session();
            info!("Broker: Connected");

            let cancelled = loop {
                if shutdown.signaled() {
                    break true;
                }
                if !link.is_up() {
                    warn!("WiFi: Link lost, dropping session");
                    break false;
                }
                if !session.is_connected() {
                    warn!("Broker: Session lost");
                    break false;
                }

                if !ctx.subscribed {
                    if let Err(e) = ctx.subscribe_all(&mut session).await {
                        warn!("Broker: Failed to subscribe for RPC: {:?}", e);
                        let backoff = ctx.session_backoff.next_delay_ms();
                        if pause(delay, shutdown, backoff).await.is_err() {
                            break true;
                        }
                        continue;
                    }
                }

                if let Err(e) = ctx.service(&mut session, config.max_drain).await {
                    warn!("Broker: Session error: {:?}", e);
                }

                if pause(delay, shutdown, config.idle_ms).await.is_err() {
                    break true;
                }
            };

            drop(session);
            ctx.end_session(link.is_up());
            if cancelled {
                break;
            }
        }
        info!("Loop: Shutdown");
    }
}

/// Wartet bis der Link steht
///
/// Jeder Fehlversuch verlängert die Pause exponentiell bis zur Obergrenze.
/// Kehrt mit [`LoopError::Cancelled`] zurück, wenn währenddessen das
/// Shutdown-Signal kommt.
pub async fn ensure_link<L, S, D, M>(
    link: &mut L,
    delay: &mut D,
    shutdown: &Signal<M, ()>,
    ctx: &mut LoopContext<S>,
) -> Result<(), LoopError>
where
    L: Link,
    S: Sketch,
    D: DelayNs,
    M: RawMutex,
{
    if link.is_up() {
        if ctx.state == ConnectivityState::Disconnected {
            ctx.state = ConnectivityState::LinkUp;
        }
        return Ok(());
    }

    ctx.state = ConnectivityState::Disconnected;
    info!("WiFi: Connecting to AP...");
    loop {
        if let Err(e) = link.join().await {
            warn!("WiFi: Join failed: {:?}", e);
        }
        if link.is_up() {
            break;
        }
        let backoff = ctx.link_backoff.next_delay_ms();
        debug!("WiFi: Link down, retrying in {} ms", backoff);
        pause(delay, shutdown, backoff).await?;
    }

    ctx.link_backoff.reset();
    ctx.state = ConnectivityState::LinkUp;
    info!("WiFi: Connected to AP");
    Ok(())
}

/// Abbrechbare Pause
async fn pause<D, M>(delay: &mut D, shutdown: &Signal<M, ()>, ms: u32) -> Result<(), LoopError>
where
    D: DelayNs,
    M: RawMutex,
{
    if shutdown.signaled() {
        return Err(LoopError::Cancelled);
    }
    match select(delay.delay_ms(ms), shutdown.wait()).await {
        Either::First(()) => Ok(()),
        Either::Second(()) => {
            // wait() verbraucht das Signal, für die Prüfung oben erneut setzen
            shutdown.signal(());
            Err(LoopError::Cancelled)
        }
    }
}
