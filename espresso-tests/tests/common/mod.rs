//! Mocks für die Host-Tests
//!
//! Alle Mocks teilen sich eine `World`, damit Tests die Reihenfolge der
//! Ereignisse (Join, Open, Subscribe, Publish) prüfen können.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use espresso_core::{
    Broker, ClimateReading, ClimateSensor, Link, LinkError, RpcRequest, RpcValue, Session,
    SessionError, SessionParams, SubscribeError,
};

pub type Shutdown = Signal<NoopRawMutex, ()>;

// ============================================================================
// Gemeinsamer Zustand
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Join,
    Open { ok: bool, link_up: bool },
    Subscribe { filter: String, ok: bool },
    Publish { topic: String, payload: String },
    Sleep(u32),
}

/// Skript für `Session::poll`
#[derive(Debug, Clone)]
pub enum Inbound {
    Rpc(RpcRequest),
    /// Ein Durchlauf ohne Nachricht
    Idle,
    /// Verbindung bricht ab
    Drop,
    /// Link bricht ab (Session meldet Transport-Fehler)
    LinkDown,
}

#[derive(Debug, Default)]
pub struct World {
    pub link_up: bool,
    /// Link kommt nach so vielen `join()`-Aufrufen hoch
    pub joins_until_up: u32,
    pub join_calls: u32,

    /// Ergebnisse der nächsten `open()`-Aufrufe, danach immer Ok
    pub open_results: VecDeque<Result<(), SessionError>>,
    pub session_connected: bool,
    /// Die nächsten n Subscribes schlagen fehl
    pub failing_subscribes: u32,
    pub inbound: VecDeque<Inbound>,

    /// Nach so vielen Pausen wird Shutdown ausgelöst
    pub sleep_budget: usize,
    pub events: Vec<Event>,
}

pub type SharedWorld = Rc<RefCell<World>>;

pub fn world() -> SharedWorld {
    Rc::new(RefCell::new(World {
        sleep_budget: 50,
        ..World::default()
    }))
}

impl World {
    pub fn opens(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Open { .. }))
            .collect()
    }

    pub fn publishes(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Publish { topic, payload } => Some((topic.clone(), payload.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Sleep(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    /// Index des ersten Ereignisses, das `predicate` erfüllt
    pub fn position(&self, predicate: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events.iter().position(predicate)
    }
}

pub fn rpc(id: u32, method: &str, params: RpcValue) -> Inbound {
    let mut name = heapless::String::new();
    name.push_str(method).unwrap();
    Inbound::Rpc(RpcRequest {
        id,
        method: name,
        params,
    })
}

pub fn params() -> SessionParams<'static> {
    SessionParams::new("vsmqtt.space", "YOUR_DEVICE_ACCESS_TOKEN").with_port(8080)
}

// ============================================================================
// Mock Link
// ============================================================================

pub struct MockLink {
    pub world: SharedWorld,
}

impl Link for MockLink {
    fn is_up(&self) -> bool {
        self.world.borrow().link_up
    }

    async fn join(&mut self) -> Result<(), LinkError> {
        let mut world = self.world.borrow_mut();
        world.join_calls += 1;
        world.events.push(Event::Join);
        if world.join_calls >= world.joins_until_up {
            world.link_up = true;
            Ok(())
        } else {
            Err(LinkError::AssociationFailed)
        }
    }
}

// ============================================================================
// Mock Broker / Session
// ============================================================================

pub struct MockBroker {
    pub world: SharedWorld,
}

pub struct MockSession {
    world: SharedWorld,
}

impl Broker for MockBroker {
    type Session<'s>
        = MockSession
    where
        Self: 's;

    async fn open(
        &mut self,
        _params: &SessionParams<'static>,
    ) -> Result<Self::Session<'_>, SessionError> {
        let mut world = self.world.borrow_mut();
        let result = world.open_results.pop_front().unwrap_or(Ok(()));
        let link_up = world.link_up;
        world.events.push(Event::Open {
            ok: result.is_ok(),
            link_up,
        });
        result?;
        world.session_connected = true;
        Ok(MockSession {
            world: self.world.clone(),
        })
    }
}

impl Session for MockSession {
    fn is_connected(&self) -> bool {
        self.world.borrow().session_connected
    }

    async fn subscribe(&mut self, filter: &str) -> Result<(), SubscribeError> {
        let mut world = self.world.borrow_mut();
        let ok = world.failing_subscribes == 0;
        world.failing_subscribes = world.failing_subscribes.saturating_sub(1);
        world.events.push(Event::Subscribe {
            filter: filter.to_string(),
            ok,
        });
        if ok {
            Ok(())
        } else {
            Err(SubscribeError::Rejected)
        }
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        let mut world = self.world.borrow_mut();
        if !world.session_connected {
            return Err(SessionError::NotConnected);
        }
        world.events.push(Event::Publish {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<RpcRequest>, SessionError> {
        let mut world = self.world.borrow_mut();
        match world.inbound.pop_front() {
            Some(Inbound::Rpc(request)) => Ok(Some(request)),
            Some(Inbound::Idle) | None => Ok(None),
            Some(Inbound::Drop) => {
                world.session_connected = false;
                Err(SessionError::Transport)
            }
            Some(Inbound::LinkDown) => {
                world.session_connected = false;
                world.link_up = false;
                Err(SessionError::Transport)
            }
        }
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Kehrt sofort zurück, protokolliert die Pause und löst nach
/// `sleep_budget` Pausen den Shutdown aus
pub struct MockDelay<'a> {
    pub world: SharedWorld,
    pub shutdown: &'a Shutdown,
}

impl DelayNs for MockDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.record(ms);
    }
}

impl MockDelay<'_> {
    fn record(&mut self, ms: u32) {
        let mut world = self.world.borrow_mut();
        world.events.push(Event::Sleep(ms));
        let slept = world.sleeps().len();
        if slept >= world.sleep_budget {
            self.shutdown.signal(());
        }
    }
}

// ============================================================================
// Mock Pins und Sensor
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Pin mit geteiltem Pegel, damit Tests ihn von außen lesen/setzen können
#[derive(Clone, Default)]
pub struct MockPin {
    pub level: Rc<Cell<bool>>,
    pub writes: Rc<Cell<usize>>,
    pub fail: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn high(&self) -> bool {
        self.level.get()
    }

    pub fn set(&self, high: bool) {
        self.level.set(high);
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        if self.fail.get() {
            return Err(MockPinError);
        }
        self.level.set(false);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        if self.fail.get() {
            return Err(MockPinError);
        }
        self.level.set(true);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, MockPinError> {
        if self.fail.get() {
            return Err(MockPinError);
        }
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, MockPinError> {
        self.is_high().map(|high| !high)
    }
}

/// Pin ohne Fehlerfall
pub struct InfalliblePin;

impl ErrorType for InfalliblePin {
    type Error = Infallible;
}

impl InputPin for InfalliblePin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }
}

/// Liefert die geskripteten Messwerte der Reihe nach
#[derive(Default)]
pub struct MockSensor {
    pub readings: VecDeque<ClimateReading>,
}

impl MockSensor {
    pub fn with(readings: &[ClimateReading]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
        }
    }
}

impl ClimateSensor for MockSensor {
    fn read(&mut self) -> Option<ClimateReading> {
        self.readings.pop_front()
    }
}
