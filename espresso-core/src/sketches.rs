//! Sketch-Varianten
//!
//! Jeder Sketch ist eine dünne Konfiguration über der Verbindungs-Schleife:
//! welche Pins, welche RPC-Handler, welche Messwerte. Die Pins werden über
//! die `embedded-hal` Digital-Traits angesprochen, damit die Logik auf dem
//! Host mit Mock-Pins getestet werden kann.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::DeviceError;
use crate::logic::Debouncer;
use crate::report::Readings;
use crate::traits::ClimateSensor;
use crate::types::{ClimateReading, Reading, RpcValue, Value};

// ============================================================================
// Externer Vertrag: RPC-Methoden und Schlüssel (nicht umbenennen!)
// ============================================================================

pub const METHOD_SET_VALUE: &str = "setValue";
pub const METHOD_GET_VALUE: &str = "getValue";

pub const KEY_TEMPERATURE: &str = "temperature";
pub const KEY_HUMIDITY: &str = "humidity";
pub const KEY_LED: &str = "led";
pub const KEY_BUTTON: &str = "button";
pub const KEY_VALUE: &str = "value";
pub const KEY_EXT_VALUE: &str = "ext_value";

/// Trait für eine Sketch-Variante
///
/// Wird exklusiv von der Schleife besessen; alle Methoden laufen synchron
/// auf dem Schleifen-Task und dürfen nicht lange blockieren.
pub trait Sketch {
    /// Getaggte Handler-Variante (aufgelöst über die `HandlerTable`)
    type Handler: Copy + 'static;

    /// Statische Bindungen Methodenname → Handler
    fn bindings(&self) -> &'static [(&'static str, Self::Handler)];

    /// Führt einen RPC-Aufruf aus und liefert die Antwort
    fn invoke(
        &mut self,
        handler: Self::Handler,
        params: RpcValue,
    ) -> Result<RpcValue, DeviceError>;

    /// Tastet lokale Eingänge ab (Taster, Sensoren)
    fn poll_inputs(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Aktuelle Messwerte für Telemetrie/Attribute
    fn readings(&self, out: &mut Readings);
}

/// Handler für Sketches mit einem schaltbaren Ausgang
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputHandler {
    /// `setValue(bool) -> bool`: setzt den Ausgang, liefert neuen Zustand
    SetValue,
    /// `getValue(*) -> bool`: liefert den aktuellen Zustand
    GetValue,
}

const OUTPUT_BINDINGS: &[(&str, OutputHandler)] = &[
    (METHOD_SET_VALUE, OutputHandler::SetValue),
    (METHOD_GET_VALUE, OutputHandler::GetValue),
];

/// Digitaler Ausgang mit gespiegeltem Zustand (1:1 zum Pin)
#[derive(Debug)]
pub struct GpioOutput<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> GpioOutput<P> {
    /// Übernimmt den Pin und treibt ihn auf den Startpegel
    pub fn new(pin: P, initial: bool) -> Result<Self, DeviceError> {
        let mut output = Self { pin, on: !initial };
        output.set(initial)?;
        Ok(output)
    }

    pub fn set(&mut self, on: bool) -> Result<(), DeviceError> {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| DeviceError::Gpio)?;
        self.on = on;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), DeviceError> {
        self.set(!self.on)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn handle(&mut self, handler: OutputHandler, params: RpcValue) -> Result<RpcValue, DeviceError> {
        match handler {
            OutputHandler::SetValue => {
                let on = params.is_truthy();
                info!("RPC: setValue -> {}", on);
                self.set(on)?;
                Ok(RpcValue::Bool(self.on))
            }
            OutputHandler::GetValue => Ok(RpcValue::Bool(self.on)),
        }
    }
}

// ============================================================================
// Variante 1: LED per RPC
// ============================================================================

/// Eine LED, geschaltet über `setValue`, gelesen über `getValue`
///
/// Veröffentlicht keine Messwerte.
pub struct RpcLed<P> {
    led: GpioOutput<P>,
}

impl<P: OutputPin> RpcLed<P> {
    pub fn new(led: P) -> Result<Self, DeviceError> {
        Ok(Self {
            led: GpioOutput::new(led, false)?,
        })
    }

    pub fn led_on(&self) -> bool {
        self.led.is_on()
    }
}

impl<P: OutputPin> Sketch for RpcLed<P> {
    type Handler = OutputHandler;

    fn bindings(&self) -> &'static [(&'static str, OutputHandler)] {
        OUTPUT_BINDINGS
    }

    fn invoke(&mut self, handler: OutputHandler, params: RpcValue) -> Result<RpcValue, DeviceError> {
        self.led.handle(handler, params)
    }

    fn readings(&self, _out: &mut Readings) {}
}

// ============================================================================
// Variante 2: LED + Taster
// ============================================================================

/// LED mit lokalem Taster
///
/// Ein entprellter Tastendruck schaltet die LED um. Attribute: `led`, `button`.
pub struct ButtonLed<L, B> {
    led: GpioOutput<L>,
    button: B,
    debouncer: Debouncer,
    active_low: bool,
}

impl<L: OutputPin, B: InputPin> ButtonLed<L, B> {
    /// `active_low`: Taster zieht den Pin beim Drücken auf GND (z.B. BOOT-Taster)
    pub fn new(
        led: L,
        button: B,
        active_low: bool,
        debounce_polls: u8,
    ) -> Result<Self, DeviceError> {
        Ok(Self {
            led: GpioOutput::new(led, false)?,
            button,
            debouncer: Debouncer::new(false, debounce_polls),
            active_low,
        })
    }

    pub fn led_on(&self) -> bool {
        self.led.is_on()
    }

    pub fn button_pressed(&self) -> bool {
        self.debouncer.state()
    }
}

impl<L: OutputPin, B: InputPin> Sketch for ButtonLed<L, B> {
    type Handler = OutputHandler;

    fn bindings(&self) -> &'static [(&'static str, OutputHandler)] {
        OUTPUT_BINDINGS
    }

    fn invoke(&mut self, handler: OutputHandler, params: RpcValue) -> Result<RpcValue, DeviceError> {
        self.led.handle(handler, params)
    }

    fn poll_inputs(&mut self) -> Result<(), DeviceError> {
        let high = self.button.is_high().map_err(|_| DeviceError::Gpio)?;
        let pressed = high != self.active_low;

        if let Some(true) = self.debouncer.update(pressed) {
            self.led.toggle()?;
            info!("Button: pressed, LED -> {}", self.led.is_on());
        }
        Ok(())
    }

    fn readings(&self, out: &mut Readings) {
        let _ = out.push(Reading::attribute(KEY_LED, Value::Bool(self.led.is_on())));
        let _ = out.push(Reading::attribute(
            KEY_BUTTON,
            Value::Bool(self.debouncer.state()),
        ));
    }
}

// ============================================================================
// Variante 3: Relais (invertierte Logik) + Klima-Sensor
// ============================================================================

/// Relais-Ausgang mit Rückmelde-Eingang und Klima-Sensor
///
/// `setValue(true)` treibt den Pin auf HIGH. Das Relais ist low-aktiv, daher
/// wird `value` invertiert gemeldet (`value = !pin_high`). `ext_value` ist der
/// Pegel des Rückmelde-Eingangs. Telemetrie: `value`, `ext_value`,
/// `temperature`, `humidity`.
pub struct RelayClimate<P, E, S> {
    relay: GpioOutput<P>,
    feedback: E,
    sensor: S,
    ext_value: bool,
    climate: Option<ClimateReading>,
}

impl<P: OutputPin, E: InputPin, S: ClimateSensor> RelayClimate<P, E, S> {
    /// Startet mit Pin LOW
    pub fn new(relay: P, feedback: E, sensor: S) -> Result<Self, DeviceError> {
        Ok(Self {
            relay: GpioOutput::new(relay, false)?,
            feedback,
            sensor,
            ext_value: false,
            climate: None,
        })
    }

    pub fn pin_high(&self) -> bool {
        self.relay.is_on()
    }
}

impl<P: OutputPin, E: InputPin, S: ClimateSensor> Sketch for RelayClimate<P, E, S> {
    type Handler = OutputHandler;

    fn bindings(&self) -> &'static [(&'static str, OutputHandler)] {
        OUTPUT_BINDINGS
    }

    fn invoke(&mut self, handler: OutputHandler, params: RpcValue) -> Result<RpcValue, DeviceError> {
        self.relay.handle(handler, params)
    }

    fn poll_inputs(&mut self) -> Result<(), DeviceError> {
        self.ext_value = self.feedback.is_high().map_err(|_| DeviceError::Gpio)?;
        if let Some(reading) = self.sensor.read() {
            self.climate = Some(reading);
        }
        Ok(())
    }

    fn readings(&self, out: &mut Readings) {
        let _ = out.push(Reading::telemetry(
            KEY_VALUE,
            Value::Bool(!self.relay.is_on()),
        ));
        let _ = out.push(Reading::telemetry(
            KEY_EXT_VALUE,
            Value::Bool(self.ext_value),
        ));
        if let Some(climate) = self.climate {
            let _ = out.push(Reading::telemetry(
                KEY_TEMPERATURE,
                Value::Int(climate.temperature),
            ));
            let _ = out.push(Reading::telemetry(
                KEY_HUMIDITY,
                Value::Int(climate.humidity),
            ));
        }
    }
}
