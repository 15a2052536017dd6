//! Integration Tests für die Sketch-Varianten
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockPin/MockSensor

mod common;

use common::{InfalliblePin, MockPin, MockSensor};
use espresso_core::sketches::{KEY_EXT_VALUE, KEY_HUMIDITY, KEY_TEMPERATURE, KEY_VALUE};
use espresso_core::{
    ButtonLed, ClimateReading, DeviceError, GpioOutput, OutputHandler, Readings, RelayClimate,
    RpcLed, RpcValue, Sketch, Value,
};

fn value_of(readings: &Readings, key: &str) -> Option<Value> {
    readings
        .iter()
        .find(|reading| reading.key == key)
        .map(|reading| reading.value)
}

fn readings_of<S: Sketch>(sketch: &S) -> Readings {
    let mut readings = Readings::new();
    sketch.readings(&mut readings);
    readings
}

// ============================================================================
// Tests: GpioOutput
// ============================================================================

#[test]
fn test_output_drives_initial_level() {
    let pin = MockPin::new();
    pin.set(true);

    let output = GpioOutput::new(pin.clone(), false).unwrap();

    assert!(!output.is_on());
    assert!(!pin.high());
    assert_eq!(pin.writes.get(), 1);
}

#[test]
fn test_output_toggle() {
    let pin = MockPin::new();
    let mut output = GpioOutput::new(pin.clone(), false).unwrap();

    output.toggle().unwrap();
    assert!(output.is_on() && pin.high());
    output.toggle().unwrap();
    assert!(!output.is_on() && !pin.high());
}

#[test]
fn test_output_keeps_state_on_gpio_error() {
    let pin = MockPin::new();
    let mut output = GpioOutput::new(pin.clone(), false).unwrap();
    pin.fail.set(true);

    assert_eq!(output.set(true), Err(DeviceError::Gpio));
    assert!(!output.is_on());
}

// ============================================================================
// Tests: RpcLed
// ============================================================================

#[test]
fn test_rpc_led_binds_set_and_get() {
    let led = RpcLed::new(MockPin::new()).unwrap();
    let names: Vec<&str> = led.bindings().iter().map(|&(name, _)| name).collect();
    assert_eq!(names, ["setValue", "getValue"]);
}

#[test]
fn test_rpc_led_read_after_write() {
    let pin = MockPin::new();
    let mut led = RpcLed::new(pin.clone()).unwrap();

    let response = led
        .invoke(OutputHandler::SetValue, RpcValue::Bool(true))
        .unwrap();
    assert_eq!(response, RpcValue::Bool(true));
    assert!(pin.high());

    let response = led.invoke(OutputHandler::GetValue, RpcValue::None).unwrap();
    assert_eq!(response, RpcValue::Bool(true));
}

#[test]
fn test_rpc_led_set_value_is_idempotent() {
    let pin = MockPin::new();
    let mut led = RpcLed::new(pin.clone()).unwrap();

    for _ in 0..3 {
        led.invoke(OutputHandler::SetValue, RpcValue::Bool(true))
            .unwrap();
    }
    assert!(led.led_on());
    assert!(pin.high());
}

#[test]
fn test_rpc_led_numeric_params() {
    let mut led = RpcLed::new(MockPin::new()).unwrap();

    led.invoke(OutputHandler::SetValue, RpcValue::Int(1)).unwrap();
    assert!(led.led_on());
    led.invoke(OutputHandler::SetValue, RpcValue::Int(0)).unwrap();
    assert!(!led.led_on());
    // Fehlende Parameter schalten aus
    led.invoke(OutputHandler::SetValue, RpcValue::Bool(true))
        .unwrap();
    led.invoke(OutputHandler::SetValue, RpcValue::None).unwrap();
    assert!(!led.led_on());
}

#[test]
fn test_rpc_led_reports_nothing() {
    let led = RpcLed::new(MockPin::new()).unwrap();
    assert!(readings_of(&led).is_empty());
}

#[test]
fn test_rpc_led_gpio_failure() {
    let pin = MockPin::new();
    let mut led = RpcLed::new(pin.clone()).unwrap();
    pin.fail.set(true);

    let result = led.invoke(OutputHandler::SetValue, RpcValue::Bool(true));
    assert_eq!(result, Err(DeviceError::Gpio));
    assert_eq!(
        led.invoke(OutputHandler::GetValue, RpcValue::None),
        Ok(RpcValue::Bool(false))
    );
}

// ============================================================================
// Tests: ButtonLed
// ============================================================================

#[test]
fn test_button_press_toggles_led() {
    let led = MockPin::new();
    let button = MockPin::new();
    button.set(true); // low-aktiv, losgelassen
    let mut sketch = ButtonLed::new(led.clone(), button.clone(), true, 3).unwrap();

    button.set(false);
    sketch.poll_inputs().unwrap();
    sketch.poll_inputs().unwrap();
    assert!(!sketch.led_on());
    sketch.poll_inputs().unwrap();
    assert!(sketch.led_on());
    assert!(led.high());
    assert!(sketch.button_pressed());

    // Gedrückt halten schaltet nicht erneut
    for _ in 0..10 {
        sketch.poll_inputs().unwrap();
    }
    assert!(sketch.led_on());

    // Loslassen und erneut drücken
    button.set(true);
    for _ in 0..3 {
        sketch.poll_inputs().unwrap();
    }
    assert!(!sketch.button_pressed());
    button.set(false);
    for _ in 0..3 {
        sketch.poll_inputs().unwrap();
    }
    assert!(!sketch.led_on());
}

#[test]
fn test_button_glitch_is_ignored() {
    let button = MockPin::new();
    let mut sketch = ButtonLed::new(MockPin::new(), button.clone(), false, 3).unwrap();

    for level in [true, false, true, false] {
        button.set(level);
        sketch.poll_inputs().unwrap();
    }
    assert!(!sketch.led_on());
    assert!(!sketch.button_pressed());
}

#[test]
fn test_button_led_attributes() {
    let mut sketch = ButtonLed::new(MockPin::new(), InfalliblePin, true, 1).unwrap();
    sketch
        .invoke(OutputHandler::SetValue, RpcValue::Bool(true))
        .unwrap();

    let readings = readings_of(&sketch);
    assert_eq!(readings.len(), 2);
    assert_eq!(value_of(&readings, "led"), Some(Value::Bool(true)));
    // InfalliblePin liefert LOW, low-aktiv: gedrückt erst nach poll_inputs
    assert_eq!(value_of(&readings, "button"), Some(Value::Bool(false)));

    sketch.poll_inputs().unwrap();
    assert!(sketch.button_pressed());
    assert!(!sketch.led_on());
}

// ============================================================================
// Tests: RelayClimate
// ============================================================================

#[test]
fn test_relay_starts_low_and_reports_inverted_value() {
    let relay = MockPin::new();
    relay.set(true);
    let sketch = RelayClimate::new(relay.clone(), MockPin::new(), MockSensor::default()).unwrap();

    assert!(!relay.high());
    assert!(!sketch.pin_high());
    let readings = readings_of(&sketch);
    assert_eq!(value_of(&readings, KEY_VALUE), Some(Value::Bool(true)));
}

#[test]
fn test_relay_set_value_inverts_telemetry() {
    let relay = MockPin::new();
    let mut sketch =
        RelayClimate::new(relay.clone(), MockPin::new(), MockSensor::default()).unwrap();

    let response = sketch
        .invoke(OutputHandler::SetValue, RpcValue::Bool(true))
        .unwrap();

    assert_eq!(response, RpcValue::Bool(true));
    assert!(relay.high());
    let readings = readings_of(&sketch);
    assert_eq!(value_of(&readings, KEY_VALUE), Some(Value::Bool(false)));
    assert_eq!(
        sketch.invoke(OutputHandler::GetValue, RpcValue::None),
        Ok(RpcValue::Bool(true))
    );
}

#[test]
fn test_relay_feedback_input() {
    let feedback = MockPin::new();
    let mut sketch =
        RelayClimate::new(MockPin::new(), feedback.clone(), MockSensor::default()).unwrap();

    feedback.set(true);
    sketch.poll_inputs().unwrap();
    assert_eq!(
        value_of(&readings_of(&sketch), KEY_EXT_VALUE),
        Some(Value::Bool(true))
    );

    feedback.set(false);
    sketch.poll_inputs().unwrap();
    assert_eq!(
        value_of(&readings_of(&sketch), KEY_EXT_VALUE),
        Some(Value::Bool(false))
    );
}

#[test]
fn test_climate_readings_appear_once_available() {
    let sensor = MockSensor::with(&[ClimateReading {
        temperature: 21,
        humidity: 48,
    }]);
    let mut sketch = RelayClimate::new(MockPin::new(), MockPin::new(), sensor).unwrap();

    // Vor der ersten Messung nur value/ext_value
    assert_eq!(readings_of(&sketch).len(), 2);
    assert_eq!(value_of(&readings_of(&sketch), KEY_TEMPERATURE), None);

    sketch.poll_inputs().unwrap();
    let readings = readings_of(&sketch);
    assert_eq!(readings.len(), 4);
    assert_eq!(value_of(&readings, KEY_TEMPERATURE), Some(Value::Int(21)));
    assert_eq!(value_of(&readings, KEY_HUMIDITY), Some(Value::Int(48)));

    // Sensor liefert nichts Neues: letzter Wert bleibt
    sketch.poll_inputs().unwrap();
    assert_eq!(
        value_of(&readings_of(&sketch), KEY_TEMPERATURE),
        Some(Value::Int(21))
    );
}

#[test]
fn test_relay_feedback_failure() {
    let feedback = MockPin::new();
    let mut sketch =
        RelayClimate::new(MockPin::new(), feedback.clone(), MockSensor::default()).unwrap();
    feedback.fail.set(true);
    assert_eq!(sketch.poll_inputs(), Err(DeviceError::Gpio));
}
