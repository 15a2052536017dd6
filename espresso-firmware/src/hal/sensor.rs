// Klima-Sensor: simulierte Messwerte aus dem Hardware-RNG
use defmt::debug;
use embassy_time::{Duration, Instant};
use esp_hal::rng::Rng;
use espresso_core::{ClimateReading, ClimateSensor};

/// Temperaturbereich in °C (inklusive Untergrenze)
const TEMPERATURE_MIN: i32 = 18;
const TEMPERATURE_SPAN: u32 = 10;

/// Luftfeuchte-Bereich in % (inklusive Untergrenze)
const HUMIDITY_MIN: i32 = 35;
const HUMIDITY_SPAN: u32 = 30;

/// Simulierter Temperatur/Luftfeuchte-Sensor
///
/// Platzhalter bis ein echter Sensor (z.B. DHT22) angeschlossen ist.
/// Liefert höchstens einen Messwert pro Intervall, dazwischen `None`.
pub struct SimulatedClimate {
    rng: Rng,
    interval: Duration,
    next_sample: Instant,
}

impl SimulatedClimate {
    pub fn new(rng: Rng, interval: Duration) -> Self {
        Self {
            rng,
            interval,
            next_sample: Instant::now(),
        }
    }
}

impl ClimateSensor for SimulatedClimate {
    fn read(&mut self) -> Option<ClimateReading> {
        let now = Instant::now();
        if now < self.next_sample {
            return None;
        }
        self.next_sample = now + self.interval;

        let reading = ClimateReading {
            temperature: TEMPERATURE_MIN + (self.rng.random() % TEMPERATURE_SPAN) as i32,
            humidity: HUMIDITY_MIN + (self.rng.random() % HUMIDITY_SPAN) as i32,
        };
        debug!(
            "Sensor: temperature={} humidity={}",
            reading.temperature, reading.humidity
        );
        Some(reading)
    }
}
