// Hardware Abstraction Layer (HAL) Module
//
// Konkrete Implementierungen der espresso-core Traits für das Board.
// GPIOs brauchen keinen Adapter: esp-hal Output/Input implementieren die
// embedded-hal Digital-Traits direkt.

pub mod sensor;

pub use sensor::SimulatedClimate;
