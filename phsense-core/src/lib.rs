//! Embeddable core for phsense: host contract, handles, reference host, pH sensor.

pub mod bench;
pub mod host;
pub mod sensor;

pub use bench::{DueTimer, SimHost};
pub use host::{AttrHandle, ChipHost, PinHandle, PinMode, TimerHandle};
pub use sensor::{Chip, PhSensor, DEFAULT_VOLTAGE, OUTPUT_PIN, TICK_US, VOLTAGE_ATTR};
