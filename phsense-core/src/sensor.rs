use crate::host::{AttrHandle, ChipHost, PinHandle, PinMode, TimerHandle};

/// Name of the analog output pin.
pub const OUTPUT_PIN: &str = "AO";
/// Name of the attribute that sets the output voltage.
pub const VOLTAGE_ATTR: &str = "voltage";
pub const DEFAULT_VOLTAGE: f32 = 1.0;
/// Sampling period in microseconds.
pub const TICK_US: u32 = 1000;

/// A chip instance driven by host timers.
pub trait Chip {
    fn name(&self) -> &str;

    /// Called by the host each time a timer created by this chip fires.
    fn on_timer(&mut self, timer: TimerHandle, host: &mut dyn ChipHost);
}

/// Simulated pH probe: copies the `voltage` attribute onto pin `AO` once
/// per tick, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PhSensor {
    output: PinHandle,
    voltage: AttrHandle,
    timer: TimerHandle,
}

impl PhSensor {
    /// Register the pin, the attribute and the repeating sample timer.
    pub fn init(host: &mut dyn ChipHost) -> Self {
        let output = host.pin_init(OUTPUT_PIN, PinMode::Analog);
        let voltage = host.attr_init_float(VOLTAGE_ATTR, DEFAULT_VOLTAGE);
        let timer = host.timer_init();
        host.timer_start(timer, TICK_US, true);
        tracing::debug!(%output, %voltage, %timer, "pH sensor initialized");
        Self {
            output,
            voltage,
            timer,
        }
    }

    pub fn on_tick(&self, host: &mut dyn ChipHost) {
        let value = host.attr_read_float(self.voltage);
        host.pin_dac_write(self.output, value);
    }

    pub fn output(&self) -> PinHandle {
        self.output
    }

    pub fn voltage_attr(&self) -> AttrHandle {
        self.voltage
    }

    pub fn timer(&self) -> TimerHandle {
        self.timer
    }
}

impl Chip for PhSensor {
    fn name(&self) -> &str {
        "ph-sensor"
    }

    fn on_timer(&mut self, timer: TimerHandle, host: &mut dyn ChipHost) {
        if timer == self.timer {
            self.on_tick(host);
        }
    }
}
