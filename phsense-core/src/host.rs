use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a pin registered with the host (`pin_t` in the chip ABI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinHandle(pub u32);

/// Handle to a host-managed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttrHandle(pub u32);

/// Handle to a host timer (`timer_t` in the chip ABI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u32);

impl fmt::Display for PinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin#{}", self.0)
    }
}

impl fmt::Display for AttrHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attr#{}", self.0)
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Electrical mode of a pin. Discriminants are the ABI values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum PinMode {
    Input = 0,
    Output = 1,
    InputPullup = 2,
    InputPulldown = 3,
    Analog = 4,
    OutputLow = 16,
    OutputHigh = 17,
}

impl PinMode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(PinMode::Input),
            1 => Some(PinMode::Output),
            2 => Some(PinMode::InputPullup),
            3 => Some(PinMode::InputPulldown),
            4 => Some(PinMode::Analog),
            16 => Some(PinMode::OutputLow),
            17 => Some(PinMode::OutputHigh),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }
}

/// Services a circuit simulator offers to a chip.
///
/// Every call is infallible from the chip's side: a host that cannot honour
/// a request is expected to log it (or abort the simulation), never to hand
/// an error back into chip code.
///
/// Timers carry no callback here. The host remembers which chip created a
/// timer and calls [`Chip::on_timer`](crate::Chip::on_timer) on that chip
/// when it fires.
pub trait ChipHost {
    /// Register (or look up) a pin by name.
    fn pin_init(&mut self, name: &str, mode: PinMode) -> PinHandle;

    /// Drive an analog voltage onto a pin.
    fn pin_dac_write(&mut self, pin: PinHandle, voltage: f32);

    /// Sample the analog voltage currently on a pin.
    fn pin_adc_read(&self, pin: PinHandle) -> f32;

    /// Register a floating-point attribute. The host may already hold a
    /// user-configured value for `name`, which takes precedence over
    /// `default`.
    fn attr_init_float(&mut self, name: &str, default: f32) -> AttrHandle;

    fn attr_read_float(&self, attr: AttrHandle) -> f32;

    /// Register an integer attribute.
    fn attr_init(&mut self, name: &str, default: u32) -> AttrHandle;

    fn attr_read(&self, attr: AttrHandle) -> u32;

    /// Allocate a stopped timer owned by the calling chip.
    fn timer_init(&mut self) -> TimerHandle;

    /// Arm a timer `micros` microseconds from now.
    fn timer_start(&mut self, timer: TimerHandle, micros: u32, repeat: bool) {
        self.timer_start_ns(timer, u64::from(micros) * 1_000, repeat);
    }

    fn timer_start_ns(&mut self, timer: TimerHandle, nanos: u64, repeat: bool);

    fn timer_stop(&mut self, timer: TimerHandle);

    /// Current simulation time in nanoseconds.
    fn sim_nanos(&self) -> u64;
}
