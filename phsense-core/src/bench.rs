//! In-memory reference host.
//!
//! `SimHost` keeps pins, attributes and timers in plain vectors indexed by
//! handle, and a virtual clock in nanoseconds. It never calls into chips
//! itself: a driver polls [`SimHost::poll_due`] and dispatches each fired
//! timer to whoever owns it. That keeps the host usable both for native
//! chips and for chips living inside a wasm store.

use crate::host::{AttrHandle, ChipHost, PinHandle, PinMode, TimerHandle};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Pin {
    name: String,
    mode: PinMode,
    voltage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrValue {
    Float(f32),
    Int(u32),
}

#[derive(Debug, Clone)]
struct Attr {
    name: String,
    value: AttrValue,
}

#[derive(Debug, Clone)]
struct Timer {
    owner: Option<usize>,
    period_ns: u64,
    repeat: bool,
    due_ns: Option<u64>,
}

/// A timer that came due during [`SimHost::poll_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub handle: TimerHandle,
    /// Owner recorded when the timer was created, if any.
    pub owner: Option<usize>,
    pub at_ns: u64,
}

#[derive(Debug, Default)]
pub struct SimHost {
    pins: Vec<Pin>,
    attrs: Vec<Attr>,
    presets: HashMap<String, f32>,
    timers: Vec<Timer>,
    now_ns: u64,
    owner: Option<usize>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the owner recorded on timers created from now on. Returns the
    /// previous owner so callers can restore it.
    pub fn set_owner(&mut self, owner: Option<usize>) -> Option<usize> {
        std::mem::replace(&mut self.owner, owner)
    }

    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    pub fn now_us(&self) -> u64 {
        self.now_ns / 1_000
    }

    /// Set an attribute by name.
    ///
    /// A registered attribute takes the new value immediately. An unknown
    /// name is kept as a preset and used when a chip registers it.
    pub fn set_attr(&mut self, name: &str, value: f32) {
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => {
                attr.value = match attr.value {
                    AttrValue::Float(_) => AttrValue::Float(value),
                    AttrValue::Int(_) => AttrValue::Int(value as u32),
                };
                debug!(attr = name, value, "attribute updated");
            }
            None => {
                self.presets.insert(name.to_string(), value);
                debug!(attr = name, value, "attribute preset");
            }
        }
    }

    /// Current value of a registered attribute.
    pub fn attr_value(&self, name: &str) -> Option<f32> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| match a.value {
                AttrValue::Float(v) => v,
                AttrValue::Int(v) => v as f32,
            })
    }

    pub fn attr_by_name(&self, name: &str) -> Option<AttrHandle> {
        self.attrs
            .iter()
            .position(|a| a.name == name)
            .map(|i| AttrHandle(i as u32))
    }

    pub fn pin_by_name(&self, name: &str) -> Option<PinHandle> {
        self.pins
            .iter()
            .position(|p| p.name == name)
            .map(|i| PinHandle(i as u32))
    }

    pub fn pin_mode(&self, pin: PinHandle) -> Option<PinMode> {
        self.pins.get(pin.0 as usize).map(|p| p.mode)
    }

    /// Voltage on a pin looked up by name.
    pub fn pin_voltage(&self, name: &str) -> Option<f32> {
        self.pins.iter().find(|p| p.name == name).map(|p| p.voltage)
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn timer_armed(&self, timer: TimerHandle) -> bool {
        self.timers
            .get(timer.0 as usize)
            .is_some_and(|t| t.due_ns.is_some())
    }

    /// Pop the earliest timer due at or before `deadline_ns`.
    ///
    /// The clock jumps to the timer's due time, and a repeating timer is
    /// re-armed one period later. Ties go to the lower handle. A repeat that
    /// would land past the end of the clock disarms the timer instead.
    pub fn poll_due(&mut self, deadline_ns: u64) -> Option<DueTimer> {
        let (index, due_ns) = self
            .timers
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.due_ns.map(|due| (i, due)))
            .filter(|&(_, due)| due <= deadline_ns)
            .min_by_key(|&(i, due)| (due, i))?;

        let timer = &mut self.timers[index];
        self.now_ns = self.now_ns.max(due_ns);
        timer.due_ns = if timer.repeat {
            due_ns.checked_add(timer.period_ns)
        } else {
            None
        };
        if timer.repeat && timer.due_ns.is_none() {
            warn!(timer = index, "clock exhausted, repeating timer disarmed");
        }

        Some(DueTimer {
            handle: TimerHandle(index as u32),
            owner: timer.owner,
            at_ns: due_ns,
        })
    }

    /// Move the clock forward to `deadline_ns` without firing anything.
    pub fn advance_to(&mut self, deadline_ns: u64) {
        self.now_ns = self.now_ns.max(deadline_ns);
    }

    fn preset(&self, name: &str) -> Option<f32> {
        self.presets.get(name).copied()
    }

    fn register_attr(&mut self, name: &str, value: AttrValue) -> AttrHandle {
        if let Some(index) = self.attrs.iter().position(|a| a.name == name) {
            warn!(attr = name, "attribute registered twice, keeping first value");
            return AttrHandle(index as u32);
        }
        self.attrs.push(Attr {
            name: name.to_string(),
            value,
        });
        AttrHandle((self.attrs.len() - 1) as u32)
    }
}

impl ChipHost for SimHost {
    fn pin_init(&mut self, name: &str, mode: PinMode) -> PinHandle {
        if let Some(index) = self.pins.iter().position(|p| p.name == name) {
            self.pins[index].mode = mode;
            return PinHandle(index as u32);
        }
        self.pins.push(Pin {
            name: name.to_string(),
            mode,
            voltage: 0.0,
        });
        let handle = PinHandle((self.pins.len() - 1) as u32);
        debug!(pin = name, %handle, ?mode, "pin registered");
        handle
    }

    fn pin_dac_write(&mut self, pin: PinHandle, voltage: f32) {
        match self.pins.get_mut(pin.0 as usize) {
            Some(p) => p.voltage = voltage,
            None => warn!(%pin, "dac write to unknown pin"),
        }
    }

    fn pin_adc_read(&self, pin: PinHandle) -> f32 {
        match self.pins.get(pin.0 as usize) {
            Some(p) => p.voltage,
            None => {
                warn!(%pin, "adc read from unknown pin");
                0.0
            }
        }
    }

    fn attr_init_float(&mut self, name: &str, default: f32) -> AttrHandle {
        let value = self.preset(name).unwrap_or(default);
        self.register_attr(name, AttrValue::Float(value))
    }

    fn attr_read_float(&self, attr: AttrHandle) -> f32 {
        match self.attrs.get(attr.0 as usize).map(|a| a.value) {
            Some(AttrValue::Float(v)) => v,
            Some(AttrValue::Int(v)) => v as f32,
            None => {
                warn!(%attr, "read of unknown attribute");
                0.0
            }
        }
    }

    fn attr_init(&mut self, name: &str, default: u32) -> AttrHandle {
        let value = self.preset(name).map(|v| v as u32).unwrap_or(default);
        self.register_attr(name, AttrValue::Int(value))
    }

    fn attr_read(&self, attr: AttrHandle) -> u32 {
        match self.attrs.get(attr.0 as usize).map(|a| a.value) {
            Some(AttrValue::Int(v)) => v,
            Some(AttrValue::Float(v)) => v as u32,
            None => {
                warn!(%attr, "read of unknown attribute");
                0
            }
        }
    }

    fn timer_init(&mut self) -> TimerHandle {
        self.timers.push(Timer {
            owner: self.owner,
            period_ns: 0,
            repeat: false,
            due_ns: None,
        });
        TimerHandle((self.timers.len() - 1) as u32)
    }

    fn timer_start_ns(&mut self, timer: TimerHandle, nanos: u64, repeat: bool) {
        let now = self.now_ns;
        let Some(t) = self.timers.get_mut(timer.0 as usize) else {
            warn!(%timer, "start of unknown timer");
            return;
        };
        let repeat = if repeat && nanos == 0 {
            warn!(%timer, "zero-period repeating timer, running it once");
            false
        } else {
            repeat
        };
        t.period_ns = nanos;
        t.repeat = repeat;
        t.due_ns = now.checked_add(nanos);
        if t.due_ns.is_none() {
            warn!(%timer, nanos, "due time past end of clock, timer not armed");
            return;
        }
        debug!(%timer, nanos, repeat, "timer started");
    }

    fn timer_stop(&mut self, timer: TimerHandle) {
        match self.timers.get_mut(timer.0 as usize) {
            Some(t) => t.due_ns = None,
            None => warn!(%timer, "stop of unknown timer"),
        }
    }

    fn sim_nanos(&self) -> u64 {
        self.now_ns
    }
}
