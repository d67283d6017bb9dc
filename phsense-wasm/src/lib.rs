use phsense_core::{SimHost, TimerHandle};

/// Error type for chip runtime failures
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("WASM runtime error: {0}")]
    Wasm(String),
    #[error("Missing export: {0}")]
    MissingExport(String),
    #[error("Bad guest pointer: {0:#x}")]
    BadPointer(u32),
    #[error("Timer {0} has no callback binding")]
    UnknownTimer(TimerHandle),
}

impl RuntimeError {
    /// Recover a typed error raised by a host import, or wrap whatever the
    /// engine reported.
    pub(crate) fn from_trap(err: anyhow::Error) -> Self {
        match err.downcast::<RuntimeError>() {
            Ok(typed) => typed,
            Err(other) => RuntimeError::Wasm(format!("{other:#}")),
        }
    }
}

/// A loaded chip together with the host it runs against.
pub trait ChipInstance {
    /// Advance simulated time, firing every timer that comes due.
    fn run_for(&mut self, micros: u64) -> Result<(), RuntimeError>;

    fn host(&self) -> &SimHost;

    fn host_mut(&mut self) -> &mut SimHost;
}

/// Abstract interface for a chip runtime
pub trait ChipRuntime {
    type Instance: ChipInstance;

    /// Name of the runtime (e.g., "wasmtime")
    fn name(&self) -> &str;

    /// Instantiate a chip module and run its `chip_init`.
    ///
    /// * `payload`: the compiled chip (WASM binary, or WAT text)
    /// * `host`: host state the chip registers into; may carry attribute presets
    fn load(&self, payload: &[u8], host: SimHost) -> Result<Self::Instance, RuntimeError>;
}

pub mod wasm;

pub use wasm::{WasmChip, WasmTimeRuntime};
