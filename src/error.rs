use phsense_wasm::RuntimeError;

/// Error type for simulation and CLI plumbing. Chip code never sees these.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Unknown pin: {0}")]
    UnknownPin(String),
    #[error("Unknown attribute: {0}")]
    UnknownAttr(String),
    #[error("Invalid config: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
