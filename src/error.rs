//! Error kinds for the fatal/propagated paths of this core.
//!
//! Runtime operator mistakes and invariant breaches aren't represented
//! here: they get absorbed (logged, then the call proceeds as a no-op)
//! rather than unwound. `PpError` covers only the fatal configuration
//! errors and the I/O failures that back them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PpError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("duplicate unit {unit} on equipment {eq} channel {chan}")]
    DuplicateUnit { chan: u8, eq: u8, unit: u8 },

    #[error("unknown controller type {0:?}")]
    UnknownController(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed device-init parameter string {0:?}")]
    BadInitString(String),

    #[error("malformed removePaper argument {0:?}")]
    BadPaperArg(String),

    #[error("no such device slot for chan {chan} eq {eq}")]
    NoSuchSlot { chan: u8, eq: u8 },
}

pub type PpResult<T> = Result<T, PpError>;
