use std::io;

use thiserror::Error;

/// Error taxonomy for the RDT layer.
///
/// Only genuine OS-level I/O failures are represented here; channel-induced
/// loss and corruption are absorbed by the state machines and never surface
/// as an `Err` (see the protocol violation handling in `rdt3`/`rdt4`).
#[derive(Debug, Error)]
pub enum RdtError {
    #[error("socket I/O error: {0}")]
    Socket(#[from] io::Error),

    #[error("send attempted before peer address was set")]
    PeerNotSet,

    #[error("payload of {len} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("message of {len} bytes exceeds the window capacity of {max} bytes (W * PAYLOAD)")]
    WindowExceeded { len: usize, max: usize },

    #[error("invalid network configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, RdtError>;
