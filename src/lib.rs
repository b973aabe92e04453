//! Reliable data transfer over an unreliable UDP channel.
//!
//! Implements two textbook protocols from Kurose & Ross's transport layer
//! chapter as real, runnable Rust:
//!
//! - **RDT-3** ([`rdt3`]): stop-and-wait with a 1-bit sequence number.
//! - **RDT-4** ([`rdt4`]): Go-Back-N pipelining with an 8-bit sequence
//!   number and a configurable window.
//!
//! [`RdtSocket`] is the primary entry point. [`legacy`] mirrors the
//! reference implementation's free-function API for callers that need that
//! exact shape.

pub mod channel;
pub mod checksum;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod legacy;
pub mod rdt3;
pub mod rdt4;
mod timing;

pub use config::NetworkConfig;
pub use connection::{ProtocolVariant, RdtSocket};
pub use error::{RdtError, Result};
pub use timing::{TIMEOUT, TWAIT};
