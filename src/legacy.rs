//! Sentinel-returning free-function API mirroring the reference
//! implementation's external interface (`rdt_network_init`, `rdt_socket`,
//! `rdt_bind`, `rdt_peer`, `rdt_send`, `rdt_recv`, `rdt_close`).
//!
//! These wrap a single process-wide [`RdtSocket`] behind a mutex, since the
//! original interface is a set of free functions operating on implicit
//! global state rather than a value a caller holds on to. New code should
//! prefer [`crate::RdtSocket`] directly; this module exists for callers that
//! need the literal original call shape.

use std::sync::{Mutex, OnceLock};

use tracing::error;

use crate::config::NetworkConfig;
use crate::connection::{ProtocolVariant, RdtSocket};

/// Negative sentinel returned on failure, matching the reference API.
pub const RDT_ERROR: i32 = -1;

fn slot() -> &'static Mutex<Option<RdtSocket>> {
    static SLOT: OnceLock<Mutex<Option<RdtSocket>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

/// `rdt_network_init`: seeds the process-wide loss/corruption configuration
/// used by the next `rdt_socket` call. Does not touch an existing socket.
static PENDING_CONFIG: Mutex<Option<NetworkConfig>> = Mutex::new(None);

pub fn rdt_network_init(loss_rate: f64, err_rate: f64, window: usize) -> i32 {
    match NetworkConfig::new(loss_rate, err_rate, window) {
        Ok(cfg) => {
            *PENDING_CONFIG.lock().unwrap() = Some(cfg);
            0
        }
        Err(e) => {
            error!(error = %e, "rdt_network_init: invalid configuration");
            RDT_ERROR
        }
    }
}

/// `rdt_socket`: creates the process-wide connection, replacing any
/// previous one.
pub fn rdt_socket(variant: ProtocolVariant) -> i32 {
    let config = PENDING_CONFIG.lock().unwrap().take().unwrap_or_default();
    match RdtSocket::new(variant, config) {
        Ok(sock) => {
            *slot().lock().unwrap() = Some(sock);
            0
        }
        Err(e) => {
            error!(error = %e, "rdt_socket: failed to create socket");
            RDT_ERROR
        }
    }
}

/// `rdt_bind`: binds the process-wide connection to `port`.
pub fn rdt_bind(port: u16) -> i32 {
    let mut guard = slot().lock().unwrap();
    match guard.as_mut() {
        Some(sock) => match sock.bind(port) {
            Ok(()) => 0,
            Err(e) => {
                error!(error = %e, "rdt_bind: bind failed");
                RDT_ERROR
            }
        },
        None => {
            error!("rdt_bind: no socket, call rdt_socket first");
            RDT_ERROR
        }
    }
}

/// `rdt_peer`: sets the remote address the process-wide connection targets.
pub fn rdt_peer(host: &str, port: u16) -> i32 {
    let mut guard = slot().lock().unwrap();
    match guard.as_mut() {
        Some(sock) => match sock.set_peer((host, port)) {
            Ok(()) => 0,
            Err(e) => {
                error!(error = %e, "rdt_peer: failed to resolve peer address");
                RDT_ERROR
            }
        },
        None => {
            error!("rdt_peer: no socket, call rdt_socket first");
            RDT_ERROR
        }
    }
}

/// `rdt_send`: returns the number of bytes sent, or [`RDT_ERROR`].
pub fn rdt_send(bytes: &[u8]) -> i32 {
    let mut guard = slot().lock().unwrap();
    match guard.as_mut() {
        Some(sock) => match sock.send(bytes) {
            Ok(n) => n as i32,
            Err(e) => {
                error!(error = %e, "rdt_send: failed");
                RDT_ERROR
            }
        },
        None => {
            error!("rdt_send: no socket, call rdt_socket first");
            RDT_ERROR
        }
    }
}

/// `rdt_recv`: fills `out` (up to `out.len()` bytes) and returns the number
/// of bytes written, or [`RDT_ERROR`].
///
/// The underlying `recv` has already pulled the whole message off the wire
/// by the time this returns, so a payload larger than `out` cannot be
/// recovered on a later call the way the original `recvfrom(sockd, length)`
/// could bound the read up front. Rather than silently drop the excess,
/// this is reported as `RDT_ERROR`; callers must size `out >= PAYLOAD`.
pub fn rdt_recv(out: &mut [u8]) -> i32 {
    let mut guard = slot().lock().unwrap();
    match guard.as_mut() {
        Some(sock) => match sock.recv(out.len()) {
            Ok(payload) => {
                if payload.len() > out.len() {
                    error!(len = payload.len(), cap = out.len(), "rdt_recv: payload larger than out buffer");
                    return RDT_ERROR;
                }
                out[..payload.len()].copy_from_slice(&payload);
                payload.len() as i32
            }
            Err(e) => {
                error!(error = %e, "rdt_recv: failed");
                RDT_ERROR
            }
        },
        None => {
            error!("rdt_recv: no socket, call rdt_socket first");
            RDT_ERROR
        }
    }
}

/// `rdt_close`: drains and releases the process-wide connection.
pub fn rdt_close() -> i32 {
    let sock = slot().lock().unwrap().take();
    match sock {
        Some(sock) => match sock.close() {
            Ok(()) => 0,
            Err(e) => {
                error!(error = %e, "rdt_close: failed");
                RDT_ERROR
            }
        },
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_before_socket_creation_fail_cleanly() {
        // Run in isolation from other legacy tests: the slot is process-wide.
        assert_eq!(rdt_bind(0), RDT_ERROR);
    }
}
