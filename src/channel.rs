//! Unreliable channel shim: wraps a datagram socket and optionally injects
//! loss and single-byte corruption at configured rates. This instrumentation
//! exists for testing the state machines in `rdt3`/`rdt4`; at `loss_rate ==
//! 0.0` and `err_rate == 0.0` it behaves as a plain pass-through.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::config::NetworkConfig;
use crate::error::Result;

pub struct UnreliableChannel {
    socket: UdpSocket,
    config: NetworkConfig,
    rng: StdRng,
}

impl UnreliableChannel {
    /// Wraps `socket`, seeding the loss/corruption RNG from OS entropy.
    pub fn new(socket: UdpSocket, config: NetworkConfig) -> Self {
        Self::with_rng(socket, config, StdRng::from_os_rng())
    }

    /// Wraps `socket` with an explicitly seeded RNG, for reproducible tests.
    pub fn with_rng(socket: UdpSocket, config: NetworkConfig, rng: StdRng) -> Self {
        Self { socket, config, rng }
    }

    pub fn set_config(&mut self, config: NetworkConfig) {
        self.config = config;
    }

    pub fn set_read_timeout(&self, duration: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(duration)?;
        Ok(())
    }

    /// Sends `bytes` to `peer`, simulating loss and corruption per the
    /// configured rates. Returns the number of bytes the caller should treat
    /// as "sent" (always `bytes.len()`, even when the datagram is dropped --
    /// the caller can't observe the drop at this layer, exactly like a real
    /// unreliable network).
    pub fn udt_send(&mut self, peer: SocketAddr, bytes: &[u8]) -> Result<usize> {
        let drop: f64 = self.rng.random();
        if drop < self.config.loss_rate {
            warn!(len = bytes.len(), "udt_send: packet lost in unreliable layer");
            return Ok(bytes.len());
        }

        let corrupt: f64 = self.rng.random();
        if corrupt < self.config.err_rate && !bytes.is_empty() {
            let mut mutated = bytes.to_vec();
            let pos = self.rng.random_range(0..mutated.len());
            mutated[pos] = if mutated[pos] >= 2 { mutated[pos] - 2 } else { 254 };
            warn!(len = bytes.len(), pos, "udt_send: packet corrupted in unreliable layer");
            return Ok(self.socket.send_to(&mutated, peer)?);
        }

        Ok(self.socket.send_to(bytes, peer)?)
    }

    /// Blocking receive of up to `max_len` bytes, discarding the source
    /// address (the protocol presumes a single fixed peer).
    pub fn udt_recv(&self, max_len: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let (n, _src) = self.socket.recv_from(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, FrameType};

    fn loopback_pair() -> (UnreliableChannel, UnreliableChannel) {
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        let cfg = NetworkConfig::default();
        (
            UnreliableChannel::with_rng(a, cfg, StdRng::seed_from_u64(1)),
            UnreliableChannel::with_rng(b, cfg, StdRng::seed_from_u64(2)),
        )
    }

    #[test]
    fn clean_channel_delivers_bytes_unmodified() {
        let (mut sender, receiver) = loopback_pair();
        let dest = receiver.local_addr().unwrap();
        let frame = Frame::pack(FrameType::Data, 0, b"payload");
        sender.udt_send(dest, &frame.to_bytes()).unwrap();
        let got = receiver.udt_recv(2000).unwrap();
        assert_eq!(got, frame.to_bytes());
    }

    #[test]
    fn full_loss_rate_sends_nothing() {
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        b.set_read_timeout(Some(Duration::from_millis(50))).unwrap();
        let cfg = NetworkConfig::new(1.0, 0.0, 1).unwrap();
        let mut sender = UnreliableChannel::with_rng(a, cfg, StdRng::seed_from_u64(1));
        let dest = b.local_addr().unwrap();
        let sent = sender.udt_send(dest, b"x").unwrap();
        assert_eq!(sent, 1);
        let mut buf = [0u8; 16];
        assert!(b.recv_from(&mut buf).is_err());
    }

    #[test]
    fn full_err_rate_flips_one_byte() {
        let (mut sender, receiver) = loopback_pair();
        sender.set_config(NetworkConfig::new(0.0, 1.0, 1).unwrap());
        let dest = receiver.local_addr().unwrap();
        let frame = Frame::pack(FrameType::Data, 0, b"payload");
        sender.udt_send(dest, &frame.to_bytes()).unwrap();
        let got = receiver.udt_recv(2000).unwrap();
        assert_ne!(got, frame.to_bytes());
        assert_eq!(got.len(), frame.to_bytes().len());
    }
}
