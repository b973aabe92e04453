//! `RdtSocket`: a single connection-oriented handle bundling the unreliable
//! channel, peer address and protocol-specific state. Unlike the reference
//! implementation's module-scope globals, all mutable state lives on this
//! value, so a process can hold more than one connection at a time.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::{info, instrument};

use crate::channel::UnreliableChannel;
use crate::config::NetworkConfig;
use crate::error::{RdtError, Result};
use crate::frame::PAYLOAD;
use crate::rdt3::{self, Rdt3State};
use crate::rdt4::{self, Rdt4State};

/// Which protocol this socket speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
    /// Stop-and-wait, 1-bit sequence numbers.
    Rdt3,
    /// Go-Back-N pipelining, 8-bit sequence numbers, window `config.window`.
    Rdt4,
}

#[derive(Debug)]
enum VariantState {
    Rdt3(Rdt3State),
    Rdt4(Rdt4State),
}

/// One end of a reliable connection over an unreliable UDP channel.
pub struct RdtSocket {
    channel: UnreliableChannel,
    peer_addr: Option<SocketAddr>,
    variant: ProtocolVariant,
    state: VariantState,
    config: NetworkConfig,
}

impl RdtSocket {
    /// `rdt_socket`: creates the underlying datagram socket (bound to an
    /// ephemeral port) and initializes protocol state for `variant`.
    pub fn new(variant: ProtocolVariant, config: NetworkConfig) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Self::from_parts(variant, config, socket)
    }

    fn from_parts(variant: ProtocolVariant, config: NetworkConfig, socket: UdpSocket) -> Result<Self> {
        let state = match variant {
            ProtocolVariant::Rdt3 => VariantState::Rdt3(Rdt3State::new()),
            ProtocolVariant::Rdt4 => VariantState::Rdt4(Rdt4State::new()),
        };
        Ok(Self {
            channel: UnreliableChannel::new(socket, config),
            peer_addr: None,
            variant,
            state,
            config,
        })
    }

    /// `rdt_bind`: rebinds the connection to a specific local port,
    /// preserving protocol state.
    pub fn bind(&mut self, port: u16) -> Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        self.channel = UnreliableChannel::new(socket, self.config);
        info!(port, "rdt_bind: bound to local port");
        Ok(())
    }

    /// Replaces the loss/corruption/window configuration of an existing
    /// connection in place, without touching the underlying socket.
    pub fn set_network_config(&mut self, config: NetworkConfig) {
        self.config = config;
        self.channel.set_config(config);
    }

    /// `rdt_peer`: records the remote address future `send`/`recv` calls
    /// target, without performing any I/O.
    pub fn set_peer<A: ToSocketAddrs>(&mut self, addr: A) -> Result<()> {
        let resolved = addr
            .to_socket_addrs()?
            .next()
            .ok_or(RdtError::InvalidConfig("peer address did not resolve to any socket address"))?;
        self.peer_addr = Some(resolved);
        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.channel.local_addr()?)
    }

    fn peer(&self) -> Result<SocketAddr> {
        self.peer_addr.ok_or(RdtError::PeerNotSet)
    }

    /// `rdt_send`: sends `bytes` reliably to the configured peer, blocking
    /// until delivery is acknowledged. RDT-3 truncates to one `PAYLOAD`-sized
    /// frame per call; RDT-4 accepts up to `config.window * PAYLOAD` bytes.
    #[instrument(skip(self, bytes), fields(variant = ?self.variant))]
    pub fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        let peer = self.peer()?;
        let window = self.config.window;
        let channel = &mut self.channel;
        match &mut self.state {
            VariantState::Rdt3(state) => rdt3::send(channel, peer, state, bytes),
            VariantState::Rdt4(state) => rdt4::send(channel, peer, state, window, bytes),
        }
    }

    /// `rdt_recv`: blocks until the next in-order payload is available and
    /// returns it. `length` mirrors the reference API's buffer-size hint but
    /// is otherwise unused: this implementation returns exactly one
    /// logical message per call instead of filling a fixed buffer.
    #[instrument(skip(self), fields(variant = ?self.variant))]
    pub fn recv(&mut self, length: usize) -> Result<Vec<u8>> {
        let peer = self.peer()?;
        let _ = length.min(PAYLOAD);
        let channel = &mut self.channel;
        match &mut self.state {
            VariantState::Rdt3(state) => rdt3::recv(channel, peer, state),
            VariantState::Rdt4(state) => rdt4::recv(channel, peer, state),
        }
    }

    /// `rdt_close`: drains any late retransmissions for `TWAIT` before
    /// dropping the socket. Consumes `self` since the connection cannot be
    /// reused afterwards.
    #[instrument(skip(self), fields(variant = ?self.variant))]
    pub fn close(mut self) -> Result<()> {
        let Some(peer) = self.peer_addr else {
            info!("rdt_close: no peer was ever set, releasing socket immediately");
            return Ok(());
        };
        let channel = &mut self.channel;
        match &self.state {
            VariantState::Rdt3(state) => rdt3::close(channel, peer, state),
            VariantState::Rdt4(state) => rdt4::close(channel, peer, state),
        }
        Ok(())
    }
}
