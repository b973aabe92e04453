//! RDT-3 (stop-and-wait, 1-bit sequence number) sender and receiver state
//! machines, operating on a single [`UnreliableChannel`] and peer address.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::SocketAddr;

use tracing::{debug, trace, warn};

use crate::channel::UnreliableChannel;
use crate::error::{RdtError, Result};
use crate::frame::{Frame, FrameType, HEADER_SIZE, PAYLOAD};
use crate::timing::TIMEOUT;

/// Mutable state shared by `send`/`recv`/`close` for one RDT-3 connection.
#[derive(Debug, Default)]
pub struct Rdt3State {
    send_state: u8,
    recv_state: u8,
    last_ack_num: Option<u8>,
    /// DATA frames received from the peer while we were waiting for our own
    /// ACK; drained by the next `recv` before it touches the wire.
    data_buffer: VecDeque<Frame>,
}

impl Rdt3State {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// `rdt_send`: transmits one DATA frame and blocks until the matching ACK
/// arrives, retransmitting on timeout and buffering any opportunistic DATA
/// that arrives from the peer in the meantime.
pub fn send(
    channel: &mut UnreliableChannel,
    peer: SocketAddr,
    state: &mut Rdt3State,
    bytes_msg: &[u8],
) -> Result<usize> {
    let msg = if bytes_msg.len() > PAYLOAD { &bytes_msg[..PAYLOAD] } else { bytes_msg };
    let frame = Frame::pack(FrameType::Data, state.send_state, msg);
    let wire = frame.to_bytes();

    channel.udt_send(peer, &wire)?;
    debug!(seq = state.send_state, len = msg.len(), "rdt3::send: sent data frame");

    loop {
        channel.set_read_timeout(Some(TIMEOUT))?;
        match channel.udt_recv(PAYLOAD + HEADER_SIZE) {
            Ok(raw) => {
                let Some(incoming) = Frame::unpack(&raw) else {
                    trace!("rdt3::send: dropped malformed frame");
                    continue;
                };
                if incoming.is_corrupt() {
                    warn!("rdt3::send: received a corrupted packet, ignoring");
                    continue;
                }
                match incoming.frame_type {
                    FrameType::Ack if incoming.seq == 1 - state.send_state => {
                        trace!(seq = incoming.seq, "rdt3::send: duplicate old ACK, ignoring");
                    }
                    FrameType::Ack if incoming.seq == state.send_state => {
                        debug!(seq = incoming.seq, "rdt3::send: received expected ACK");
                        state.send_state ^= 1;
                        return Ok(msg.len());
                    }
                    FrameType::Ack => {
                        trace!(seq = incoming.seq, "rdt3::send: ACK with unexpected seq, ignoring");
                    }
                    FrameType::Data => {
                        if !state.data_buffer.iter().any(|f| f.seq == incoming.seq) {
                            state.data_buffer.push_back(incoming.clone());
                        }
                        channel.udt_send(peer, &Frame::ack(incoming.seq).to_bytes())?;
                        state.last_ack_num = Some(incoming.seq);
                        debug!(seq = incoming.seq, "rdt3::send: ACKed opportunistic DATA from peer");
                    }
                }
            }
            Err(e) if is_timeout(&e) => {
                channel.udt_send(peer, &wire)?;
                debug!(seq = state.send_state, "rdt3::send: timeout, retransmitting");
            }
            Err(e) => return Err(RdtError::Socket(e)),
        }
    }
}

/// `rdt_recv`: drains any buffered DATA, then blocks on the wire for the
/// next in-order payload.
pub fn recv(
    channel: &mut UnreliableChannel,
    peer: SocketAddr,
    state: &mut Rdt3State,
) -> Result<Vec<u8>> {
    while let Some(buffered) = state.data_buffer.pop_front() {
        if buffered.seq == state.recv_state {
            state.recv_state ^= 1;
            debug!(seq = buffered.seq, "rdt3::recv: delivered buffered frame");
            return Ok(buffered.payload);
        }
        trace!(seq = buffered.seq, "rdt3::recv: dropped stale buffered frame");
    }

    channel.set_read_timeout(None)?;
    loop {
        let raw = channel.udt_recv(PAYLOAD + HEADER_SIZE)?;
        let Some(incoming) = Frame::unpack(&raw) else {
            trace!("rdt3::recv: dropped malformed frame");
            continue;
        };

        if incoming.is_corrupt() || incoming.seq == 1 - state.recv_state {
            let stale_seq = 1 - state.recv_state;
            channel.udt_send(peer, &Frame::ack(stale_seq).to_bytes())?;
            state.last_ack_num = Some(stale_seq);
            warn!(seq = incoming.seq, "rdt3::recv: corrupt or resent old DATA, re-ACKing");
        } else if incoming.frame_type == FrameType::Data && incoming.seq == state.recv_state {
            channel.udt_send(peer, &Frame::ack(state.recv_state).to_bytes())?;
            state.last_ack_num = Some(state.recv_state);
            state.recv_state ^= 1;
            debug!(seq = incoming.seq, "rdt3::recv: delivered expected DATA");
            return Ok(incoming.payload);
        } else {
            trace!(frame_type = ?incoming.frame_type, "rdt3::recv: unexpected ACK, ignoring");
        }
    }
}

/// `rdt_close`: drains any late traffic for TWAIT, re-ACKing resent DATA,
/// before releasing the socket.
pub fn close(channel: &mut UnreliableChannel, peer: SocketAddr, state: &Rdt3State) {
    use crate::timing::TWAIT;

    loop {
        if channel.set_read_timeout(Some(TWAIT)).is_err() {
            break;
        }
        match channel.udt_recv(PAYLOAD + HEADER_SIZE) {
            Ok(raw) => {
                if let Some(incoming) = Frame::unpack(&raw) {
                    if !incoming.is_corrupt()
                        && incoming.frame_type == FrameType::Data
                        && Some(incoming.seq) == state.last_ack_num
                    {
                        if let Err(e) = channel.udt_send(peer, &Frame::ack(incoming.seq).to_bytes()) {
                            warn!(error = %e, "rdt3::close: failed to re-ACK during drain, continuing");
                            continue;
                        }
                        debug!(seq = incoming.seq, "rdt3::close: re-ACKed late DATA");
                    }
                }
            }
            Err(e) if is_timeout(&e) => {
                debug!(?TWAIT, "rdt3::close: quiescent, releasing socket");
                break;
            }
            Err(e) => {
                warn!(error = %e, "rdt3::close: I/O error during drain, releasing socket anyway");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::net::UdpSocket;

    fn harness() -> (UnreliableChannel, SocketAddr, UnreliableChannel, SocketAddr) {
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b_addr = b.local_addr().unwrap();
        let a_addr = a.local_addr().unwrap();
        let cfg = NetworkConfig::default();
        (
            UnreliableChannel::with_rng(a, cfg, StdRng::seed_from_u64(11)),
            b_addr,
            UnreliableChannel::with_rng(b, cfg, StdRng::seed_from_u64(22)),
            a_addr,
        )
    }

    #[test]
    fn clean_send_recv_round_trip_toggles_state() {
        let (mut sender_chan, recv_addr, mut recv_chan, send_addr) = harness();
        let mut sender_state = Rdt3State::new();
        let mut recv_state = Rdt3State::new();

        let sent = std::thread::scope(|scope| {
            let handle = scope.spawn(|| send(&mut sender_chan, recv_addr, &mut sender_state, b"hello"));
            let payload = recv(&mut recv_chan, send_addr, &mut recv_state).unwrap();
            assert_eq!(payload, b"hello");
            handle.join().unwrap()
        });
        assert_eq!(sent.unwrap(), 5);
        assert_eq!(sender_state.send_state, 1);
        assert_eq!(recv_state.recv_state, 1);
    }

    #[test]
    fn truncates_oversized_payload() {
        let (mut sender_chan, recv_addr, mut recv_chan, send_addr) = harness();
        let mut sender_state = Rdt3State::new();
        let mut recv_state = Rdt3State::new();
        let big = vec![b'x'; PAYLOAD + 200];

        let sent = std::thread::scope(|scope| {
            let handle = scope.spawn(|| send(&mut sender_chan, recv_addr, &mut sender_state, &big));
            let payload = recv(&mut recv_chan, send_addr, &mut recv_state).unwrap();
            assert_eq!(payload.len(), PAYLOAD);
            handle.join().unwrap()
        });
        assert_eq!(sent.unwrap(), PAYLOAD);
    }
}
