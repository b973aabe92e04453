//! RDT-4 (Go-Back-N, 8-bit sequence number, window `W`) sender and receiver
//! state machines, operating on a single [`UnreliableChannel`] and peer
//! address.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::SocketAddr;

use tracing::{debug, trace, warn};

use crate::channel::UnreliableChannel;
use crate::error::{RdtError, Result};
use crate::frame::{Frame, FrameType, HEADER_SIZE, PAYLOAD};
use crate::timing::TIMEOUT;

/// Mutable state shared by `send`/`recv`/`close` for one RDT-4 connection.
#[derive(Debug, Default)]
pub struct Rdt4State {
    next_seq_num: u8,
    exp_seq_num: u8,
    /// In-order DATA frames accepted by the receiver side ahead of the
    /// matching `recv` call.
    data_buffer: VecDeque<Frame>,
}

impl Rdt4State {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// `rdt_send`: splits `bytes_msg` into up to `window` DATA frames, sends them
/// as a batch, and blocks until they are all cumulatively ACKed,
/// go-back-N-retransmitting the unacked tail on timeout.
pub fn send(
    channel: &mut UnreliableChannel,
    peer: SocketAddr,
    state: &mut Rdt4State,
    window: usize,
    bytes_msg: &[u8],
) -> Result<usize> {
    if bytes_msg.is_empty() {
        return Ok(0);
    }

    let max_len = window * PAYLOAD;
    if bytes_msg.len() > max_len {
        return Err(RdtError::WindowExceeded { len: bytes_msg.len(), max: max_len });
    }

    let base = state.next_seq_num;
    let frames: Vec<Frame> = bytes_msg
        .chunks(PAYLOAD)
        .enumerate()
        .map(|(i, chunk)| Frame::pack(FrameType::Data, base.wrapping_add(i as u8), chunk))
        .collect();
    let n = frames.len();

    for frame in &frames {
        channel.udt_send(peer, &frame.to_bytes())?;
    }
    debug!(base, n, len = bytes_msg.len(), "rdt4::send: sent batch");
    state.next_seq_num = base.wrapping_add(n as u8);

    let mut first_unacked = 0usize;
    loop {
        channel.set_read_timeout(Some(TIMEOUT))?;
        match channel.udt_recv(PAYLOAD + HEADER_SIZE) {
            Ok(raw) => {
                let Some(incoming) = Frame::unpack(&raw) else {
                    trace!("rdt4::send: dropped malformed frame");
                    continue;
                };
                if incoming.is_corrupt() {
                    warn!("rdt4::send: received a corrupted packet, ignoring");
                    continue;
                }
                match incoming.frame_type {
                    FrameType::Ack => {
                        let offset = incoming.seq.wrapping_sub(base) as usize;
                        if offset >= n {
                            trace!(seq = incoming.seq, "rdt4::send: ACK outside current batch, ignoring");
                            continue;
                        }
                        if offset == n - 1 {
                            debug!(seq = incoming.seq, "rdt4::send: batch fully ACKed");
                            return Ok(bytes_msg.len());
                        }
                        first_unacked = first_unacked.max(offset + 1);
                        trace!(seq = incoming.seq, first_unacked, "rdt4::send: cumulative ACK advanced window");
                    }
                    FrameType::Data => {
                        let seq = incoming.seq;
                        if seq == state.exp_seq_num {
                            if !state.data_buffer.iter().any(|f| f.seq == seq) {
                                state.data_buffer.push_back(incoming.clone());
                            }
                            channel.udt_send(peer, &Frame::ack(state.exp_seq_num).to_bytes())?;
                        } else {
                            channel.udt_send(peer, &Frame::ack(state.exp_seq_num.wrapping_sub(1)).to_bytes())?;
                        }
                        debug!(seq, "rdt4::send: ACKed opportunistic DATA from peer");
                    }
                }
            }
            Err(e) if is_timeout(&e) => {
                debug!(first_unacked, n, "rdt4::send: timeout, go-back-N retransmit");
                for frame in &frames[first_unacked..n] {
                    channel.udt_send(peer, &frame.to_bytes())?;
                }
            }
            Err(e) => return Err(RdtError::Socket(e)),
        }
    }
}

/// `rdt_recv`: drains any buffered in-order DATA, then blocks on the wire,
/// ACKing in-order frames cumulatively and re-ACKing the last good sequence
/// number for anything out of order.
pub fn recv(
    channel: &mut UnreliableChannel,
    peer: SocketAddr,
    state: &mut Rdt4State,
) -> Result<Vec<u8>> {
    while let Some(buffered) = state.data_buffer.pop_front() {
        if buffered.seq == state.exp_seq_num {
            state.exp_seq_num = state.exp_seq_num.wrapping_add(1);
            debug!(seq = buffered.seq, "rdt4::recv: delivered buffered frame");
            return Ok(buffered.payload);
        }
        trace!(seq = buffered.seq, "rdt4::recv: dropped stale buffered frame");
    }

    channel.set_read_timeout(None)?;
    loop {
        let raw = channel.udt_recv(PAYLOAD + HEADER_SIZE)?;
        let Some(incoming) = Frame::unpack(&raw) else {
            trace!("rdt4::recv: dropped malformed frame");
            continue;
        };
        if incoming.is_corrupt() || incoming.frame_type == FrameType::Ack {
            trace!(frame_type = ?incoming.frame_type, "rdt4::recv: corrupt frame or unexpected ACK, ignoring");
            continue;
        }

        if incoming.seq == state.exp_seq_num {
            channel.udt_send(peer, &Frame::ack(state.exp_seq_num).to_bytes())?;
            state.exp_seq_num = state.exp_seq_num.wrapping_add(1);
            debug!(seq = incoming.seq, "rdt4::recv: delivered expected DATA");
            return Ok(incoming.payload);
        } else {
            channel.udt_send(peer, &Frame::ack(state.exp_seq_num.wrapping_sub(1)).to_bytes())?;
            trace!(
                seq = incoming.seq,
                expected = state.exp_seq_num,
                "rdt4::recv: out-of-order DATA, re-ACKing last in-order sequence"
            );
        }
    }
}

/// `rdt_close`: drains any late traffic for TWAIT, re-ACKing resent DATA by
/// its own sequence number, before releasing the socket.
pub fn close(channel: &mut UnreliableChannel, peer: SocketAddr, _state: &Rdt4State) {
    use crate::timing::TWAIT;

    loop {
        if channel.set_read_timeout(Some(TWAIT)).is_err() {
            break;
        }
        match channel.udt_recv(PAYLOAD + HEADER_SIZE) {
            Ok(raw) => {
                if let Some(incoming) = Frame::unpack(&raw) {
                    if !incoming.is_corrupt() && incoming.frame_type == FrameType::Data {
                        if let Err(e) = channel.udt_send(peer, &Frame::ack(incoming.seq).to_bytes()) {
                            warn!(error = %e, "rdt4::close: failed to re-ACK during drain, continuing");
                            continue;
                        }
                        debug!(seq = incoming.seq, "rdt4::close: re-ACKed late DATA");
                    }
                }
            }
            Err(e) if is_timeout(&e) => {
                debug!(?TWAIT, "rdt4::close: quiescent, releasing socket");
                break;
            }
            Err(e) => {
                warn!(error = %e, "rdt4::close: I/O error during drain, releasing socket anyway");
                break;
            }
        }
    }
}
