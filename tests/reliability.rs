//! End-to-end tests driving `RdtSocket` over loopback, with the unreliable
//! channel actually dropping and corrupting frames.

use rdt_transport::{NetworkConfig, ProtocolVariant, RdtSocket};

fn connected_pair(variant: ProtocolVariant, config: NetworkConfig) -> (RdtSocket, RdtSocket) {
    let mut a = RdtSocket::new(variant, config).unwrap();
    let mut b = RdtSocket::new(variant, config).unwrap();
    let a_addr = a.local_addr().unwrap();
    let b_addr = b.local_addr().unwrap();
    a.set_peer(b_addr).unwrap();
    b.set_peer(a_addr).unwrap();
    (a, b)
}

#[test]
fn rdt3_survives_heavy_loss_and_corruption() {
    let config = NetworkConfig::new(0.3, 0.2, 1).unwrap();
    let (mut sender, mut receiver) = connected_pair(ProtocolVariant::Rdt3, config);

    let messages: Vec<Vec<u8>> = (0..20).map(|i| format!("message-{i}").into_bytes()).collect();
    let expected = messages.clone();

    let received = std::thread::scope(|scope| {
        let sender_handle = scope.spawn(move || {
            for msg in &messages {
                sender.send(msg).unwrap();
            }
            sender
        });
        let mut got = Vec::new();
        for _ in 0..expected.len() {
            got.push(receiver.recv(64).unwrap());
        }
        let sender = sender_handle.join().unwrap();
        sender.close().unwrap();
        got
    });

    assert_eq!(received, expected);
    receiver.close().unwrap();
}

#[test]
fn rdt4_delivers_in_order_under_loss_with_pipelining() {
    let config = NetworkConfig::new(0.15, 0.1, 8).unwrap();
    let (mut sender, mut receiver) = connected_pair(ProtocolVariant::Rdt4, config);

    let payload = vec![7u8; 1000 * 6 + 321];
    let expected = payload.clone();

    let reassembled = std::thread::scope(|scope| {
        let sender_handle = scope.spawn(move || {
            let sent = sender.send(&payload).unwrap();
            (sender, sent)
        });
        let mut buf = Vec::new();
        while buf.len() < expected.len() {
            buf.extend(receiver.recv(8000).unwrap());
        }
        let (sender, sent) = sender_handle.join().unwrap();
        sender.close().unwrap();
        (buf, sent)
    });

    assert_eq!(reassembled.0, expected);
    assert_eq!(reassembled.1, expected.len());
    receiver.close().unwrap();
}

#[test]
fn rdt4_sequence_number_wraps_around_mod_256() {
    let config = NetworkConfig::new(0.0, 0.0, 4).unwrap();
    let (mut sender, mut receiver) = connected_pair(ProtocolVariant::Rdt4, config);

    // 70 batches of 4 frames each walks next_seq_num past 256 and back to 0.
    let batch = vec![9u8; 1000 * 4];
    let rounds = 70;
    let expected_total = batch.len() * rounds;

    std::thread::scope(|scope| {
        let sender_handle = scope.spawn(move || {
            for _ in 0..rounds {
                sender.send(&batch).unwrap();
            }
            sender
        });
        let mut total = 0usize;
        while total < expected_total {
            total += receiver.recv(8000).unwrap().len();
        }
        assert_eq!(total, expected_total);
        let sender = sender_handle.join().unwrap();
        sender.close().unwrap();
    });
    receiver.close().unwrap();
}

#[test]
fn close_is_quiescent_and_returns_promptly_with_no_peer_traffic() {
    let config = NetworkConfig::default();
    let sock = RdtSocket::new(ProtocolVariant::Rdt3, config).unwrap();
    let start = std::time::Instant::now();
    sock.close().unwrap();
    // TWAIT is 500ms; closing with nothing in flight should not hang far
    // beyond that single drain window.
    assert!(start.elapsed() < std::time::Duration::from_secs(2));
}

#[test]
fn rdt3_rejects_oversized_single_message_by_truncating() {
    let config = NetworkConfig::default();
    let (mut sender, mut receiver) = connected_pair(ProtocolVariant::Rdt3, config);
    let oversized = vec![3u8; rdt_transport::frame::PAYLOAD * 2];

    std::thread::scope(|scope| {
        let sender_handle = scope.spawn(move || {
            let sent = sender.send(&oversized).unwrap();
            (sender, sent)
        });
        let got = receiver.recv(rdt_transport::frame::PAYLOAD * 2).unwrap();
        assert_eq!(got.len(), rdt_transport::frame::PAYLOAD);
        let (sender, sent) = sender_handle.join().unwrap();
        assert_eq!(sent, rdt_transport::frame::PAYLOAD);
        sender.close().unwrap();
    });
    receiver.close().unwrap();
}
