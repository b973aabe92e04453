//! Property-based tests for the wire frame codec.

use proptest::prelude::*;
use rdt_transport::frame::{Frame, FrameType, PAYLOAD};

proptest! {
    #[test]
    fn pack_then_unpack_preserves_seq_and_payload(seq: u8, payload in proptest::collection::vec(any::<u8>(), 0..=PAYLOAD)) {
        let frame = Frame::pack(FrameType::Data, seq, &payload);
        let bytes = frame.to_bytes();
        let parsed = Frame::unpack(&bytes).expect("well-formed frame parses");
        prop_assert_eq!(parsed.seq, seq);
        prop_assert_eq!(parsed.payload, payload);
        prop_assert!(!parsed.is_corrupt());
    }

    #[test]
    fn flipping_any_single_byte_outside_the_length_field_is_detected_as_corrupt(
        seq: u8,
        payload in proptest::collection::vec(any::<u8>(), 1..=64),
        flip_index in 0usize..70,
    ) {
        let frame = Frame::pack(FrameType::Data, seq, &payload);
        let mut bytes = frame.to_bytes();
        // Skip the payload_len bytes (indices 4, 5): flipping them changes
        // how many bytes `unpack` treats as payload, which is a framing
        // concern distinct from checksum corruption detection.
        let non_length_len = bytes.len() - 2;
        let idx = flip_index % non_length_len;
        let idx = if idx >= 4 { idx + 2 } else { idx };
        bytes[idx] ^= 0x01;
        let parsed = Frame::unpack(&bytes).expect("still a structurally valid frame");
        prop_assert!(parsed.is_corrupt());
    }
}
