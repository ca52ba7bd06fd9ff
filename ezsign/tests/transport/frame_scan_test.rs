use ezsign::constants::PORT100_ACK;
use ezsign::transport::rcs380::frame::{build_frame, extract_response, Scan};
use ezsign::Error;

fn response_frame(cmd_code: u8, body: &[u8]) -> Vec<u8> {
    let mut payload = vec![0xD7, cmd_code + 1];
    payload.extend_from_slice(body);
    build_frame(&payload)
}

#[test]
fn frame_layout_matches_wire_format() {
    let frame = build_frame(&[0xD6, 0x2A, 0x01]);
    // Preamble, little-endian length, length checksum
    assert_eq!(&frame[..5], &[0x00, 0x00, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&frame[5..8], &[0x03, 0x00, 0xFD]);
    // Payload, data checksum, postamble
    assert_eq!(&frame[8..11], &[0xD6, 0x2A, 0x01]);
    assert_eq!(frame[11], 0u8.wrapping_sub(0xD6u8.wrapping_add(0x2A).wrapping_add(0x01)));
    assert_eq!(frame[12], 0x00);
}

#[test]
fn scanner_survives_byte_at_a_time_delivery() {
    let full = response_frame(0x04, &[0, 0, 0, 0, 0xAA, 0x55]);
    let mut buffer = Vec::new();
    for (i, &b) in full.iter().enumerate() {
        buffer.push(b);
        let scan = extract_response(&mut buffer, 0x04).unwrap();
        if i < full.len() - 1 {
            assert_eq!(scan, Scan::Incomplete);
        } else {
            assert_eq!(scan, Scan::Response(vec![0, 0, 0, 0, 0xAA, 0x55]));
        }
    }
}

#[test]
fn scanner_consumes_ack_then_data_in_one_buffer() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&PORT100_ACK);
    buffer.extend_from_slice(&response_frame(0x06, &[0x00]));
    assert_eq!(
        extract_response(&mut buffer, 0x06).unwrap(),
        Scan::Response(vec![0x00])
    );
    assert!(buffer.is_empty());
}

#[test]
fn scanner_drops_noise_between_frames() {
    let mut buffer = vec![0xDE, 0xAD, 0xBE, 0xEF];
    buffer.extend_from_slice(&PORT100_ACK);
    buffer.extend_from_slice(&[0x42]);
    buffer.extend_from_slice(&response_frame(0x20, &[0x15, 0x01]));
    assert_eq!(
        extract_response(&mut buffer, 0x20).unwrap(),
        Scan::Response(vec![0x15, 0x01])
    );
}

#[test]
fn scanner_flags_corrupt_length_checksum() {
    let mut buffer = response_frame(0x06, &[0x00]);
    buffer[7] = buffer[7].wrapping_add(1);
    assert!(matches!(
        extract_response(&mut buffer, 0x06),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn scanner_flags_mismatched_reply_code() {
    let mut buffer = response_frame(0x00, &[]);
    assert!(matches!(
        extract_response(&mut buffer, 0x04),
        Err(Error::UnexpectedResponse { .. })
    ));
}

#[test]
fn large_payload_roundtrips() {
    // An InCommRF response larger than one USB read
    let body: Vec<u8> = (0..1200u32).map(|i| (i % 251) as u8).collect();
    let full = response_frame(0x04, &body);
    let mut buffer = Vec::new();
    for chunk in full.chunks(512) {
        buffer.extend_from_slice(chunk);
    }
    assert_eq!(
        extract_response(&mut buffer, 0x04).unwrap(),
        Scan::Response(body)
    );
}
