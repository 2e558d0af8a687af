//! Framing-level tests: checksum validation, acknowledgments, and the
//! delimiter scan, driven over in-memory byte streams.

use super::*;
use crate::memory::{MemoryMap, MemoryRegion};
use crate::snapshot::Snapshot;

use proptest::prelude::*;

fn snapshot() -> Snapshot {
    let mut mem = MemoryMap::new();
    mem.push(MemoryRegion::new(0x4021_1000, vec![0x11, 0x22, 0x33, 0x44]).unwrap());
    Snapshot {
        mem,
        regs: vec![0xde, 0xad],
    }
}

fn frame(payload: &str) -> String {
    format!("${}#{:02x}", payload, checksum(payload.as_bytes()))
}

fn run_session(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GdbSession::new(input, &mut out, snapshot()).run().unwrap();
    out
}

#[test]
fn test_valid_packet_is_acked_and_dispatched() {
    let out = run_session(frame("g").as_bytes());
    let expected = format!("+{}", frame("dead"));
    assert_eq!(out, expected.as_bytes());
}

#[test]
fn test_bad_checksum_is_nacked_without_dispatch() {
    // checksum of "g" is 67, not 00
    let out = run_session(b"$g#00");
    assert_eq!(out, b"-");
}

#[test]
fn test_session_recovers_after_bad_checksum() {
    let input = format!("$g#00{}", frame("g"));
    let out = run_session(input.as_bytes());
    let expected = format!("-+{}", frame("dead"));
    assert_eq!(out, expected.as_bytes());
}

#[test]
fn test_bytes_before_packet_start_are_discarded() {
    // Serial noise and the acks GDB sends for our own responses
    let input = format!("++garbage-{}", frame("g"));
    let out = run_session(input.as_bytes());
    let expected = format!("+{}", frame("dead"));
    assert_eq!(out, expected.as_bytes());
}

#[test]
fn test_unknown_command_yields_empty_framed_response() {
    let out = run_session(frame("zZZ").as_bytes());
    assert_eq!(out, b"+$#00");
}

#[test]
fn test_memory_read_over_the_wire() {
    let out = run_session(frame("m40211000,4").as_bytes());
    let expected = format!("+{}", frame("11223344"));
    assert_eq!(out, expected.as_bytes());
}

#[test]
fn test_register_overwrite_persists_within_session() {
    let input = format!("{}{}", frame("G0102"), frame("g"));
    let out = run_session(input.as_bytes());
    let expected = format!("+{}+{}", frame("OK"), frame("0102"));
    assert_eq!(out, expected.as_bytes());
}

#[test]
fn test_eof_without_packet() {
    assert_eq!(run_session(b""), b"");
    assert_eq!(run_session(b"no packet here"), b"");
}

#[test]
fn test_eof_mid_packet_ends_session_cleanly() {
    assert_eq!(run_session(b"$g"), b"");
    assert_eq!(run_session(b"$g#"), b"");
    assert_eq!(run_session(b"$g#6"), b"");
}

#[test]
fn test_non_hex_checksum_digits_are_a_mismatch() {
    assert_eq!(run_session(b"$g#zz"), b"-");
}

proptest! {
    #[test]
    fn prop_checksum_is_sum_mod_256(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
        let expected = (payload.iter().map(|b| *b as u32).sum::<u32>() % 256) as u8;
        prop_assert_eq!(checksum(&payload), expected);
    }

    #[test]
    fn prop_hex_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let encoded = hex::encode(&bytes);
        prop_assert_eq!(encoded.len(), bytes.len() * 2);
        prop_assert_eq!(hex::decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn prop_responses_are_well_framed(cmd in "[a-zA-Z0-9,:]{0,12}") {
        let out = run_session(frame(&cmd).as_bytes());
        // ack, then $payload#checksum
        prop_assert_eq!(out[0], b'+');
        prop_assert_eq!(out[1], b'$');
        let hash = out.iter().rposition(|b| *b == b'#').unwrap();
        let payload = &out[2..hash];
        let digits = std::str::from_utf8(&out[hash + 1..]).unwrap();
        prop_assert_eq!(digits.len(), 2);
        prop_assert_eq!(u8::from_str_radix(digits, 16).unwrap(), checksum(payload));
    }
}
