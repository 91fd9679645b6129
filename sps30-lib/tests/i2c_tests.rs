//! Register codec tests: pointers, word CRCs, reply decoding.

mod common;

use common::*;
use sps30_lib::i2c::Opcode;

#[test]
fn crc8_matches_reference_vector() {
    // from the sensor interface description
    assert_eq!(i2c::crc8(&[0xBE, 0xEF]), 0x92);
}

#[test]
fn crc8_of_zero_word_is_nonzero() {
    // an all-zero bus reply can never carry a valid CRC
    assert_ne!(i2c::crc8(&[0x00, 0x00]), 0x00);
}

#[test]
fn pointers_encode_big_endian() {
    assert_eq!(i2c::encode_pointer(Opcode::StartMeasurement), [0x00, 0x10]);
    assert_eq!(i2c::encode_pointer(Opcode::StopMeasurement), [0x01, 0x04]);
    assert_eq!(i2c::encode_pointer(Opcode::ReadDataReady), [0x02, 0x02]);
    assert_eq!(i2c::encode_pointer(Opcode::ReadMeasuredValues), [0x03, 0x00]);
    assert_eq!(i2c::encode_pointer(Opcode::Reset), [0xD3, 0x04]);
}

#[test]
fn start_measurement_write_carries_format_word() {
    let bytes = i2c::encode_write_u16(Opcode::StartMeasurement, i2c::START_MEASUREMENT_ARG);
    assert_eq!(bytes.len(), 5);
    assert_eq!(&bytes[..2], &[0x00, 0x10]);
    assert_eq!(&bytes[2..4], &[0x03, 0x00]);
    assert_eq!(bytes[4], i2c::crc8(&[0x03, 0x00]));
}

#[test]
fn u32_write_splits_into_two_protected_words() {
    let bytes = i2c::encode_write_u32(Opcode::AutoCleanInterval, 604_800);
    // 604800 = 0x00093A80
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[..2], &[0x80, 0x04]);
    assert_eq!(&bytes[2..4], &[0x00, 0x09]);
    assert_eq!(bytes[4], i2c::crc8(&[0x00, 0x09]));
    assert_eq!(&bytes[5..7], &[0x3A, 0x80]);
    assert_eq!(bytes[7], i2c::crc8(&[0x3A, 0x80]));
}

#[test]
fn reply_decoding_strips_crc_bytes() {
    let wire = i2c_reply(&[0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(wire.len(), 6);
    let data = i2c::decode_reply(&wire).expect("Failed to decode reply");
    assert_eq!(data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn any_corrupted_word_fails_the_whole_reply() {
    let mut wire = i2c_reply(&[0x12, 0x34, 0x56, 0x78]);
    wire[4] ^= 0x01; // second data word
    let err = i2c::decode_reply(&wire).unwrap_err();
    assert_eq!(err.code(), CODE_PROTOCOL);
}

#[test]
fn ragged_reply_lengths_are_rejected() {
    assert!(i2c::decode_reply(&[]).is_err());
    assert!(i2c::decode_reply(&[0x12, 0x34]).is_err());
    assert!(i2c::decode_reply(&[0x12, 0x34, 0x00, 0x00]).is_err());
}

#[test]
fn wire_len_accounts_for_crc_bytes() {
    assert_eq!(i2c::wire_len(2), 3);
    assert_eq!(i2c::wire_len(4), 6);
    assert_eq!(i2c::wire_len(40), 60);
}
