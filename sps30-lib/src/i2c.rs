//! Register codec for the I2C protocol.
//!
//! Commands are 16-bit pointers written big-endian. Data travels in 2-byte
//! words, each word immediately followed by its own CRC-8, in both
//! directions. A read is therefore always a pointer write followed by a bus
//! read of `payload / 2 * 3` bytes.

use num_enum::IntoPrimitive;

use crate::error::Sps30Error;

/// 16-bit register pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(u16)]
pub enum Opcode {
    StartMeasurement = 0x0010,
    StopMeasurement = 0x0104,
    ReadDataReady = 0x0202,
    ReadMeasuredValues = 0x0300,
    StartFanCleaning = 0x5607,
    AutoCleanInterval = 0x8004,
    ReadArticleCode = 0xD025,
    ReadSerialNumber = 0xD033,
    Reset = 0xD304,
}

/// Argument word of the start command: output format 0x03 (big-endian
/// IEEE-754), second byte reserved.
pub const START_MEASUREMENT_ARG: u16 = 0x0300;

/// CRC-8 over a data word: polynomial 0x31, init 0xFF, no final XOR.
/// Reference vector: `crc8(&[0xBE, 0xEF]) == 0x92`.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0xFFu8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Wire length of a reply carrying `payload_len` data bytes.
pub fn wire_len(payload_len: usize) -> usize {
    payload_len / 2 * 3
}

/// Pointer-only write, used for reads and argumentless commands.
pub fn encode_pointer(opcode: Opcode) -> [u8; 2] {
    u16::from(opcode).to_be_bytes()
}

/// Pointer plus one argument word with its CRC.
pub fn encode_write_u16(opcode: Opcode, word: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    out.extend_from_slice(&encode_pointer(opcode));
    push_word(&mut out, word.to_be_bytes());
    out
}

/// Pointer plus a 32-bit argument split into two CRC-protected words.
pub fn encode_write_u32(opcode: Opcode, value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&encode_pointer(opcode));
    push_word(&mut out, [bytes[0], bytes[1]]);
    push_word(&mut out, [bytes[2], bytes[3]]);
    out
}

fn push_word(out: &mut Vec<u8>, word: [u8; 2]) {
    out.extend_from_slice(&word);
    out.push(crc8(&word));
}

/// Strip and verify the per-word CRCs of a reply, returning the data bytes.
pub fn decode_reply(raw: &[u8]) -> Result<Vec<u8>, Sps30Error> {
    if raw.is_empty() || raw.len() % 3 != 0 {
        return Err(Sps30Error::Protocol(format!(
            "reply of {} bytes is not made of 3-byte groups",
            raw.len()
        )));
    }
    let mut data = Vec::with_capacity(raw.len() / 3 * 2);
    for group in raw.chunks_exact(3) {
        let expected = crc8(&group[..2]);
        if group[2] != expected {
            return Err(Sps30Error::Protocol(format!(
                "word CRC mismatch: got {:#04x}, expected {:#04x}",
                group[2], expected
            )));
        }
        data.extend_from_slice(&group[..2]);
    }
    Ok(data)
}
