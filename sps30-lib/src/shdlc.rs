//! Frame codec for the SHDLC serial protocol.
//!
//! Every exchange is one MOSI frame out, one MISO frame back:
//!
//! ```text
//! MOSI: 7E | addr | cmd | len | data... | chk | 7E
//! MISO: 7E | addr | cmd | state | len | data... | chk | 7E
//! ```
//!
//! Everything between the delimiters is byte-stuffed on the wire and must be
//! unstuffed before the checksum is verified.

use bytes::Bytes;
use num_enum::FromPrimitive;

use crate::constants::{
    MAX_RECV_LEN, SHDLC_ADDRESS, SHDLC_DELIMITER, SHDLC_ESCAPE, SHDLC_STUFF_XOR,
};
use crate::error::{DeviceStatus, Sps30Error};

/// Serial command bytes.
pub const CMD_START_MEASUREMENT: u8 = 0x00;
pub const CMD_STOP_MEASUREMENT: u8 = 0x01;
pub const CMD_READ_MEASURED_VALUES: u8 = 0x03;
pub const CMD_START_FAN_CLEANING: u8 = 0x56;
pub const CMD_AUTO_CLEAN_INTERVAL: u8 = 0x80;
pub const CMD_DEVICE_INFO: u8 = 0xD0;
pub const CMD_RESET: u8 = 0xD3;

/// Arguments of the start command: subcommand 0x01, output format 0x03
/// (big-endian IEEE-754).
pub const START_MEASUREMENT_ARGS: [u8; 2] = [0x01, 0x03];

/// Subcommand byte shared by the auto-clean interval read and write.
pub const SUBCMD_AUTO_CLEAN: u8 = 0x00;

/// Device-info selector bytes carried in the 0xD0 data field.
pub const INFO_PRODUCT_NAME: u8 = 0x01;
pub const INFO_ARTICLE_CODE: u8 = 0x02;
pub const INFO_SERIAL_NUMBER: u8 = 0x03;

/// A decoded MISO frame with the state byte already checked.
#[derive(Debug, Clone, PartialEq)]
pub struct MisoFrame {
    /// Echo of the command byte this frame answers.
    pub command: u8,
    pub data: Bytes,
}

fn needs_stuffing(byte: u8) -> bool {
    // 0x11/0x13 are XON/XOFF, reserved alongside the framing bytes
    matches!(byte, SHDLC_DELIMITER | SHDLC_ESCAPE | 0x11 | 0x13)
}

/// One's complement of the byte sum, modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Escape reserved bytes for transmission. Applies only to frame content,
/// never to the delimiters themselves.
pub fn stuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        if needs_stuffing(byte) {
            out.push(SHDLC_ESCAPE);
            out.push(byte ^ SHDLC_STUFF_XOR);
        } else {
            out.push(byte);
        }
    }
    out
}

/// Reverse [`stuff`]. Fails on an escape byte with nothing following it.
pub fn unstuff(data: &[u8]) -> Result<Vec<u8>, Sps30Error> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    while let Some(&byte) = iter.next() {
        if byte == SHDLC_ESCAPE {
            let &next = iter
                .next()
                .ok_or_else(|| Sps30Error::Protocol("dangling escape byte".to_string()))?;
            out.push(next ^ SHDLC_STUFF_XOR);
        } else {
            out.push(byte);
        }
    }
    Ok(out)
}

/// Build a complete MOSI frame for `command` with raw argument bytes.
pub fn encode_mosi(command: u8, data: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(3 + data.len());
    content.push(SHDLC_ADDRESS);
    content.push(command);
    content.push(data.len() as u8);
    content.extend_from_slice(data);
    content.push(checksum(&content[..]));

    let mut frame = Vec::with_capacity(content.len() + 2);
    frame.push(SHDLC_DELIMITER);
    frame.extend_from_slice(&stuff(&content));
    frame.push(SHDLC_DELIMITER);
    frame
}

/// Parse a raw MISO frame: strip delimiters, unstuff, verify length and
/// checksum, then map a nonzero state byte to the device's status code.
pub fn decode_miso(raw: &[u8]) -> Result<MisoFrame, Sps30Error> {
    if raw.len() > MAX_RECV_LEN {
        return Err(Sps30Error::Protocol(format!(
            "frame of {} bytes exceeds receive limit",
            raw.len()
        )));
    }
    let first = raw
        .iter()
        .position(|&b| b == SHDLC_DELIMITER)
        .ok_or_else(|| Sps30Error::Protocol("no frame delimiter found".to_string()))?;
    let last = raw
        .iter()
        .rposition(|&b| b == SHDLC_DELIMITER)
        .filter(|&last| last > first + 1)
        .ok_or_else(|| Sps30Error::Protocol("frame is not closed".to_string()))?;

    let content = unstuff(&raw[first + 1..last])?;
    // addr, cmd, state, len, chk at minimum
    if content.len() < 5 {
        return Err(Sps30Error::Protocol(format!(
            "frame content of {} bytes is too short",
            content.len()
        )));
    }

    let (body, chk) = content.split_at(content.len() - 1);
    let expected = checksum(body);
    if chk[0] != expected {
        return Err(Sps30Error::Protocol(format!(
            "checksum mismatch: got {:#04x}, expected {:#04x}",
            chk[0], expected
        )));
    }

    let command = body[1];
    let state = body[2];
    let len = body[3] as usize;
    let data = &body[4..];
    if data.len() != len {
        return Err(Sps30Error::Protocol(format!(
            "declared length {} does not match {} data bytes",
            len,
            data.len()
        )));
    }
    if state != 0 {
        return Err(Sps30Error::Device(DeviceStatus::from_primitive(state)));
    }

    Ok(MisoFrame {
        command,
        data: Bytes::copy_from_slice(data),
    })
}
