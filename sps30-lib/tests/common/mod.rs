//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use sps30_lib::error::{CODE_PROTOCOL, CODE_TIMEOUT};
#[allow(unused_imports)]
pub use sps30_lib::measurement::decode_u32;
#[allow(unused_imports)]
pub use sps30_lib::{
    Command, DeviceInfoKind, DeviceStatus, I2cChannel, I2cTransport, Measurement, SerialChannel,
    SerialTransport, Sps30, Sps30Error, Transport, ValueId,
};
#[allow(unused_imports)]
pub use sps30_lib::{constants, i2c, shdlc};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

/// Raw writes observed by a mock channel, shared with the test body.
pub type WriteLog = Rc<RefCell<Vec<Vec<u8>>>>;

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("Failed to decode hex")
}

/// Scripted serial channel: each write makes the next canned reply
/// readable, byte by byte.
pub struct MockSerial {
    log: WriteLog,
    replies: VecDeque<Vec<u8>>,
    rx: VecDeque<u8>,
}

impl MockSerial {
    #[allow(dead_code)]
    pub fn new(replies: Vec<Vec<u8>>) -> (Self, WriteLog) {
        let log: WriteLog = Rc::new(RefCell::new(Vec::new()));
        let mock = MockSerial {
            log: Rc::clone(&log),
            replies: replies.into(),
            rx: VecDeque::new(),
        };
        (mock, log)
    }
}

impl SerialChannel for MockSerial {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.log.borrow_mut().push(bytes.to_vec());
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply);
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        self.rx
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))
    }
}

/// Scripted I2C channel: writes are logged, each read consumes the next
/// canned reply.
pub struct MockI2c {
    log: WriteLog,
    replies: VecDeque<Vec<u8>>,
}

impl MockI2c {
    #[allow(dead_code)]
    pub fn new(replies: Vec<Vec<u8>>) -> (Self, WriteLog) {
        let log: WriteLog = Rc::new(RefCell::new(Vec::new()));
        let mock = MockI2c {
            log: Rc::clone(&log),
            replies: replies.into(),
        };
        (mock, log)
    }
}

impl I2cChannel for MockI2c {
    fn write(&mut self, _address: u8, bytes: &[u8]) -> io::Result<()> {
        self.log.borrow_mut().push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, _address: u8, buf: &mut [u8]) -> io::Result<()> {
        let reply = self
            .replies
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        buf[n..].fill(0);
        Ok(())
    }
}

/// A serial transport with test-friendly timing over scripted replies.
#[allow(dead_code)]
pub fn serial_transport(replies: Vec<Vec<u8>>) -> (SerialTransport<MockSerial>, WriteLog) {
    let (mock, log) = MockSerial::new(replies);
    let transport =
        SerialTransport::new(mock).with_timing(Duration::from_millis(50), Duration::ZERO);
    (transport, log)
}

/// An I2C transport without inter-phase delays over scripted replies.
#[allow(dead_code)]
pub fn i2c_transport(replies: Vec<Vec<u8>>) -> (I2cTransport<MockI2c>, WriteLog) {
    let (mock, log) = MockI2c::new(replies);
    let transport = I2cTransport::new(mock).with_phase_delay(Duration::ZERO);
    (transport, log)
}

/// Build a complete MISO frame the way the sensor would.
#[allow(dead_code)]
pub fn miso_frame(command: u8, state: u8, data: &[u8]) -> Vec<u8> {
    let mut content = vec![0x00, command, state, data.len() as u8];
    content.extend_from_slice(data);
    content.push(shdlc::checksum(&content));

    let mut frame = vec![0x7E];
    frame.extend(shdlc::stuff(&content));
    frame.push(0x7E);
    frame
}

/// Append the per-word CRC to every 2 data bytes, as the sensor does on I2C.
#[allow(dead_code)]
pub fn i2c_reply(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 * 3);
    for word in data.chunks_exact(2) {
        out.extend_from_slice(word);
        out.push(i2c::crc8(word));
    }
    out
}

/// The 40-byte payload encoding the values 1.0 through 10.0.
#[allow(dead_code)]
pub fn counting_measurement_payload() -> Vec<u8> {
    (1..=10)
        .flat_map(|n| (n as f32).to_be_bytes())
        .collect()
}
