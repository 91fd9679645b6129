//! The two transport drivers and the raw-channel traits they sit on.
//!
//! Both drivers implement [`Transport`]: one logical command in, one decoded
//! payload out, blocking until the exchange completes or times out. All
//! SHDLC framing lives in the serial driver, all pointer/poll sequencing in
//! the I2C driver.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::constants::{
    I2C_ADDRESS, I2C_PHASE_DELAY, MAX_DEVICE_INFO_LEN, MAX_RECV_LEN, MEASUREMENT_LEN,
    RESPONSE_TIMEOUT, RX_DELAY, SHDLC_DELIMITER,
};
use crate::error::Sps30Error;
use crate::i2c::{self, Opcode};
use crate::shdlc;

/// Which of the three device-info strings to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceInfoKind {
    ProductName,
    ArticleCode,
    SerialNumber,
}

/// One logical operation against the sensor, transport-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartMeasurement,
    StopMeasurement,
    ReadMeasuredValues,
    StartFanCleaning,
    Reset,
    ReadAutoCleanInterval,
    WriteAutoCleanInterval(u32),
    ReadDeviceInfo(DeviceInfoKind),
}

/// Capability shared by the two transport drivers.
pub trait Transport {
    /// Execute one command round-trip and return the decoded payload.
    fn execute(&mut self, command: Command) -> Result<Bytes, Sps30Error>;

    /// Whether the sensor holds a fresh measurement. The serial protocol has
    /// no ready flag, replies are buffered on demand, so it always reports
    /// true.
    fn data_ready(&mut self) -> Result<bool, Sps30Error>;
}

/// Raw byte-stream channel the serial driver is generic over.
pub trait SerialChannel {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn bytes_available(&mut self) -> io::Result<usize>;
    fn read_byte(&mut self) -> io::Result<u8>;
}

/// Raw bus channel the I2C driver is generic over. The address-select,
/// write and stop of a bus transaction are collapsed into one call each way.
pub trait I2cChannel {
    fn write(&mut self, address: u8, bytes: &[u8]) -> io::Result<()>;
    fn read(&mut self, address: u8, buf: &mut [u8]) -> io::Result<()>;
}

/// Serial (SHDLC) transport driver.
pub struct SerialTransport<C> {
    channel: C,
    recv_buf: Vec<u8>,
    response_timeout: Duration,
    rx_delay: Duration,
}

impl<C: SerialChannel> SerialTransport<C> {
    pub fn new(channel: C) -> Self {
        SerialTransport {
            channel,
            recv_buf: Vec::with_capacity(MAX_RECV_LEN),
            response_timeout: RESPONSE_TIMEOUT,
            rx_delay: RX_DELAY,
        }
    }

    /// Override the response deadline and the post-send delay. Mostly useful
    /// for tests and unusually slow links.
    pub fn with_timing(mut self, response_timeout: Duration, rx_delay: Duration) -> Self {
        self.response_timeout = response_timeout;
        self.rx_delay = rx_delay;
        self
    }

    fn command_bytes(command: Command) -> (u8, Vec<u8>) {
        match command {
            Command::StartMeasurement => (
                shdlc::CMD_START_MEASUREMENT,
                shdlc::START_MEASUREMENT_ARGS.to_vec(),
            ),
            Command::StopMeasurement => (shdlc::CMD_STOP_MEASUREMENT, Vec::new()),
            Command::ReadMeasuredValues => (shdlc::CMD_READ_MEASURED_VALUES, Vec::new()),
            Command::StartFanCleaning => (shdlc::CMD_START_FAN_CLEANING, Vec::new()),
            Command::Reset => (shdlc::CMD_RESET, Vec::new()),
            Command::ReadAutoCleanInterval => {
                (shdlc::CMD_AUTO_CLEAN_INTERVAL, vec![shdlc::SUBCMD_AUTO_CLEAN])
            }
            Command::WriteAutoCleanInterval(interval) => {
                let mut data = Vec::with_capacity(5);
                data.push(shdlc::SUBCMD_AUTO_CLEAN);
                data.extend_from_slice(&interval.to_be_bytes());
                (shdlc::CMD_AUTO_CLEAN_INTERVAL, data)
            }
            Command::ReadDeviceInfo(kind) => {
                let selector = match kind {
                    DeviceInfoKind::ProductName => shdlc::INFO_PRODUCT_NAME,
                    DeviceInfoKind::ArticleCode => shdlc::INFO_ARTICLE_CODE,
                    DeviceInfoKind::SerialNumber => shdlc::INFO_SERIAL_NUMBER,
                };
                (shdlc::CMD_DEVICE_INFO, vec![selector])
            }
        }
    }

    /// Accumulate bytes until a closed frame sits in `recv_buf`.
    fn receive_frame(&mut self) -> Result<(), Sps30Error> {
        let deadline = Instant::now() + self.response_timeout;
        loop {
            while self.channel.bytes_available()? > 0 {
                let byte = self.channel.read_byte()?;
                if self.recv_buf.is_empty() && byte != SHDLC_DELIMITER {
                    // noise before the opening delimiter
                    continue;
                }
                if byte == SHDLC_DELIMITER && self.recv_buf.len() == 1 {
                    // duplicate opening delimiter
                    continue;
                }
                self.recv_buf.push(byte);
                if byte == SHDLC_DELIMITER && self.recv_buf.len() > 1 {
                    return Ok(());
                }
                if self.recv_buf.len() >= MAX_RECV_LEN {
                    return Err(Sps30Error::Protocol(
                        "receive buffer full before closing delimiter".to_string(),
                    ));
                }
            }
            if Instant::now() >= deadline {
                return Err(Sps30Error::Timeout(self.response_timeout));
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl<C: SerialChannel> Transport for SerialTransport<C> {
    fn execute(&mut self, command: Command) -> Result<Bytes, Sps30Error> {
        let (cmd, data) = Self::command_bytes(command);
        let frame = shdlc::encode_mosi(cmd, &data);
        debug!("serial -> {}", hex::encode(&frame));

        self.recv_buf.clear();
        self.channel.write_all(&frame)?;
        thread::sleep(self.rx_delay);
        self.receive_frame()?;
        debug!("serial <- {}", hex::encode(&self.recv_buf));

        let miso = shdlc::decode_miso(&self.recv_buf)?;
        if miso.command != cmd {
            return Err(Sps30Error::Protocol(format!(
                "reply echoes command {:#04x}, expected {:#04x}",
                miso.command, cmd
            )));
        }
        Ok(miso.data)
    }

    fn data_ready(&mut self) -> Result<bool, Sps30Error> {
        Ok(true)
    }
}

/// I2C transport driver.
pub struct I2cTransport<C> {
    channel: C,
    address: u8,
    phase_delay: Duration,
}

impl<C: I2cChannel> I2cTransport<C> {
    pub fn new(channel: C) -> Self {
        I2cTransport {
            channel,
            address: I2C_ADDRESS,
            phase_delay: I2C_PHASE_DELAY,
        }
    }

    /// Override the pause between pointer write and data read.
    pub fn with_phase_delay(mut self, phase_delay: Duration) -> Self {
        self.phase_delay = phase_delay;
        self
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Sps30Error> {
        debug!("i2c -> {}", hex::encode(bytes));
        self.channel.write(self.address, bytes)?;
        Ok(())
    }

    /// Pointer write, phase delay, then a CRC-checked read of
    /// `payload_len` data bytes.
    fn read_register(&mut self, opcode: Opcode, payload_len: usize) -> Result<Bytes, Sps30Error> {
        self.write_raw(&i2c::encode_pointer(opcode))?;
        thread::sleep(self.phase_delay);

        let mut raw = vec![0u8; i2c::wire_len(payload_len)];
        self.channel.read(self.address, &mut raw)?;
        debug!("i2c <- {}", hex::encode(&raw));

        let data = i2c::decode_reply(&raw)?;
        Ok(Bytes::from(data))
    }
}

impl<C: I2cChannel> Transport for I2cTransport<C> {
    fn execute(&mut self, command: Command) -> Result<Bytes, Sps30Error> {
        match command {
            Command::StartMeasurement => {
                self.write_raw(&i2c::encode_write_u16(
                    Opcode::StartMeasurement,
                    i2c::START_MEASUREMENT_ARG,
                ))?;
                Ok(Bytes::new())
            }
            Command::StopMeasurement => {
                self.write_raw(&i2c::encode_pointer(Opcode::StopMeasurement))?;
                Ok(Bytes::new())
            }
            Command::StartFanCleaning => {
                self.write_raw(&i2c::encode_pointer(Opcode::StartFanCleaning))?;
                Ok(Bytes::new())
            }
            Command::Reset => {
                self.write_raw(&i2c::encode_pointer(Opcode::Reset))?;
                Ok(Bytes::new())
            }
            Command::ReadMeasuredValues => {
                self.read_register(Opcode::ReadMeasuredValues, MEASUREMENT_LEN)
            }
            Command::ReadAutoCleanInterval => self.read_register(Opcode::AutoCleanInterval, 4),
            Command::WriteAutoCleanInterval(interval) => {
                self.write_raw(&i2c::encode_write_u32(Opcode::AutoCleanInterval, interval))?;
                Ok(Bytes::new())
            }
            Command::ReadDeviceInfo(kind) => match kind {
                // no product-name register on the I2C side
                DeviceInfoKind::ProductName => Ok(Bytes::new()),
                DeviceInfoKind::ArticleCode => {
                    self.read_register(Opcode::ReadArticleCode, MAX_DEVICE_INFO_LEN)
                }
                DeviceInfoKind::SerialNumber => {
                    self.read_register(Opcode::ReadSerialNumber, MAX_DEVICE_INFO_LEN)
                }
            },
        }
    }

    /// Poll the data-ready word. A reply that fails the CRC check counts as
    /// "not ready": right after start-up the register may simply not be
    /// populated yet.
    fn data_ready(&mut self) -> Result<bool, Sps30Error> {
        self.write_raw(&i2c::encode_pointer(Opcode::ReadDataReady))?;
        thread::sleep(self.phase_delay);

        let mut raw = [0u8; 3];
        self.channel.read(self.address, &mut raw)?;
        debug!("i2c <- {}", hex::encode(raw));

        match i2c::decode_reply(&raw) {
            Ok(word) => Ok(word[1] & 0x01 == 0x01),
            Err(_) => {
                trace!("data-ready reply failed CRC, treating as not ready");
                Ok(false)
            }
        }
    }
}
