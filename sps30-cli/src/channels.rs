//! Concrete raw-channel adapters for real hardware.

use std::io::{self, Read, Write};
use std::time::Duration;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use serialport::SerialPort;
use sps30_lib::constants::I2C_ADDRESS;
use sps30_lib::{I2cChannel, SerialChannel};

/// The SPS30 talks SHDLC at a fixed 115200 8N1.
const BAUD_RATE: u32 = 115_200;

pub struct PortChannel {
    port: Box<dyn SerialPort>,
}

impl PortChannel {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let port = serialport::new(path, BAUD_RATE)
            .timeout(Duration::from_millis(100))
            .open()?;
        Ok(PortChannel { port })
    }
}

impl SerialChannel for PortChannel {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::other)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

pub struct LinuxI2c {
    // slave address is bound at open time, the per-call address is ignored
    dev: LinuxI2CDevice,
}

impl LinuxI2c {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let dev = LinuxI2CDevice::new(path, I2C_ADDRESS as u16)?;
        Ok(LinuxI2c { dev })
    }
}

impl I2cChannel for LinuxI2c {
    fn write(&mut self, _address: u8, bytes: &[u8]) -> io::Result<()> {
        self.dev.write(bytes).map_err(io::Error::other)
    }

    fn read(&mut self, _address: u8, buf: &mut [u8]) -> io::Result<()> {
        self.dev.read(buf).map_err(io::Error::other)
    }
}
