//! The driver itself: one struct owning a transport and the session state.

use tracing::info;

use crate::constants::MAX_DEVICE_INFO_LEN;
use crate::error::Sps30Error;
use crate::measurement::{self, Measurement, ValueId};
use crate::transport::{Command, DeviceInfoKind, Transport};

/// An SPS30 sensor behind one of the two transports.
///
/// All operations are blocking round-trips. One instance owns its transport
/// exclusively; put it behind a mutex if several threads need the sensor.
pub struct Sps30<T> {
    transport: T,
    started: bool,
    last: Option<Measurement>,
    // bit per ValueId, set once that field was handed out this read cycle
    reported: u16,
}

impl<T: Transport> Sps30<T> {
    /// Take ownership of a configured transport.
    pub fn new(transport: T) -> Self {
        Sps30 {
            transport,
            started: false,
            last: None,
            reported: 0,
        }
    }

    /// Connectivity check: true if the sensor answers a serial-number
    /// request.
    pub fn probe(&mut self) -> bool {
        self.serial_number().is_ok()
    }

    /// Switch the sensor into measurement mode. Fan and laser spin up and
    /// readings become available after roughly one second.
    pub fn start(&mut self) -> Result<(), Sps30Error> {
        self.transport.execute(Command::StartMeasurement)?;
        self.started = true;
        info!("measurement started");
        Ok(())
    }

    /// Return to idle mode.
    pub fn stop(&mut self) -> Result<(), Sps30Error> {
        self.transport.execute(Command::StopMeasurement)?;
        self.started = false;
        info!("measurement stopped");
        Ok(())
    }

    /// Device reset, equivalent to a power cycle. Clears the started flag
    /// and any cached measurement.
    pub fn reset(&mut self) -> Result<(), Sps30Error> {
        self.transport.execute(Command::Reset)?;
        self.started = false;
        self.last = None;
        self.reported = 0;
        info!("device reset");
        Ok(())
    }

    /// Trigger a fan-cleaning cycle immediately.
    pub fn clean(&mut self) -> Result<(), Sps30Error> {
        self.transport.execute(Command::StartFanCleaning)?;
        Ok(())
    }

    /// Seconds between automatic fan-cleaning cycles (0 = disabled).
    pub fn auto_clean_interval(&mut self) -> Result<u32, Sps30Error> {
        let payload = self.transport.execute(Command::ReadAutoCleanInterval)?;
        measurement::decode_u32(&payload)
    }

    pub fn set_auto_clean_interval(&mut self, seconds: u32) -> Result<(), Sps30Error> {
        self.transport
            .execute(Command::WriteAutoCleanInterval(seconds))?;
        Ok(())
    }

    pub fn serial_number(&mut self) -> Result<String, Sps30Error> {
        self.device_info(DeviceInfoKind::SerialNumber)
    }

    pub fn article_code(&mut self) -> Result<String, Sps30Error> {
        self.device_info(DeviceInfoKind::ArticleCode)
    }

    /// Product name. Only the serial protocol exposes it; over I2C this is
    /// an empty string.
    pub fn product_name(&mut self) -> Result<String, Sps30Error> {
        self.device_info(DeviceInfoKind::ProductName)
    }

    fn device_info(&mut self, kind: DeviceInfoKind) -> Result<String, Sps30Error> {
        let payload = self.transport.execute(Command::ReadDeviceInfo(kind))?;
        let end = payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(payload.len());
        if end > MAX_DEVICE_INFO_LEN {
            return Err(Sps30Error::StringTooLong {
                actual: end,
                max: MAX_DEVICE_INFO_LEN,
            });
        }
        let bytes = &payload[..end];
        if !bytes.is_ascii() {
            return Err(Sps30Error::Protocol(
                "device string contains non-ASCII bytes".to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read one full measurement record.
    ///
    /// Requires a prior successful [`start`](Self::start); fails with the
    /// command-state error otherwise, without touching the bus.
    pub fn measurement(&mut self) -> Result<Measurement, Sps30Error> {
        if !self.started {
            return Err(Sps30Error::NotStarted);
        }
        if !self.transport.data_ready()? {
            return Err(Sps30Error::DataNotReady);
        }
        let payload = self.transport.execute(Command::ReadMeasuredValues)?;
        let record = Measurement::decode(&payload)?;
        self.last = Some(record);
        self.reported = 0;
        Ok(record)
    }

    /// Fetch one scalar of the record. A full read is issued only when no
    /// record is cached or this field was already handed out since the last
    /// read; otherwise the cached record is decoded again.
    pub fn single_value(&mut self, id: ValueId) -> Result<f32, Sps30Error> {
        let bit = 1u16 << u8::from(id);
        let record = match self.last {
            Some(record) if self.reported & bit == 0 => record,
            _ => self.measurement()?,
        };
        self.reported |= bit;
        Ok(record.value(id))
    }

    /// Whether a start command has succeeded since the last stop/reset.
    pub fn is_started(&self) -> bool {
        self.started
    }
}
