use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitiveError};
use std::io;
use std::time::Duration;
use strum_macros::Display;
use thiserror::Error;

use crate::measurement::ValueId;

/// Wire code for a driver-detected timeout (not reported by the device).
pub const CODE_TIMEOUT: u8 = 0x50;

/// Wire code for a driver-detected framing/CRC failure.
pub const CODE_PROTOCOL: u8 = 0x51;

/// Status byte reported by the sensor in SHDLC replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive, Display)]
#[repr(u8)]
pub enum DeviceStatus {
    #[strum(to_string = "no error")]
    Ok = 0x00,
    #[strum(to_string = "wrong data length for this command")]
    DataLength = 0x01,
    #[strum(to_string = "unknown command")]
    UnknownCommand = 0x02,
    #[strum(to_string = "no access right for command")]
    AccessRight = 0x03,
    #[strum(to_string = "illegal command parameter or out of allowed range")]
    Parameter = 0x04,
    #[strum(to_string = "internal function argument out of range")]
    OutOfRange = 0x28,
    #[strum(to_string = "command not allowed in current state")]
    CommandState = 0x43,
    #[num_enum(catch_all)]
    #[strum(to_string = "unrecognized status code")]
    Unknown(u8),
}

/// The primary error type for the `sps30-lib` library.
#[derive(Error, Debug)]
pub enum Sps30Error {
    #[error("sensor reported: {0}")]
    Device(DeviceStatus),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no complete response within {0:?}")]
    Timeout(Duration),

    #[error("no fresh measurement available")]
    DataNotReady,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("measurement has not been started")]
    NotStarted,

    #[error("device string of {actual} bytes exceeds the {max} byte limit")]
    StringTooLong { actual: usize, max: usize },

    #[error("invalid single-value identifier: {0}")]
    InvalidValueId(u8),
}

impl Sps30Error {
    /// One-byte code as surfaced on the wire: device status bytes verbatim,
    /// driver-detected failures folded into the timeout/protocol codes.
    pub fn code(&self) -> u8 {
        match self {
            Sps30Error::Device(status) => (*status).into(),
            Sps30Error::Timeout(_) | Sps30Error::DataNotReady => CODE_TIMEOUT,
            Sps30Error::Io(_) | Sps30Error::Protocol(_) => CODE_PROTOCOL,
            Sps30Error::NotStarted => DeviceStatus::CommandState.into(),
            Sps30Error::StringTooLong { .. } => DeviceStatus::DataLength.into(),
            Sps30Error::InvalidValueId(_) => DeviceStatus::Parameter.into(),
        }
    }
}

impl From<TryFromPrimitiveError<ValueId>> for Sps30Error {
    fn from(err: TryFromPrimitiveError<ValueId>) -> Self {
        Sps30Error::InvalidValueId(err.number)
    }
}
