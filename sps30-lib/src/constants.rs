// Protocol constants for the SPS30

use std::time::Duration;

/// SHDLC frame delimiter, sent before and after every frame
pub const SHDLC_DELIMITER: u8 = 0x7E;

/// SHDLC escape byte introducing a stuffed value
pub const SHDLC_ESCAPE: u8 = 0x7D;

/// XOR applied to a byte when it is stuffed or unstuffed
pub const SHDLC_STUFF_XOR: u8 = 0x20;

/// SHDLC bus address of the sensor (sole device on the link)
pub const SHDLC_ADDRESS: u8 = 0x00;

/// I2C bus address of the sensor
pub const I2C_ADDRESS: u8 = 0x69;

/// Largest raw frame the serial driver will buffer
pub const MAX_RECV_LEN: usize = 255;

/// Measurement payload: ten big-endian f32 values
pub const MEASUREMENT_LEN: usize = 40;

/// Longest device-info string the sensor reports (without terminator)
pub const MAX_DEVICE_INFO_LEN: usize = 32;

/// Deadline for a complete serial response frame
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Pause between sending a frame and the first read attempt, the sensor
/// needs this long to process a command at 115200 baud
pub const RX_DELAY: Duration = Duration::from_millis(200);

/// Pause between the I2C pointer write and the data read
pub const I2C_PHASE_DELAY: Duration = Duration::from_millis(20);
