pub mod constants;
pub mod device;
pub mod error;
pub mod i2c;
pub mod measurement;
pub mod shdlc;
pub mod transport;

// Re-export the driver struct and the types callers touch directly
pub use device::Sps30;
pub use error::{DeviceStatus, Sps30Error};
pub use measurement::{Measurement, ValueId};
pub use transport::{
    Command, DeviceInfoKind, I2cChannel, I2cTransport, SerialChannel, SerialTransport, Transport,
};
