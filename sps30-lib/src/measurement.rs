//! Decoding of measurement payloads into typed values.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use zerocopy::byteorder::big_endian::F32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constants::MEASUREMENT_LEN;
use crate::error::Sps30Error;

/// The 40-byte measurement block exactly as the sensor emits it: ten
/// IEEE-754 values in network byte order.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawMeasurementBlock {
    pub mass_pm1_0: F32,
    pub mass_pm2_5: F32,
    pub mass_pm4_0: F32,
    pub mass_pm10: F32,
    pub number_pm0_5: F32,
    pub number_pm1_0: F32,
    pub number_pm2_5: F32,
    pub number_pm4_0: F32,
    pub number_pm10: F32,
    pub typical_particle_size: F32,
}

/// One full measurement record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Mass Concentration PM1.0 [µg/m³]
    pub mass_pm1_0: f32,
    /// Mass Concentration PM2.5 [µg/m³]
    pub mass_pm2_5: f32,
    /// Mass Concentration PM4.0 [µg/m³]
    pub mass_pm4_0: f32,
    /// Mass Concentration PM10 [µg/m³]
    pub mass_pm10: f32,
    /// Number Concentration PM0.5 [#/cm³]
    pub number_pm0_5: f32,
    /// Number Concentration PM1.0 [#/cm³]
    pub number_pm1_0: f32,
    /// Number Concentration PM2.5 [#/cm³]
    pub number_pm2_5: f32,
    /// Number Concentration PM4.0 [#/cm³]
    pub number_pm4_0: f32,
    /// Number Concentration PM10 [#/cm³]
    pub number_pm10: f32,
    /// Typical Particle Size [µm]
    pub typical_particle_size: f32,
}

impl From<RawMeasurementBlock> for Measurement {
    fn from(raw: RawMeasurementBlock) -> Self {
        Measurement {
            mass_pm1_0: raw.mass_pm1_0.get(),
            mass_pm2_5: raw.mass_pm2_5.get(),
            mass_pm4_0: raw.mass_pm4_0.get(),
            mass_pm10: raw.mass_pm10.get(),
            number_pm0_5: raw.number_pm0_5.get(),
            number_pm1_0: raw.number_pm1_0.get(),
            number_pm2_5: raw.number_pm2_5.get(),
            number_pm4_0: raw.number_pm4_0.get(),
            number_pm10: raw.number_pm10.get(),
            typical_particle_size: raw.typical_particle_size.get(),
        }
    }
}

impl Measurement {
    /// Decode a measurement payload. The payload must be exactly
    /// [`MEASUREMENT_LEN`] bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, Sps30Error> {
        let raw = RawMeasurementBlock::read_from_bytes(payload).map_err(|_| {
            Sps30Error::Protocol(format!(
                "measurement payload must be {} bytes, got {}",
                MEASUREMENT_LEN,
                payload.len()
            ))
        })?;
        Ok(raw.into())
    }

    /// Return one named field of the record.
    pub fn value(&self, id: ValueId) -> f32 {
        match id {
            ValueId::MassPm1_0 => self.mass_pm1_0,
            ValueId::MassPm2_5 => self.mass_pm2_5,
            ValueId::MassPm4_0 => self.mass_pm4_0,
            ValueId::MassPm10 => self.mass_pm10,
            ValueId::NumberPm0_5 => self.number_pm0_5,
            ValueId::NumberPm1_0 => self.number_pm1_0,
            ValueId::NumberPm2_5 => self.number_pm2_5,
            ValueId::NumberPm4_0 => self.number_pm4_0,
            ValueId::NumberPm10 => self.number_pm10,
            ValueId::TypicalParticleSize => self.typical_particle_size,
        }
    }
}

/// Identifier of a single scalar within the measurement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ValueId {
    #[strum(to_string = "mass PM1.0")]
    MassPm1_0 = 1,
    #[strum(to_string = "mass PM2.5")]
    MassPm2_5 = 2,
    #[strum(to_string = "mass PM4.0")]
    MassPm4_0 = 3,
    #[strum(to_string = "mass PM10")]
    MassPm10 = 4,
    #[strum(to_string = "number PM0.5")]
    NumberPm0_5 = 5,
    #[strum(to_string = "number PM1.0")]
    NumberPm1_0 = 6,
    #[strum(to_string = "number PM2.5")]
    NumberPm2_5 = 7,
    #[strum(to_string = "number PM4.0")]
    NumberPm4_0 = 8,
    #[strum(to_string = "number PM10")]
    NumberPm10 = 9,
    #[strum(to_string = "typical particle size")]
    TypicalParticleSize = 10,
}

impl ValueId {
    /// All identifiers in record order.
    pub const ALL: [ValueId; 10] = [
        ValueId::MassPm1_0,
        ValueId::MassPm2_5,
        ValueId::MassPm4_0,
        ValueId::MassPm10,
        ValueId::NumberPm0_5,
        ValueId::NumberPm1_0,
        ValueId::NumberPm2_5,
        ValueId::NumberPm4_0,
        ValueId::NumberPm10,
        ValueId::TypicalParticleSize,
    ];
}

/// Decode a 4-byte big-endian unsigned integer payload.
pub fn decode_u32(payload: &[u8]) -> Result<u32, Sps30Error> {
    let bytes: [u8; 4] = payload.try_into().map_err(|_| {
        Sps30Error::Protocol(format!("u32 payload must be 4 bytes, got {}", payload.len()))
    })?;
    Ok(u32::from_be_bytes(bytes))
}
