//! A1 environment sensor command dialect.
//!
//! Same request shape as RM's sensor read (`01 00×15`, generic command), but
//! the response layout differs: light/air-quality/noise are categorical
//! bytes here rather than RM's raw flag bits.

use broadlink_core::{BroadlinkError, Family};

use crate::device::Device;

const GENERIC_COMMAND: u16 = 0x006A;
const OP_CHECK_SENSORS: u8 = 0x01;

const TEMPERATURE_OFFSET: usize = 0x04;
const HUMIDITY_OFFSET: usize = 0x06;
const LIGHT_OFFSET: usize = 0x08;
const AIR_QUALITY_OFFSET: usize = 0x09;
const NOISE_OFFSET: usize = 0x0A;

/// Categorical light level reported by an A1 sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Light {
    /// Sensor reported an unrecognized level.
    Unknown(u8),
    /// Dark.
    Dark,
    /// Dim.
    Dim,
    /// Normal room light.
    Normal,
    /// Bright.
    Bright,
}

/// Categorical air-quality reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    /// Sensor reported an unrecognized level.
    Unknown(u8),
    /// Excellent.
    Excellent,
    /// Good.
    Good,
    /// Normal.
    Normal,
    /// Poor.
    Poor,
}

/// Categorical noise level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseLevel {
    /// Sensor reported an unrecognized level.
    Unknown(u8),
    /// Quiet.
    Quiet,
    /// Normal.
    Normal,
    /// Noisy.
    Noisy,
}

impl Light {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Dark,
            1 => Self::Dim,
            2 => Self::Normal,
            3 => Self::Bright,
            other => Self::Unknown(other),
        }
    }
}

impl AirQuality {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Excellent,
            1 => Self::Good,
            2 => Self::Normal,
            3 => Self::Poor,
            other => Self::Unknown(other),
        }
    }
}

impl NoiseLevel {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Quiet,
            1 => Self::Normal,
            2 => Self::Noisy,
            other => Self::Unknown(other),
        }
    }
}

/// Full A1 sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity, percent.
    pub humidity: f32,
    /// Categorical light level.
    pub light: Light,
    /// Categorical air-quality level.
    pub air_quality: AirQuality,
    /// Categorical noise level.
    pub noise: NoiseLevel,
}

/// Read every sensor value in one round trip.
///
/// # Errors
///
/// See [`Device::send_command`].
pub fn check_sensors(device: &mut Device) -> Result<SensorReading, BroadlinkError> {
    device.require_family(Family::A1)?;
    let mut payload = [0u8; 16];
    payload[0] = OP_CHECK_SENSORS;
    let response = device.send_command(GENERIC_COMMAND, &payload)?;
    Ok(decode_sensor_reading(&response))
}

fn decode_sensor_reading(payload: &[u8]) -> SensorReading {
    let temperature = f32::from(payload.get(TEMPERATURE_OFFSET).copied().unwrap_or(0))
        + f32::from(payload.get(TEMPERATURE_OFFSET + 1).copied().unwrap_or(0)) / 10.0;
    let humidity = f32::from(payload.get(HUMIDITY_OFFSET).copied().unwrap_or(0))
        + f32::from(payload.get(HUMIDITY_OFFSET + 1).copied().unwrap_or(0)) / 10.0;

    SensorReading {
        temperature,
        humidity,
        light: Light::from_byte(payload.get(LIGHT_OFFSET).copied().unwrap_or(0)),
        air_quality: AirQuality::from_byte(payload.get(AIR_QUALITY_OFFSET).copied().unwrap_or(0)),
        noise: NoiseLevel::from_byte(payload.get(NOISE_OFFSET).copied().unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_categorical_fields() {
        let mut payload = vec![0u8; 11];
        payload[TEMPERATURE_OFFSET] = 22;
        payload[TEMPERATURE_OFFSET + 1] = 3;
        payload[HUMIDITY_OFFSET] = 55;
        payload[LIGHT_OFFSET] = 2;
        payload[AIR_QUALITY_OFFSET] = 1;
        payload[NOISE_OFFSET] = 0;

        let reading = decode_sensor_reading(&payload);
        assert!((reading.temperature - 22.3).abs() < f32::EPSILON);
        assert_eq!(reading.light, Light::Normal);
        assert_eq!(reading.air_quality, AirQuality::Good);
        assert_eq!(reading.noise, NoiseLevel::Quiet);
    }

    #[test]
    fn unrecognized_category_bytes_are_preserved() {
        assert_eq!(Light::from_byte(0xFF), Light::Unknown(0xFF));
    }
}
