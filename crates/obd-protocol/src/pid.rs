//! OBD-II PID Definitions and Response Decoding
//!
//! Mode 01 measurement kinds and their SAE J1979 decoding formulas. Every
//! supported kind has exactly one formula; anything else decodes to
//! [`ObdError::UnsupportedMeasurement`].

use crate::error::ObdError;
use crate::mode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First octet of a positive Mode 01 response (`0x40 + mode`)
pub const POSITIVE_RESPONSE: u8 = mode::CURRENT_DATA + 0x40;

/// Minimum octet count of a well-formed frame: marker, PID echo, one data byte
const MIN_FRAME_OCTETS: usize = 3;

/// Mode 01 measurement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementKind {
    /// Engine RPM (0x0C)
    EngineRpm,
    /// Vehicle speed (0x0D)
    VehicleSpeed,
    /// Engine coolant temperature (0x05)
    CoolantTemp,
    /// Calculated engine load (0x04)
    EngineLoad,
    /// Intake manifold absolute pressure (0x0B)
    IntakeManifoldPressure,
    /// Intake air temperature (0x0F)
    IntakeAirTemp,
    /// Throttle position (0x11)
    ThrottlePosition,
    /// Fuel tank level input (0x2F)
    FuelLevel,
    /// A PID with no known decoding formula
    Unsupported(u8),
}

impl MeasurementKind {
    /// Map a raw PID to its kind
    pub fn from_pid(pid: u8) -> Self {
        match pid {
            0x0C => Self::EngineRpm,
            0x0D => Self::VehicleSpeed,
            0x05 => Self::CoolantTemp,
            0x04 => Self::EngineLoad,
            0x0B => Self::IntakeManifoldPressure,
            0x0F => Self::IntakeAirTemp,
            0x11 => Self::ThrottlePosition,
            0x2F => Self::FuelLevel,
            other => Self::Unsupported(other),
        }
    }

    /// Get the PID hex value
    pub fn pid(&self) -> u8 {
        match self {
            Self::EngineRpm => 0x0C,
            Self::VehicleSpeed => 0x0D,
            Self::CoolantTemp => 0x05,
            Self::EngineLoad => 0x04,
            Self::IntakeManifoldPressure => 0x0B,
            Self::IntakeAirTemp => 0x0F,
            Self::ThrottlePosition => 0x11,
            Self::FuelLevel => 0x2F,
            Self::Unsupported(pid) => *pid,
        }
    }

    /// Textual command sent to the adapter, e.g. `"010C"` for engine RPM
    pub fn command(&self) -> String {
        format!("{:02X}{:02X}", mode::CURRENT_DATA, self.pid())
    }

    /// Get the number of data bytes in the response for this PID
    pub fn data_bytes(&self) -> usize {
        match self {
            Self::EngineRpm => 2,
            _ => 1,
        }
    }

    /// Physical unit of the decoded value
    pub fn unit(&self) -> &'static str {
        match self {
            Self::EngineRpm => "rpm",
            Self::VehicleSpeed => "km/h",
            Self::CoolantTemp | Self::IntakeAirTemp => "°C",
            Self::EngineLoad | Self::ThrottlePosition | Self::FuelLevel => "%",
            Self::IntakeManifoldPressure => "kPa",
            Self::Unsupported(_) => "",
        }
    }

    fn formula(&self, data: &[u8]) -> i32 {
        let a = i32::from(data[0]);
        match self {
            // RPM: ((A*256)+B)/4
            Self::EngineRpm => (a * 256 + i32::from(data[1])) / 4,
            // Speed: A (km/h), MAP: A (kPa)
            Self::VehicleSpeed | Self::IntakeManifoldPressure => a,
            // Temperatures: A - 40 (°C)
            Self::CoolantTemp | Self::IntakeAirTemp => a - 40,
            // Percentages: A * 100 / 255
            Self::EngineLoad | Self::ThrottlePosition | Self::FuelLevel => a * 100 / 255,
            Self::Unsupported(_) => 0,
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineRpm => write!(f, "engine_rpm"),
            Self::VehicleSpeed => write!(f, "vehicle_speed"),
            Self::CoolantTemp => write!(f, "coolant_temp"),
            Self::EngineLoad => write!(f, "engine_load"),
            Self::IntakeManifoldPressure => write!(f, "intake_manifold_pressure"),
            Self::IntakeAirTemp => write!(f, "intake_air_temp"),
            Self::ThrottlePosition => write!(f, "throttle_position"),
            Self::FuelLevel => write!(f, "fuel_level"),
            Self::Unsupported(pid) => write!(f, "unsupported_{:02x}", pid),
        }
    }
}

/// A physical value decoded from one response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMeasurement {
    pub kind: MeasurementKind,
    pub value: i32,
}

/// Decode a textual response frame such as `"41 0C 1A F8"`
pub fn decode(response: &str, kind: MeasurementKind) -> Result<DecodedMeasurement, ObdError> {
    let octets: Vec<&str> = response.split_whitespace().collect();
    if octets.len() < MIN_FRAME_OCTETS || parse_octet(octets[0]) != Some(POSITIVE_RESPONSE) {
        return Err(ObdError::MalformedFrame(response.to_string()));
    }

    if let MeasurementKind::Unsupported(pid) = kind {
        return Err(ObdError::UnsupportedMeasurement(pid));
    }

    // The echoed PID must be the one that was asked for
    if parse_octet(octets[1]) != Some(kind.pid()) {
        return Err(ObdError::MalformedFrame(response.to_string()));
    }

    let data = octets
        .iter()
        .skip(2)
        .take(kind.data_bytes())
        .map(|octet| parse_octet(octet))
        .collect::<Option<Vec<u8>>>()
        .filter(|data| data.len() == kind.data_bytes())
        .ok_or_else(|| ObdError::MalformedFrame(response.to_string()))?;

    Ok(DecodedMeasurement {
        kind,
        value: kind.formula(&data),
    })
}

fn parse_octet(octet: &str) -> Option<u8> {
    if octet.len() != 2 {
        return None;
    }
    u8::from_str_radix(octet, 16).ok()
}
