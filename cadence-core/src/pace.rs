//! Running pace and step cadence
//!
//! A pace is time per distance ("5:30 min/km"). The suggested cadence is a
//! step table over pace per kilometre; faster paces get a higher cadence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kilometres in a mile
const KM_PER_MILE: f64 = 1.60934;

/// Cadence range offered to runners (SPM)
pub const CADENCE_RANGE: std::ops::RangeInclusive<u32> = 165..=180;

/// (max pace in min/km, suggested cadence), checked in order
const CADENCE_TABLE: &[(f64, u32)] = &[
    (3.5, 180),
    (4.0, 178),
    (4.5, 176),
    (5.0, 174),
    (5.5, 172),
    (6.0, 170),
    (7.0, 168),
];

/// Cadence for paces slower than the table
const SLOWEST_CADENCE: u32 = 165;

/// Steps per minute. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Cadence(u32);

impl Cadence {
    pub fn new(spm: u32) -> Result<Self> {
        if spm == 0 {
            return Err(Error::InvalidCadence("cadence must be positive".into()));
        }
        Ok(Self(spm))
    }

    pub fn spm(self) -> u32 {
        self.0
    }

    pub fn as_bpm(self) -> f64 {
        f64::from(self.0)
    }

    /// Whether the cadence is inside the range offered to runners
    pub fn is_typical(self) -> bool {
        CADENCE_RANGE.contains(&self.0)
    }
}

impl TryFrom<u32> for Cadence {
    type Error = Error;

    fn try_from(spm: u32) -> Result<Self> {
        Cadence::new(spm)
    }
}

impl From<Cadence> for u32 {
    fn from(c: Cadence) -> u32 {
        c.0
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SPM", self.0)
    }
}

/// Distance unit of a pace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceUnit {
    #[default]
    Km,
    Mi,
}

impl FromStr for PaceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "km" => Ok(PaceUnit::Km),
            "mi" => Ok(PaceUnit::Mi),
            other => Err(Error::InvalidPace(format!("unknown unit '{}'", other))),
        }
    }
}

impl fmt::Display for PaceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaceUnit::Km => f.write_str("km"),
            PaceUnit::Mi => f.write_str("mi"),
        }
    }
}

/// Time per unit distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceInput {
    pub minutes: u32,
    pub seconds: u32,
    pub unit: PaceUnit,
}

impl PaceInput {
    pub fn new(minutes: u32, seconds: u32, unit: PaceUnit) -> Result<Self> {
        let pace = Self { minutes, seconds, unit };
        if !pace.is_valid() {
            return Err(Error::InvalidPace(format!("{}:{:02} is not a valid pace", minutes, seconds)));
        }
        Ok(pace)
    }

    /// Parse "M:SS" with the given unit
    pub fn parse(s: &str, unit: PaceUnit) -> Result<Self> {
        let (minutes, seconds) = parse_pace(s)?;
        Self::new(minutes, seconds, unit)
    }

    /// Seconds below 60 and not a zero pace
    pub fn is_valid(&self) -> bool {
        self.seconds < 60 && (self.minutes > 0 || self.seconds > 0)
    }

    /// Pace in minutes per kilometre
    pub fn minutes_per_km(&self) -> f64 {
        let total = f64::from(self.minutes) + f64::from(self.seconds) / 60.0;
        match self.unit {
            PaceUnit::Km => total,
            PaceUnit::Mi => total / KM_PER_MILE,
        }
    }
}

impl fmt::Display for PaceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02} min/{}", self.minutes, self.seconds, self.unit)
    }
}

/// Parse "M:SS" into (minutes, seconds)
pub fn parse_pace(s: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidPace(format!("expected M:SS, got '{}'", s));

    let (mins, secs) = s.split_once(':').ok_or_else(invalid)?;
    if mins.is_empty() || !mins.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let sec_bytes = secs.as_bytes();
    if sec_bytes.len() != 2 || !(b'0'..=b'5').contains(&sec_bytes[0]) || !sec_bytes[1].is_ascii_digit() {
        return Err(invalid());
    }

    let minutes = mins.parse::<u32>().map_err(|_| invalid())?;
    let seconds = secs.parse::<u32>().map_err(|_| invalid())?;
    Ok((minutes, seconds))
}

/// Suggested running cadence for a pace
pub fn suggested_cadence(pace: &PaceInput) -> Cadence {
    let per_km = pace.minutes_per_km();
    let spm = CADENCE_TABLE
        .iter()
        .find(|(max_pace, _)| per_km <= *max_pace)
        .map(|(_, spm)| *spm)
        .unwrap_or(SLOWEST_CADENCE);
    Cadence(spm)
}
