use std::{collections::BTreeSet, fmt, str::FromStr};

use crate::{domain::Reading, error::AnalyticsError};

/// Generation sources a reading can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnergySource {
    Solar,
    Wind,
    Grid,
}

impl EnergySource {
    pub const ALL: [EnergySource; 3] = [Self::Solar, Self::Wind, Self::Grid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solar => "Solar",
            Self::Wind => "Wind",
            Self::Grid => "Grid",
        }
    }

    /// kW attributed to this source in `r`.
    pub fn output(&self, r: &Reading) -> f64 {
        match self {
            Self::Solar => r.solar_power_kw,
            Self::Wind => r.wind_power_kw,
            Self::Grid => r.grid_supply_kw,
        }
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergySource {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|src| src.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| AnalyticsError::InvalidRange(format!("unknown energy source '{tag}'")))
    }
}

/// Parse a comma-separated list of source tags. Blank input is the empty set.
pub fn parse_sources(list: &str) -> Result<BTreeSet<EnergySource>, AnalyticsError> {
    list.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}
