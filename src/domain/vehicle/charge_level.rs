//! Display helpers for battery levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One decimal place, e.g. `"50.0"`
pub fn format_charge_percentage(charge: f64) -> String {
    format!("{:.1}", charge)
}

/// Coarse battery health band shown next to a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeBand {
    Excellent,
    Good,
    Low,
    Critical,
}

impl ChargeBand {
    pub fn from_charge(charge: f64) -> Self {
        if charge > 80.0 {
            Self::Excellent
        } else if charge > 50.0 {
            Self::Good
        } else if charge > 20.0 {
            Self::Low
        } else {
            Self::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Low => "Low",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for ChargeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_to_one_decimal_place() {
        assert_eq!(format_charge_percentage(50.0), "50.0");
        assert_eq!(format_charge_percentage(100.0), "100.0");
        assert_eq!(format_charge_percentage(33.333), "33.3");
        assert_eq!(format_charge_percentage(50.16), "50.2");
        assert_eq!(format_charge_percentage(99.999), "100.0");
        assert_eq!(format_charge_percentage(0.04), "0.0");
    }

    #[test]
    fn bands_use_exclusive_lower_bounds() {
        assert_eq!(ChargeBand::from_charge(80.1), ChargeBand::Excellent);
        assert_eq!(ChargeBand::from_charge(80.0), ChargeBand::Good);
        assert_eq!(ChargeBand::from_charge(50.0), ChargeBand::Low);
        assert_eq!(ChargeBand::from_charge(20.0), ChargeBand::Critical);
        assert_eq!(ChargeBand::Good.to_string(), "Good");
    }
}
