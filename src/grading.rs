use std::fmt;

use serde::{Deserialize, Serialize};

pub const ELITE_EDGE_PCT: f64 = 10.0;
pub const VALUE_EDGE_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    Pass,
    Value,
    Elite,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::Pass => "PASS",
            Grade::Value => "VALUE",
            Grade::Elite => "ELITE",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds are exclusive: exactly 5% is PASS, exactly 10% is VALUE.
pub fn grade(edge_pct: f64) -> Grade {
    if edge_pct > ELITE_EDGE_PCT {
        Grade::Elite
    } else if edge_pct > VALUE_EDGE_PCT {
        Grade::Value
    } else {
        Grade::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_fall_to_lower_tier() {
        assert_eq!(grade(5.0), Grade::Pass);
        assert_eq!(grade(10.0), Grade::Value);
        assert_eq!(grade(5.005), Grade::Value);
        assert_eq!(grade(10.0001), Grade::Elite);
        assert_eq!(grade(0.0), Grade::Pass);
    }

    #[test]
    fn nan_edge_is_pass() {
        assert_eq!(grade(f64::NAN), Grade::Pass);
    }

    #[test]
    fn label_matches_display() {
        assert_eq!(Grade::Elite.to_string(), "ELITE");
        assert_eq!(Grade::Value.label(), "VALUE");
    }
}
