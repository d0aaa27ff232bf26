use std::fmt;

use serde::{Deserialize, Serialize};

const MACRS_3: [f64; 4] = [0.3333, 0.4445, 0.1481, 0.0741];
const MACRS_5: [f64; 6] = [0.20, 0.32, 0.192, 0.1152, 0.1152, 0.0576];
const MACRS_7: [f64; 8] = [
    0.1429, 0.2449, 0.1749, 0.1249, 0.0893, 0.0892, 0.0893, 0.0446,
];

/// MACRS recovery period, half-year convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MacrsSchedule {
    #[serde(rename = "macrs_3")]
    Macrs3,
    #[default]
    #[serde(rename = "macrs_5")]
    Macrs5,
    #[serde(rename = "macrs_7")]
    Macrs7,
}

impl MacrsSchedule {
    /// Fraction of the depreciable basis recovered in each tax year.
    pub fn table(self) -> &'static [f64] {
        match self {
            MacrsSchedule::Macrs3 => &MACRS_3,
            MacrsSchedule::Macrs5 => &MACRS_5,
            MacrsSchedule::Macrs7 => &MACRS_7,
        }
    }

    /// Depreciation fraction for project `year` (1-based); 0 past the table.
    pub fn fraction(self, year: u32) -> f64 {
        let Some(idx) = (year as usize).checked_sub(1) else {
            return 0.0;
        };
        self.table().get(idx).copied().unwrap_or(0.0)
    }
}

impl fmt::Display for MacrsSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MacrsSchedule::Macrs3 => "MACRS 3-year",
            MacrsSchedule::Macrs5 => "MACRS 5-year",
            MacrsSchedule::Macrs7 => "MACRS 7-year",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_sum_to_one() {
        for s in [MacrsSchedule::Macrs3, MacrsSchedule::Macrs5, MacrsSchedule::Macrs7] {
            let total: f64 = s.table().iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "{s} sums to {total}");
        }
    }

    #[test]
    fn fraction_is_zero_outside_table() {
        assert_eq!(MacrsSchedule::Macrs5.fraction(0), 0.0);
        assert_eq!(MacrsSchedule::Macrs5.fraction(1), 0.20);
        assert_eq!(MacrsSchedule::Macrs5.fraction(6), 0.0576);
        assert_eq!(MacrsSchedule::Macrs5.fraction(7), 0.0);
    }

    #[test]
    fn serde_names() {
        let s: MacrsSchedule = serde_json::from_str("\"macrs_7\"").expect("should parse");
        assert_eq!(s, MacrsSchedule::Macrs7);
    }
}
