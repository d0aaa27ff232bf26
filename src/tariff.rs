//! Utility tariff: time-of-use energy rates, demand charge, and seasonal multipliers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Time-of-use rate bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBucket {
    OffPeak,
    MidPeak,
    Peak,
}

impl fmt::Display for RateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RateBucket::OffPeak => "off_peak",
            RateBucket::MidPeak => "mid_peak",
            RateBucket::Peak => "peak",
        })
    }
}

/// Energy price per rate bucket ($/kWh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnergyRates {
    pub off_peak: f64,
    pub mid_peak: f64,
    pub peak: f64,
}

impl Default for EnergyRates {
    fn default() -> Self {
        Self {
            off_peak: 0.06,
            mid_peak: 0.10,
            peak: 0.15,
        }
    }
}

impl EnergyRates {
    /// Price of `bucket` ($/kWh).
    pub fn rate(&self, bucket: RateBucket) -> f64 {
        match bucket {
            RateBucket::OffPeak => self.off_peak,
            RateBucket::MidPeak => self.mid_peak,
            RateBucket::Peak => self.peak,
        }
    }
}

/// One time-of-use window, `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TouPeriod {
    pub start_hour: f64,
    pub end_hour: f64,
    pub bucket: RateBucket,
}

impl TouPeriod {
    pub fn new(start_hour: f64, end_hour: f64, bucket: RateBucket) -> Self {
        Self {
            start_hour,
            end_hour,
            bucket,
        }
    }

    fn contains(&self, hour: f64) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// A group of calendar months sharing one rate multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Season {
    pub name: String,
    /// Calendar months, 1 = January.
    pub months: Vec<u32>,
    /// Applied to both energy and demand rates.
    pub multiplier: f64,
}

/// Utility tariff parameters.
///
/// `tou_periods` is stored as entered; the gap-filled schedule is derived on
/// demand by [`fill_tou_gaps`] and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UtilityParams {
    pub energy_rates: EnergyRates,
    pub tou_periods: Vec<TouPeriod>,
    /// Demand charge ($/kW-month).
    pub demand_charge_per_kw_month: f64,
    /// Optional seasonal table; empty means a flat multiplier of 1.0.
    pub seasons: Vec<Season>,
}

impl Default for UtilityParams {
    fn default() -> Self {
        Self {
            energy_rates: EnergyRates::default(),
            tou_periods: vec![
                TouPeriod::new(8.0, 12.0, RateBucket::MidPeak),
                TouPeriod::new(12.0, 18.0, RateBucket::Peak),
                TouPeriod::new(18.0, 22.0, RateBucket::MidPeak),
            ],
            demand_charge_per_kw_month: 15.0,
            seasons: Vec::new(),
        }
    }
}

impl UtilityParams {
    /// Summer-peaking variant of the default tariff.
    pub fn summer_peaking() -> Self {
        Self {
            demand_charge_per_kw_month: 20.0,
            seasons: vec![
                Season {
                    name: "summer".to_string(),
                    months: vec![6, 7, 8, 9],
                    multiplier: 1.25,
                },
                Season {
                    name: "winter".to_string(),
                    months: vec![1, 2, 3, 4, 5, 10, 11, 12],
                    multiplier: 0.9,
                },
            ],
            ..Self::default()
        }
    }

    /// Gap-filled, sorted TOU schedule covering `[0, 24)`.
    pub fn filled_schedule(&self) -> Vec<TouPeriod> {
        fill_tou_gaps(&self.tou_periods)
    }

    /// Rate bucket in force at `hour` (0-24).
    pub fn bucket_at_hour(&self, hour: f64) -> RateBucket {
        self.tou_periods
            .iter()
            .find(|p| p.contains(hour))
            .map_or(RateBucket::OffPeak, |p| p.bucket)
    }

    /// Energy rate in force at `hour` ($/kWh), before seasonal adjustment.
    pub fn rate_at_hour(&self, hour: f64) -> f64 {
        self.energy_rates.rate(self.bucket_at_hour(hour))
    }

    /// Peak-bucket energy rate ($/kWh).
    pub fn peak_rate(&self) -> f64 {
        self.energy_rates.peak
    }

    /// Off-peak energy rate ($/kWh).
    pub fn off_peak_rate(&self) -> f64 {
        self.energy_rates.off_peak
    }

    /// Seasonal multiplier for calendar `month` (1-12).
    ///
    /// Returns 1.0 when no seasonal table is configured or the month is unmapped.
    pub fn seasonal_multiplier(&self, month: u32) -> f64 {
        self.seasons
            .iter()
            .find(|s| s.months.contains(&month))
            .map_or(1.0, |s| s.multiplier)
    }

    /// Checks schedule and season table consistency.
    ///
    /// Returns `(field, message)` pairs; empty when valid.
    pub fn check(&self) -> Vec<(String, String)> {
        let mut problems = Vec::new();

        for (i, p) in self.tou_periods.iter().enumerate() {
            if !(0.0..=24.0).contains(&p.start_hour) || !(0.0..=24.0).contains(&p.end_hour) {
                problems.push((
                    format!("utility.tou_periods[{i}]"),
                    "hours must be within [0, 24]".to_string(),
                ));
            } else if p.start_hour >= p.end_hour {
                problems.push((
                    format!("utility.tou_periods[{i}]"),
                    "start_hour must be < end_hour".to_string(),
                ));
            }
        }

        let mut sorted = self.tou_periods.clone();
        sorted.sort_by(|a, b| a.start_hour.total_cmp(&b.start_hour));
        for pair in sorted.windows(2) {
            if pair[1].start_hour < pair[0].end_hour {
                problems.push((
                    "utility.tou_periods".to_string(),
                    format!(
                        "period starting at {} overlaps period ending at {}",
                        pair[1].start_hour, pair[0].end_hour
                    ),
                ));
            }
        }

        if !self.seasons.is_empty() {
            let mut seen = [false; 12];
            for season in &self.seasons {
                for &m in &season.months {
                    if !(1..=12).contains(&m) {
                        problems.push((
                            format!("utility.seasons.{}", season.name),
                            format!("month {m} is outside 1-12"),
                        ));
                        continue;
                    }
                    let slot = &mut seen[(m - 1) as usize];
                    if *slot {
                        problems.push((
                            format!("utility.seasons.{}", season.name),
                            format!("month {m} is assigned to more than one season"),
                        ));
                    }
                    *slot = true;
                }
                if season.multiplier < 0.0 {
                    problems.push((
                        format!("utility.seasons.{}", season.name),
                        "multiplier must be >= 0".to_string(),
                    ));
                }
            }
            if let Some(missing) = seen.iter().position(|covered| !covered) {
                problems.push((
                    "utility.seasons".to_string(),
                    format!("month {} is not covered by any season", missing + 1),
                ));
            }
        }

        problems
    }
}

/// Sorts `periods` and fills every uncovered hour range in `[0, 24)` with
/// off-peak entries.
///
/// # Examples
///
/// ```
/// use eaf_bess_finance::tariff::{RateBucket, TouPeriod, fill_tou_gaps};
///
/// let filled = fill_tou_gaps(&[TouPeriod::new(12.0, 18.0, RateBucket::Peak)]);
/// assert_eq!(filled.len(), 3);
/// assert_eq!(filled[0], TouPeriod::new(0.0, 12.0, RateBucket::OffPeak));
/// assert_eq!(filled[2], TouPeriod::new(18.0, 24.0, RateBucket::OffPeak));
/// ```
pub fn fill_tou_gaps(periods: &[TouPeriod]) -> Vec<TouPeriod> {
    let mut sorted: Vec<TouPeriod> = periods
        .iter()
        .copied()
        .filter(|p| p.start_hour < p.end_hour)
        .collect();
    sorted.sort_by(|a, b| a.start_hour.total_cmp(&b.start_hour));

    let mut filled = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0.0_f64;
    for p in sorted {
        let start = p.start_hour.max(cursor);
        let end = p.end_hour.min(24.0);
        if start > cursor {
            filled.push(TouPeriod::new(cursor, start, RateBucket::OffPeak));
        }
        if end > start {
            filled.push(TouPeriod::new(start, end, p.bucket));
            cursor = end;
        }
    }
    if cursor < 24.0 {
        filled.push(TouPeriod::new(cursor, 24.0, RateBucket::OffPeak));
    }
    filled
}
