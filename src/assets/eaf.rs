use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Real-power draw per ton of furnace tapping capacity at the main-melt plateau (MW/t).
const MW_PER_TON: f64 = 0.65;

/// Number of samples in one synthetic heat cycle.
pub const PROFILE_POINTS: usize = 200;

/// Electric arc furnace operating parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EafParams {
    /// Furnace tapping capacity (tons).
    pub furnace_size_tons: f64,
    /// Number of furnaces operating in lockstep.
    pub eaf_count: u32,
    /// Maximum power the grid connection may supply (MW).
    pub grid_cap_mw: f64,
    /// Heats per operating day.
    pub cycles_per_day: f64,
    /// Tap-to-tap duration of one heat (minutes).
    pub cycle_duration_min: f64,
    /// Operating days per year.
    pub operating_days_per_year: f64,
}

impl Default for EafParams {
    fn default() -> Self {
        Self {
            furnace_size_tons: 100.0,
            eaf_count: 1,
            grid_cap_mw: 35.0,
            cycles_per_day: 24.0,
            cycle_duration_min: 36.0,
            operating_days_per_year: 300.0,
        }
    }
}

impl EafParams {
    /// Available mill preset names.
    pub const PRESETS: &[&str] = &["mini_mill", "mid_mill", "large_mill"];

    /// Returns a mill preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "mini_mill" => Some(Self {
                furnace_size_tons: 60.0,
                grid_cap_mw: 25.0,
                cycles_per_day: 20.0,
                cycle_duration_min: 45.0,
                ..Self::default()
            }),
            "mid_mill" => Some(Self::default()),
            "large_mill" => Some(Self {
                furnace_size_tons: 150.0,
                eaf_count: 2,
                grid_cap_mw: 100.0,
                cycles_per_day: 20.0,
                cycle_duration_min: 50.0,
                operating_days_per_year: 330.0,
            }),
            _ => None,
        }
    }

    /// Main-melt plateau demand of all furnaces combined (MW).
    pub fn peak_demand_mw(&self) -> f64 {
        self.furnace_size_tons * MW_PER_TON * f64::from(self.eaf_count)
    }

    /// Builds the synthetic single-heat power trace.
    ///
    /// The shape is a heuristic: a bore-in ramp, a main-melt plateau with a
    /// small ripple, a melt taper, and a refining plateau with ripple.
    pub fn cycle_profile(&self) -> CycleProfile {
        let peak = self.peak_demand_mw().max(0.0);
        let dt_hours = self.cycle_duration_min.max(0.0) / 60.0 / PROFILE_POINTS as f64;
        let eaf_mw = (0..PROFILE_POINTS)
            .map(|i| peak * shape(i as f64 / PROFILE_POINTS as f64))
            .collect();
        CycleProfile { dt_hours, eaf_mw }
    }
}

/// Normalized furnace draw at fraction `x` of the heat.
fn shape(x: f64) -> f64 {
    if x < 0.05 {
        0.30 + (0.95 - 0.30) * (x / 0.05)
    } else if x < 0.60 {
        0.95 + 0.05 * (2.0 * PI * 15.0 * x).sin()
    } else if x < 0.80 {
        0.95 - (0.95 - 0.50) * (x - 0.60) / 0.20
    } else {
        0.45 * (1.0 + 0.03 * (2.0 * PI * 30.0 * x).sin())
    }
}

/// One heat's furnace demand sampled at a fixed interval.
#[derive(Debug, Clone)]
pub struct CycleProfile {
    /// Sample spacing (hours).
    pub dt_hours: f64,
    /// Furnace demand per sample (MW).
    pub eaf_mw: Vec<f64>,
}

impl CycleProfile {
    /// Energy drawn by the furnace over one heat (MWh).
    pub fn energy_mwh(&self) -> f64 {
        self.eaf_mw.iter().sum::<f64>() * self.dt_hours
    }

    /// Highest sampled demand (MW).
    pub fn peak_mw(&self) -> f64 {
        self.eaf_mw.iter().copied().fold(0.0, f64::max)
    }
}

/// Grid and battery shares of one furnace demand sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSplit {
    /// Power drawn from the grid (MW).
    pub grid_mw: f64,
    /// Power discharged by the battery (MW).
    pub bess_mw: f64,
}

/// Splits furnace demand between the grid and the battery.
///
/// Demand above `grid_cap_mw` is met by the battery up to `bess_max_mw`;
/// whatever the battery cannot cover falls back to the grid.
pub fn split_power(eaf_mw: f64, grid_cap_mw: f64, bess_max_mw: f64) -> PowerSplit {
    if eaf_mw > grid_cap_mw {
        let excess = eaf_mw - grid_cap_mw;
        let bess_mw = excess.min(bess_max_mw.max(0.0));
        PowerSplit {
            grid_mw: grid_cap_mw + (excess - bess_mw),
            bess_mw,
        }
    } else {
        PowerSplit {
            grid_mw: eaf_mw,
            bess_mw: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_has_fixed_resolution() {
        let profile = EafParams::default().cycle_profile();
        assert_eq!(profile.eaf_mw.len(), PROFILE_POINTS);
        assert!((profile.dt_hours * PROFILE_POINTS as f64 - 0.6).abs() < 1e-12);
    }

    #[test]
    fn profile_peaks_at_main_melt() {
        let eaf = EafParams::default();
        let profile = eaf.cycle_profile();
        assert!(profile.peak_mw() <= eaf.peak_demand_mw() + 1e-9);
        assert!(profile.peak_mw() > 0.95 * eaf.peak_demand_mw());
        // refining tail sits well below the plateau
        let last = profile.eaf_mw[PROFILE_POINTS - 1];
        assert!(last < 0.5 * eaf.peak_demand_mw());
    }

    #[test]
    fn profile_is_deterministic() {
        let a = EafParams::default().cycle_profile();
        let b = EafParams::default().cycle_profile();
        assert_eq!(a.eaf_mw, b.eaf_mw);
    }

    #[test]
    fn furnace_count_scales_demand() {
        let one = EafParams::default();
        let two = EafParams {
            eaf_count: 2,
            ..EafParams::default()
        };
        assert!((two.peak_demand_mw() - 2.0 * one.peak_demand_mw()).abs() < 1e-9);
    }

    #[test]
    fn split_below_cap_is_all_grid() {
        let s = split_power(20.0, 35.0, 10.0);
        assert_eq!(s, PowerSplit { grid_mw: 20.0, bess_mw: 0.0 });
    }

    #[test]
    fn split_above_cap_uses_battery() {
        let s = split_power(50.0, 35.0, 20.0);
        assert_eq!(s, PowerSplit { grid_mw: 35.0, bess_mw: 15.0 });
    }

    #[test]
    fn split_uncovered_excess_returns_to_grid() {
        let s = split_power(65.0, 35.0, 20.0);
        assert_eq!(s, PowerSplit { grid_mw: 45.0, bess_mw: 20.0 });
        assert!((s.grid_mw + s.bess_mw - 65.0).abs() < 1e-12);
    }

    #[test]
    fn presets_resolve() {
        for name in EafParams::PRESETS {
            assert!(EafParams::preset(name).is_some(), "{name} should resolve");
        }
        assert!(EafParams::preset("bogus").is_none());
    }
}
