//! Monthly utility bills with and without battery peak shaving.
//!
//! All furnace energy is priced at the peak TOU rate in both the with- and
//! without-battery bills, and recharging is assumed to happen entirely
//! off-peak. Both are deliberate approximations of the tariff.

use tracing::debug;

use crate::assets::{BessParams, EafParams, split_power};
use crate::tariff::UtilityParams;

const DAYS_IN_MONTH: [f64; 12] = [
    31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0,
];

/// One month of the billing comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBill {
    /// Calendar month, 1 = January.
    pub month: u32,
    pub seasonal_multiplier: f64,
    pub bill_without_bess: f64,
    pub bill_with_bess: f64,
    pub charging_cost: f64,
    pub discharge_mwh: f64,
    pub peak_demand_without_kw: f64,
    pub peak_demand_with_kw: f64,
}

/// Result of [`simulate_year`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualBilling {
    /// Bill reduction net of charging cost ($).
    pub annual_savings: f64,
    /// Bill reduction before charging cost ($).
    pub gross_savings: f64,
    pub total_annual_discharge_mwh: f64,
    pub annual_charging_cost: f64,
    pub months: Vec<MonthlyBill>,
}

/// Per-heat energy and demand figures shared by every month.
#[derive(Debug, Clone, Copy)]
struct HeatSummary {
    eaf_mwh: f64,
    grid_mwh: f64,
    bess_mwh: f64,
    eaf_peak_mw: f64,
    grid_peak_mw: f64,
}

fn summarize_heat(eaf: &EafParams, bess: &BessParams) -> HeatSummary {
    let profile = eaf.cycle_profile();
    let dt = profile.dt_hours;

    let bess_mw: Vec<f64> = profile
        .eaf_mw
        .iter()
        .map(|&p| split_power(p, eaf.grid_cap_mw, bess.power_mw).bess_mw)
        .collect();
    let unconstrained_mwh = bess_mw.iter().sum::<f64>() * dt;

    // a heat cannot discharge more than the usable energy currently installed
    let usable_mwh = (bess.capacity_mwh * bess.dod_fraction()).max(0.0);
    let scale = if unconstrained_mwh > usable_mwh && unconstrained_mwh > 0.0 {
        usable_mwh / unconstrained_mwh
    } else {
        1.0
    };

    let mut grid_sum_mw = 0.0;
    let mut grid_peak_mw = 0.0_f64;
    for (&eaf_mw, &b) in profile.eaf_mw.iter().zip(&bess_mw) {
        let grid = eaf_mw - b * scale;
        grid_sum_mw += grid;
        grid_peak_mw = grid_peak_mw.max(grid);
    }

    HeatSummary {
        eaf_mwh: profile.energy_mwh(),
        grid_mwh: grid_sum_mw * dt,
        bess_mwh: unconstrained_mwh * scale,
        eaf_peak_mw: profile.peak_mw(),
        grid_peak_mw,
    }
}

/// Simulates one year of utility bills for the battery as it stands in
/// `year_index` (possibly degraded).
pub fn simulate_year(
    eaf: &EafParams,
    bess: &BessParams,
    utility: &UtilityParams,
    year_index: u32,
) -> AnnualBilling {
    let heat = summarize_heat(eaf, bess);
    let rte = bess.rte_fraction();
    let peak_rate = utility.peak_rate();
    let off_peak_rate = utility.off_peak_rate();
    let demand_charge = utility.demand_charge_per_kw_month;

    let mut months = Vec::with_capacity(12);
    for (idx, days) in DAYS_IN_MONTH.iter().enumerate() {
        let month = idx as u32 + 1;
        let mult = utility.seasonal_multiplier(month);
        let operating_days = eaf.operating_days_per_year * days / 365.0;
        let heats = eaf.cycles_per_day.max(0.0) * operating_days.max(0.0);

        let eaf_kwh = heat.eaf_mwh * heats * 1000.0;
        let grid_kwh = heat.grid_mwh * heats * 1000.0;
        let discharge_kwh = heat.bess_mwh * heats * 1000.0;

        let peak_without_kw = heat.eaf_peak_mw * 1000.0;
        let peak_with_kw = heat.grid_peak_mw * 1000.0;

        let bill_without_bess =
            eaf_kwh * peak_rate * mult + peak_without_kw * demand_charge * mult;
        let bill_with_bess = grid_kwh * peak_rate * mult + peak_with_kw * demand_charge * mult;
        let charging_cost = discharge_kwh / rte * off_peak_rate * mult;

        months.push(MonthlyBill {
            month,
            seasonal_multiplier: mult,
            bill_without_bess,
            bill_with_bess,
            charging_cost,
            discharge_mwh: discharge_kwh / 1000.0,
            peak_demand_without_kw: peak_without_kw,
            peak_demand_with_kw: peak_with_kw,
        });
    }

    let without: f64 = months.iter().map(|m| m.bill_without_bess).sum();
    let with: f64 = months.iter().map(|m| m.bill_with_bess).sum();
    let annual_charging_cost: f64 = months.iter().map(|m| m.charging_cost).sum();
    let total_annual_discharge_mwh: f64 = months.iter().map(|m| m.discharge_mwh).sum();
    let gross_savings = without - with;

    debug!(
        year = year_index,
        capacity_mwh = bess.capacity_mwh,
        gross_savings,
        annual_charging_cost,
        total_annual_discharge_mwh,
        "billing year simulated"
    );

    AnnualBilling {
        annual_savings: gross_savings - annual_charging_cost,
        gross_savings,
        total_annual_discharge_mwh,
        annual_charging_cost,
        months,
    }
}
