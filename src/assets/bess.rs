use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Battery chemistry / storage technology.
///
/// Selects the default cost and performance table used by
/// [`BessParams::from_template`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    Lfp,
    Nmc,
    VanadiumFlow,
    SodiumIon,
    IronAir,
    Supercapacitor,
}

impl Technology {
    /// All supported technologies, in template-table order.
    pub const ALL: [Technology; 6] = [
        Technology::Lfp,
        Technology::Nmc,
        Technology::VanadiumFlow,
        Technology::SodiumIon,
        Technology::IronAir,
        Technology::Supercapacitor,
    ];

    /// Snake-case identifier used in scenario and project files.
    pub fn key(self) -> &'static str {
        match self {
            Technology::Lfp => "lfp",
            Technology::Nmc => "nmc",
            Technology::VanadiumFlow => "vanadium_flow",
            Technology::SodiumIon => "sodium_ion",
            Technology::IronAir => "iron_air",
            Technology::Supercapacitor => "supercapacitor",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Technology::Lfp => "LFP",
            Technology::Nmc => "NMC",
            Technology::VanadiumFlow => "Vanadium Flow",
            Technology::SodiumIon => "Sodium-Ion",
            Technology::IronAir => "Iron-Air",
            Technology::Supercapacitor => "Supercapacitor",
        };
        f.write_str(name)
    }
}

impl FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Technology::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| {
                let keys: Vec<&str> = Technology::ALL.iter().map(|t| t.key()).collect();
                format!("unknown technology \"{s}\", available: {}", keys.join(", "))
            })
    }
}

/// Battery energy storage system sizing, cost, and performance parameters.
///
/// Energy-linked unit costs are in $/kWh of nameplate capacity, the PCS cost
/// in $/kW of power rating. Exactly one of the two O&M fields is non-zero for
/// a technology template; both are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BessParams {
    /// Storage technology.
    pub technology: Technology,
    /// Nameplate energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Power rating (MW).
    pub power_mw: f64,
    /// Storage block plus balance-of-system cost ($/kWh).
    pub storage_bos_cost_per_kwh: f64,
    /// Power conversion system cost ($/kW).
    pub pcs_cost_per_kw: f64,
    /// Engineering, procurement and construction cost ($/kWh).
    pub epc_cost_per_kwh: f64,
    /// System integration cost ($/kWh).
    pub integration_cost_per_kwh: f64,
    /// Fixed O&M cost ($/kW-yr).
    pub om_cost_per_kw_yr: f64,
    /// Fixed O&M cost ($/kWh-yr).
    pub om_cost_per_kwh_yr: f64,
    /// Round-trip efficiency (%).
    pub rte_pct: f64,
    /// Annual insurance premium (% of gross capex).
    pub insurance_pct: f64,
    /// End-of-life disconnect cost ($/kWh).
    pub disconnect_cost_per_kwh: f64,
    /// End-of-life recycling cost ($/kWh, negative is net revenue).
    pub recycling_cost_per_kwh: f64,
    /// Rated cycle life (equivalent full cycles).
    pub cycle_life: f64,
    /// Usable depth of discharge (%).
    pub dod_pct: f64,
    /// Calendar life (years).
    pub calendar_life_years: f64,
}

impl Default for BessParams {
    fn default() -> Self {
        Self::from_template(Technology::Lfp, 40.0, 20.0)
    }
}

impl BessParams {
    /// Builds parameters from the default cost table for `technology`.
    ///
    /// # Examples
    ///
    /// ```
    /// use eaf_bess_finance::assets::{BessParams, Technology};
    ///
    /// let bess = BessParams::from_template(Technology::Lfp, 40.0, 20.0);
    /// assert_eq!(bess.cycle_life, 4000.0);
    /// assert!(bess.gross_capex() > 0.0);
    /// ```
    pub fn from_template(technology: Technology, capacity_mwh: f64, power_mw: f64) -> Self {
        let base = Self {
            technology,
            capacity_mwh,
            power_mw,
            storage_bos_cost_per_kwh: 236.0,
            pcs_cost_per_kw: 75.0,
            epc_cost_per_kwh: 56.0,
            integration_cost_per_kwh: 42.0,
            om_cost_per_kw_yr: 25.0,
            om_cost_per_kwh_yr: 0.0,
            rte_pct: 86.0,
            insurance_pct: 0.5,
            disconnect_cost_per_kwh: 2.0,
            recycling_cost_per_kwh: 1.0,
            cycle_life: 4000.0,
            dod_pct: 95.0,
            calendar_life_years: 16.0,
        };

        match technology {
            Technology::Lfp => base,
            Technology::Nmc => Self {
                storage_bos_cost_per_kwh: 250.0,
                rte_pct: 85.0,
                recycling_cost_per_kwh: -2.0,
                cycle_life: 3500.0,
                dod_pct: 90.0,
                calendar_life_years: 13.0,
                ..base
            },
            Technology::VanadiumFlow => Self {
                storage_bos_cost_per_kwh: 400.0,
                pcs_cost_per_kw: 150.0,
                epc_cost_per_kwh: 60.0,
                integration_cost_per_kwh: 50.0,
                om_cost_per_kw_yr: 0.0,
                om_cost_per_kwh_yr: 7.0,
                rte_pct: 70.0,
                disconnect_cost_per_kwh: 3.0,
                recycling_cost_per_kwh: -5.0,
                cycle_life: 15000.0,
                dod_pct: 100.0,
                calendar_life_years: 25.0,
                ..base
            },
            Technology::SodiumIon => Self {
                storage_bos_cost_per_kwh: 220.0,
                epc_cost_per_kwh: 55.0,
                integration_cost_per_kwh: 40.0,
                om_cost_per_kw_yr: 22.0,
                rte_pct: 88.0,
                cycle_life: 5000.0,
                calendar_life_years: 15.0,
                ..base
            },
            Technology::IronAir => Self {
                storage_bos_cost_per_kwh: 30.0,
                pcs_cost_per_kw: 300.0,
                epc_cost_per_kwh: 20.0,
                integration_cost_per_kwh: 10.0,
                om_cost_per_kw_yr: 0.0,
                om_cost_per_kwh_yr: 1.0,
                rte_pct: 45.0,
                disconnect_cost_per_kwh: 1.0,
                recycling_cost_per_kwh: 0.5,
                cycle_life: 10000.0,
                dod_pct: 100.0,
                calendar_life_years: 20.0,
                ..base
            },
            Technology::Supercapacitor => Self {
                storage_bos_cost_per_kwh: 2000.0,
                pcs_cost_per_kw: 100.0,
                epc_cost_per_kwh: 100.0,
                integration_cost_per_kwh: 100.0,
                om_cost_per_kw_yr: 10.0,
                rte_pct: 95.0,
                disconnect_cost_per_kwh: 5.0,
                recycling_cost_per_kwh: 5.0,
                cycle_life: 1_000_000.0,
                dod_pct: 100.0,
                calendar_life_years: 20.0,
                ..base
            },
        }
    }

    /// Returns a copy resized to `capacity_mwh` / `power_mw`, keeping unit costs.
    pub fn with_size(&self, capacity_mwh: f64, power_mw: f64) -> Self {
        Self {
            capacity_mwh,
            power_mw,
            ..self.clone()
        }
    }

    /// Returns a copy with capacity and round-trip efficiency scaled by the
    /// given remaining fractions. Power rating does not degrade.
    pub fn degraded(&self, capacity_fraction: f64, rte_fraction: f64) -> Self {
        Self {
            capacity_mwh: self.capacity_mwh * capacity_fraction,
            rte_pct: self.rte_pct * rte_fraction,
            ..self.clone()
        }
    }

    /// Nameplate capacity in kWh.
    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_mwh * 1000.0
    }

    /// Power rating in kW.
    pub fn power_kw(&self) -> f64 {
        self.power_mw * 1000.0
    }

    /// Round-trip efficiency as a fraction, clamped to `[0.01, 1.0]`.
    pub fn rte_fraction(&self) -> f64 {
        (self.rte_pct / 100.0).clamp(0.01, 1.0)
    }

    /// Depth of discharge as a fraction, clamped to `[0.0, 1.0]`.
    pub fn dod_fraction(&self) -> f64 {
        (self.dod_pct / 100.0).clamp(0.0, 1.0)
    }

    /// Gross installed capital cost ($).
    pub fn gross_capex(&self) -> f64 {
        let per_kwh = self.storage_bos_cost_per_kwh
            + self.epc_cost_per_kwh
            + self.integration_cost_per_kwh;
        per_kwh * self.capacity_kwh() + self.pcs_cost_per_kw * self.power_kw()
    }

    /// Year-one fixed O&M including insurance ($).
    pub fn year_one_om_cost(&self) -> f64 {
        self.om_cost_per_kw_yr * self.power_kw()
            + self.om_cost_per_kwh_yr * self.capacity_kwh()
            + self.insurance_pct / 100.0 * self.gross_capex()
    }

    /// End-of-life disconnect plus recycling cost in today's dollars ($).
    pub fn decommissioning_cost(&self) -> f64 {
        (self.disconnect_cost_per_kwh + self.recycling_cost_per_kwh) * self.capacity_kwh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfp_template_capex() {
        let bess = BessParams::from_template(Technology::Lfp, 40.0, 20.0);
        // (236 + 56 + 42) $/kWh * 40_000 kWh + 75 $/kW * 20_000 kW
        let expected = 334.0 * 40_000.0 + 75.0 * 20_000.0;
        assert!((bess.gross_capex() - expected).abs() < 1e-6);
    }

    #[test]
    fn every_template_has_exactly_one_om_path() {
        for tech in Technology::ALL {
            let bess = BessParams::from_template(tech, 10.0, 5.0);
            let per_kw = bess.om_cost_per_kw_yr > 0.0;
            let per_kwh = bess.om_cost_per_kwh_yr > 0.0;
            assert!(per_kw ^ per_kwh, "{tech} should use one O&M basis");
        }
    }

    #[test]
    fn year_one_om_includes_insurance() {
        let bess = BessParams::from_template(Technology::Lfp, 40.0, 20.0);
        let expected = 25.0 * 20_000.0 + 0.005 * bess.gross_capex();
        assert!((bess.year_one_om_cost() - expected).abs() < 1e-6);
    }

    #[test]
    fn flow_battery_recycling_is_net_revenue() {
        let bess = BessParams::from_template(Technology::VanadiumFlow, 10.0, 2.5);
        assert!(bess.recycling_cost_per_kwh < 0.0);
    }

    #[test]
    fn degraded_keeps_power() {
        let bess = BessParams::default();
        let d = bess.degraded(0.8, 0.9);
        assert_eq!(d.power_mw, bess.power_mw);
        assert!((d.capacity_mwh - 32.0).abs() < 1e-9);
        assert!((d.rte_pct - 77.4).abs() < 1e-9);
    }

    #[test]
    fn rte_fraction_is_clamped() {
        let mut bess = BessParams::default();
        bess.rte_pct = 0.0;
        assert_eq!(bess.rte_fraction(), 0.01);
        bess.rte_pct = 140.0;
        assert_eq!(bess.rte_fraction(), 1.0);
    }

    #[test]
    fn technology_parses_from_key() {
        for tech in Technology::ALL {
            assert_eq!(tech.key().parse::<Technology>(), Ok(tech));
        }
        assert!("lead_acid".parse::<Technology>().is_err());
    }

    #[test]
    fn with_size_keeps_unit_costs() {
        let bess = BessParams::from_template(Technology::Nmc, 40.0, 20.0);
        let resized = bess.with_size(5.0, 2.0);
        assert_eq!(resized.storage_bos_cost_per_kwh, bess.storage_bos_cost_per_kwh);
        assert_eq!(resized.capacity_mwh, 5.0);
        assert_eq!(resized.power_mw, 2.0);
    }
}
