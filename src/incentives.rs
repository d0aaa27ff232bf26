//! Tax credits and rebates that reduce the installed cost of the battery.

use serde::{Deserialize, Serialize};

use crate::assets::BessParams;

/// A program paid as a percentage of gross capex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PercentProgram {
    pub enabled: bool,
    /// Percent of gross capex (e.g. 30.0).
    pub pct: f64,
}

impl PercentProgram {
    pub fn new(enabled: bool, pct: f64) -> Self {
        Self { enabled, pct }
    }

    fn amount(&self, gross_capex: f64) -> f64 {
        if self.enabled {
            non_negative(self.pct) / 100.0 * gross_capex
        } else {
            0.0
        }
    }
}

/// A program paid per kWh of installed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerKwhProgram {
    pub enabled: bool,
    /// $/kWh of nameplate capacity.
    pub per_kwh: f64,
}

impl PerKwhProgram {
    pub fn new(enabled: bool, per_kwh: f64) -> Self {
        Self { enabled, per_kwh }
    }

    fn amount(&self, capacity_kwh: f64) -> f64 {
        if self.enabled {
            non_negative(self.per_kwh) * capacity_kwh
        } else {
            0.0
        }
    }
}

/// Basis of the user-defined incentive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomKind {
    #[default]
    Percent,
    PerKwh,
}

/// User-defined incentive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomIncentive {
    pub enabled: bool,
    pub kind: CustomKind,
    /// Percent of capex or $/kWh depending on `kind`.
    pub value: f64,
    pub description: String,
}

impl Default for CustomIncentive {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: CustomKind::Percent,
            value: 0.0,
            description: "Custom Incentive".to_string(),
        }
    }
}

/// Independently toggleable incentive programs.
///
/// ITC and CEIC are mutually exclusive: when both are enabled only the
/// larger is applied. Every other program stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncentiveParams {
    /// Federal investment tax credit.
    pub itc: PercentProgram,
    /// Clean electricity investment credit.
    pub ceic: PercentProgram,
    pub energy_community_bonus: PercentProgram,
    pub domestic_content_bonus: PercentProgram,
    pub low_income_bonus: PercentProgram,
    /// California self-generation incentive program.
    pub sgip: PerKwhProgram,
    /// State storage rebate.
    pub state_storage: PerKwhProgram,
    pub custom: CustomIncentive,
}

impl Default for IncentiveParams {
    fn default() -> Self {
        Self {
            itc: PercentProgram::new(false, 30.0),
            ceic: PercentProgram::new(false, 30.0),
            energy_community_bonus: PercentProgram::new(false, 10.0),
            domestic_content_bonus: PercentProgram::new(false, 10.0),
            low_income_bonus: PercentProgram::new(false, 10.0),
            sgip: PerKwhProgram::new(false, 150.0),
            state_storage: PerKwhProgram::new(false, 50.0),
            custom: CustomIncentive::default(),
        }
    }
}

/// One applied incentive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveLine {
    pub description: String,
    pub amount: f64,
}

/// Result of [`compute_incentives`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncentiveSummary {
    /// Sum of all applied incentives ($, >= 0).
    pub total: f64,
    /// Applied incentives in evaluation order.
    pub breakdown: Vec<IncentiveLine>,
    /// Gross capex the percentages were applied to ($).
    pub gross_capex: f64,
    /// ITC amount when the ITC won the ITC/CEIC comparison, else 0.
    pub itc_amount: f64,
}

impl IncentiveSummary {
    fn push(&mut self, description: &str, amount: f64) {
        if amount > 0.0 {
            self.breakdown.push(IncentiveLine {
                description: description.to_string(),
                amount,
            });
            self.total += amount;
        }
    }
}

/// Computes the incentives that apply to `bess`.
///
/// Never fails: disabled programs, non-finite values, and negative rates
/// contribute 0.
pub fn compute_incentives(bess: &BessParams, incentives: &IncentiveParams) -> IncentiveSummary {
    let gross_capex = non_negative(bess.gross_capex());
    let capacity_kwh = non_negative(bess.capacity_kwh());

    let mut summary = IncentiveSummary {
        gross_capex,
        ..IncentiveSummary::default()
    };

    let itc = incentives.itc.amount(gross_capex);
    let ceic = incentives.ceic.amount(gross_capex);
    if itc > 0.0 || ceic > 0.0 {
        if itc >= ceic {
            summary.push("Federal ITC", itc);
            summary.itc_amount = itc;
        } else {
            summary.push("Federal CEIC", ceic);
        }
    }

    summary.push(
        "Energy Community Bonus",
        incentives.energy_community_bonus.amount(gross_capex),
    );
    summary.push(
        "Domestic Content Bonus",
        incentives.domestic_content_bonus.amount(gross_capex),
    );
    summary.push(
        "Low-Income Community Bonus",
        incentives.low_income_bonus.amount(gross_capex),
    );
    summary.push("SGIP", incentives.sgip.amount(capacity_kwh));
    summary.push(
        "State Storage Rebate",
        incentives.state_storage.amount(capacity_kwh),
    );

    let custom = &incentives.custom;
    if custom.enabled {
        let value = non_negative(custom.value);
        let amount = match custom.kind {
            CustomKind::Percent => value / 100.0 * gross_capex,
            CustomKind::PerKwh => value * capacity_kwh,
        };
        let label = if custom.description.trim().is_empty() {
            "Custom Incentive"
        } else {
            custom.description.as_str()
        };
        summary.push(label, amount);
    }

    summary
}

fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}
