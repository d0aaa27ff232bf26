//! Financing, tax, and degradation assumptions plus the discounted-cash-flow
//! primitives the engine is built on.

pub mod debt;
pub mod macrs;
pub mod metrics;

use serde::{Deserialize, Serialize};

pub use debt::{AmortizationMode, LoanSchedule, LoanYear};
pub use macrs::MacrsSchedule;
pub use metrics::{inflation_factor, irr, npv, payback_years};

/// Project-level financial assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancialParams {
    /// Discount rate / WACC (fraction).
    pub wacc: f64,
    /// Project lifespan (years).
    pub lifespan_years: u32,
    /// Combined income tax rate (fraction).
    pub tax_rate: f64,
    /// Annual cost escalation (fraction).
    pub inflation_rate: f64,
    /// Residual value at end of life as a fraction of capex.
    ///
    /// Carried for project-file compatibility; the cash-flow model does not
    /// credit salvage.
    pub salvage_fraction: f64,
    /// Ancillary-services revenue in year one ($/yr).
    pub ancillary_revenue_per_year: f64,
    pub debt: DebtParams,
    pub depreciation: DepreciationParams,
    pub degradation: DegradationParams,
}

impl Default for FinancialParams {
    fn default() -> Self {
        Self {
            wacc: 0.131,
            lifespan_years: 30,
            tax_rate: 0.2009,
            inflation_rate: 0.024,
            salvage_fraction: 0.1,
            ancillary_revenue_per_year: 0.0,
            debt: DebtParams::default(),
            depreciation: DepreciationParams::default(),
            degradation: DegradationParams::default(),
        }
    }
}

/// Term-loan assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebtParams {
    /// Share of gross capex financed with debt (%).
    pub loan_pct: f64,
    /// Annual interest rate (fraction).
    pub interest_rate: f64,
    /// Loan tenor (years).
    pub term_years: u32,
    pub amortization: AmortizationMode,
}

impl Default for DebtParams {
    fn default() -> Self {
        Self {
            loan_pct: 0.0,
            interest_rate: 0.06,
            term_years: 10,
            amortization: AmortizationMode::default(),
        }
    }
}

/// Tax depreciation assumptions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepreciationParams {
    pub schedule: MacrsSchedule,
}

/// Annual battery degradation assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DegradationParams {
    /// Capacity lost per year of age (% of original).
    pub capacity_loss_pct_per_year: f64,
    /// Round-trip efficiency lost per year of age (% of original).
    pub rte_loss_pct_per_year: f64,
    /// Replace once remaining capacity falls below this share of original (%).
    pub replacement_threshold_pct: f64,
}

impl Default for DegradationParams {
    fn default() -> Self {
        Self {
            capacity_loss_pct_per_year: 2.5,
            rte_loss_pct_per_year: 0.25,
            replacement_threshold_pct: 70.0,
        }
    }
}

impl DegradationParams {
    /// No capacity or efficiency fade.
    pub fn none() -> Self {
        Self {
            capacity_loss_pct_per_year: 0.0,
            rte_loss_pct_per_year: 0.0,
            ..Self::default()
        }
    }

    /// Remaining capacity fraction after `age_years`.
    pub fn capacity_fraction(&self, age_years: u32) -> f64 {
        (1.0 - self.capacity_loss_pct_per_year / 100.0 * f64::from(age_years)).max(0.0)
    }

    /// Remaining round-trip-efficiency fraction after `age_years`.
    pub fn rte_fraction(&self, age_years: u32) -> f64 {
        (1.0 - self.rte_loss_pct_per_year / 100.0 * f64::from(age_years)).max(0.0)
    }
}
