//! Engine output types: per-year cash-flow rows and the run summary.

use std::fmt;

use crate::incentives::IncentiveLine;

/// Cash-flow record for one simulated project year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyCashFlowRow {
    /// Project year (1-based).
    pub year: u32,
    /// Bill without battery minus bill with battery ($).
    pub gross_savings: f64,
    /// Off-peak energy bought to recharge the battery ($).
    pub charging_cost: f64,
    /// Gross savings net of charging cost ($).
    pub net_savings: f64,
    pub ancillary_revenue: f64,
    pub om_cost: f64,
    pub interest: f64,
    pub principal: f64,
    pub depreciation: f64,
    pub replacement_cost: f64,
    pub decommissioning_cost: f64,
    pub taxable_income: f64,
    pub taxes: f64,
    pub project_net_cash_flow: f64,
    pub equity_net_cash_flow: f64,
    pub cumulative_equity_cash_flow: f64,
    /// Loan balance after this year's principal payment ($).
    pub remaining_loan_balance: f64,
    /// Remaining capacity as a share of nameplate (%).
    pub battery_capacity_pct: f64,
    /// Energy discharged by the battery (MWh).
    pub discharge_mwh: f64,
    /// Whether the battery was replaced at the end of this year.
    pub replaced: bool,
}

impl fmt::Display for YearlyCashFlowRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "yr={:>3} | savings={:>13.0}  om={:>11.0}  debt={:>11.0}  dep={:>11.0} \
             | tax={:>11.0} | project={:>13.0}  equity={:>13.0}  cum={:>14.0} \
             | cap={:>5.1}%{}",
            self.year,
            self.net_savings,
            self.om_cost,
            self.interest + self.principal,
            self.depreciation,
            self.taxes,
            self.project_net_cash_flow,
            self.equity_net_cash_flow,
            self.cumulative_equity_cash_flow,
            self.battery_capacity_pct,
            if self.replaced { " replaced" } else { "" },
        )
    }
}

/// Summary metrics and cash-flow detail of one engine run.
///
/// Undefined ratios are NaN; a payback that never occurs is `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialMetrics {
    pub project_npv: f64,
    pub equity_npv: f64,
    pub project_irr: f64,
    pub equity_irr: f64,
    /// Equity payback (years).
    pub payback_years: f64,
    /// Levelized cost of storage ($/MWh discharged).
    pub lcos_per_mwh: f64,
    pub avg_dscr: f64,
    pub min_dscr: f64,
    /// Project cash flows, index = year (0..=lifespan).
    pub project_cash_flows: Vec<f64>,
    /// Equity cash flows, index = year (0..=lifespan).
    pub equity_cash_flows: Vec<f64>,
    pub rows: Vec<YearlyCashFlowRow>,
    pub gross_initial_cost: f64,
    pub total_incentives: f64,
    pub incentive_breakdown: Vec<IncentiveLine>,
    pub net_initial_cost: f64,
    pub loan_amount: f64,
    pub equity_investment: f64,
    pub year_one_om_cost: f64,
    pub year_one_discharge_mwh: f64,
    pub replacement_count: usize,
}

impl FinancialMetrics {
    /// All-sentinel result returned when a run cannot be completed.
    pub fn null() -> Self {
        Self {
            project_npv: f64::NAN,
            equity_npv: f64::NAN,
            project_irr: f64::NAN,
            equity_irr: f64::NAN,
            payback_years: f64::INFINITY,
            lcos_per_mwh: f64::NAN,
            avg_dscr: f64::NAN,
            min_dscr: f64::NAN,
            project_cash_flows: Vec::new(),
            equity_cash_flows: Vec::new(),
            rows: Vec::new(),
            gross_initial_cost: f64::NAN,
            total_incentives: f64::NAN,
            incentive_breakdown: Vec::new(),
            net_initial_cost: f64::NAN,
            loan_amount: f64::NAN,
            equity_investment: f64::NAN,
            year_one_om_cost: f64::NAN,
            year_one_discharge_mwh: f64::NAN,
            replacement_count: 0,
        }
    }

    /// Whether this is the sentinel produced by [`FinancialMetrics::null`].
    pub fn is_null(&self) -> bool {
        self.rows.is_empty() && self.project_npv.is_nan()
    }
}

/// Formats a ratio as a percentage, or `n/a` when undefined.
fn pct_or_na(v: f64) -> String {
    if v.is_finite() {
        format!("{:.2}%", v * 100.0)
    } else {
        "n/a".to_string()
    }
}

fn value_or_na(v: f64, precision: usize) -> String {
    if v.is_finite() {
        format!("{v:.precision$}")
    } else {
        "n/a".to_string()
    }
}

impl fmt::Display for FinancialMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Financial Metrics ---")?;
        writeln!(
            f,
            "Gross initial cost:    ${}",
            value_or_na(self.gross_initial_cost, 0)
        )?;
        writeln!(
            f,
            "Total incentives:      ${}",
            value_or_na(self.total_incentives, 0)
        )?;
        for line in &self.incentive_breakdown {
            writeln!(f, "  {}: ${:.0}", line.description, line.amount)?;
        }
        writeln!(
            f,
            "Net initial cost:      ${}",
            value_or_na(self.net_initial_cost, 0)
        )?;
        writeln!(
            f,
            "Equity investment:     ${}",
            value_or_na(self.equity_investment, 0)
        )?;
        writeln!(
            f,
            "Year-1 O&M:            ${}",
            value_or_na(self.year_one_om_cost, 0)
        )?;
        writeln!(
            f,
            "Year-1 discharge:      {} MWh",
            value_or_na(self.year_one_discharge_mwh, 1)
        )?;
        writeln!(f, "Project NPV:           ${}", value_or_na(self.project_npv, 0))?;
        writeln!(f, "Equity NPV:            ${}", value_or_na(self.equity_npv, 0))?;
        writeln!(f, "Project IRR:           {}", pct_or_na(self.project_irr))?;
        writeln!(f, "Equity IRR:            {}", pct_or_na(self.equity_irr))?;
        if self.payback_years.is_finite() {
            writeln!(f, "Equity payback:        {:.2} years", self.payback_years)?;
        } else {
            writeln!(f, "Equity payback:        never")?;
        }
        writeln!(
            f,
            "LCOS:                  {} $/MWh",
            value_or_na(self.lcos_per_mwh, 2)
        )?;
        writeln!(
            f,
            "DSCR (avg / min):      {} / {}",
            value_or_na(self.avg_dscr, 2),
            value_or_na(self.min_dscr, 2)
        )?;
        write!(f, "Battery replacements:  {}", self.replacement_count)
    }
}
