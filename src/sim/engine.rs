//! Year-by-year cash-flow engine.
//!
//! Carries battery age, cumulative equivalent cycles, and the loan balance
//! from one year to the next, and rolls the resulting project and equity
//! cash flows up into NPV, IRR, payback, LCOS, and DSCR.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::{BessParams, EafParams};
use crate::finance::{
    FinancialParams, LoanSchedule, inflation_factor, irr, npv, payback_years,
};
use crate::incentives::{IncentiveSummary, compute_incentives};
use crate::project::Project;
use crate::tariff::UtilityParams;

use super::billing::simulate_year;
use super::types::{FinancialMetrics, YearlyCashFlowRow};

/// Floor applied to denominators that may legitimately reach zero.
const MIN_DENOMINATOR: f64 = 1e-9;

/// Failure of a single engine run.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("non-finite {quantity} in year {year}")]
    NonFinite { year: u32, quantity: &'static str },
}

/// Why a battery replacement was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementReason {
    CalendarLife,
    CycleLife,
    CapacityThreshold,
}

impl fmt::Display for ReplacementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReplacementReason::CalendarLife => "calendar life reached",
            ReplacementReason::CycleLife => "cycle life reached",
            ReplacementReason::CapacityThreshold => "capacity below replacement threshold",
        })
    }
}

/// Financial engine owning the project inputs and the state carried between years.
pub struct FinancialEngine {
    eaf: EafParams,
    utility: UtilityParams,
    bess: BessParams,
    financial: FinancialParams,
    incentives: IncentiveSummary,
    gross_capex: f64,
    depreciable_basis: f64,
    year_one_om: f64,
    loan_amount: f64,
    // carried state
    battery_age_years: u32,
    cumulative_cycles: f64,
    loan: LoanSchedule,
    cumulative_equity: f64,
    discounted_costs: f64,
    discounted_discharge_mwh: f64,
    dscr_values: Vec<f64>,
    replacement_count: usize,
}

/// Per-year flows the summary metrics are built from.
struct YearOutcome {
    row: YearlyCashFlowRow,
    dscr: Option<f64>,
}

impl FinancialEngine {
    /// Prepares an engine for `project`: incentives, capex, loan, and
    /// depreciable basis are fixed here.
    pub fn new(project: &Project) -> Self {
        let incentives = compute_incentives(&project.bess, &project.incentives);
        let gross_capex = incentives.gross_capex;
        let financial = project.financial.clone();
        let debt = &financial.debt;

        let loan_amount = gross_capex * debt.loan_pct.clamp(0.0, 100.0) / 100.0;
        let loan = LoanSchedule::new(
            loan_amount,
            debt.interest_rate,
            debt.term_years,
            debt.amortization,
        );
        let loan_amount = loan.balance();
        let depreciable_basis = (gross_capex - 0.5 * incentives.itc_amount).max(0.0);

        Self {
            eaf: project.eaf.clone(),
            utility: project.utility.clone(),
            bess: project.bess.clone(),
            year_one_om: project.bess.year_one_om_cost(),
            financial,
            incentives,
            gross_capex,
            depreciable_basis,
            loan_amount,
            battery_age_years: 0,
            cumulative_cycles: 0.0,
            loan,
            cumulative_equity: 0.0,
            discounted_costs: 0.0,
            discounted_discharge_mwh: 0.0,
            dscr_values: Vec::new(),
            replacement_count: 0,
        }
    }

    fn net_initial_cost(&self) -> f64 {
        self.gross_capex - self.incentives.total
    }

    fn equity_investment(&self) -> f64 {
        self.net_initial_cost() - self.loan_amount
    }

    fn replacement_reason(&self, capacity_fraction: f64) -> Option<ReplacementReason> {
        let threshold = self.financial.degradation.replacement_threshold_pct / 100.0;
        if f64::from(self.battery_age_years) >= self.bess.calendar_life_years {
            Some(ReplacementReason::CalendarLife)
        } else if self.cumulative_cycles >= self.bess.cycle_life {
            Some(ReplacementReason::CycleLife)
        } else if capacity_fraction < threshold {
            Some(ReplacementReason::CapacityThreshold)
        } else {
            None
        }
    }

    /// Simulates project `year` (1-based) and advances the carried state.
    fn step(&mut self, year: u32) -> Result<YearOutcome, EngineError> {
        let f = &self.financial;
        let lifespan = f.lifespan_years;
        let tax_rate = f.tax_rate;
        let escalation = inflation_factor(f.inflation_rate, year - 1);

        // 1. degrade
        let capacity_fraction = f.degradation.capacity_fraction(self.battery_age_years);
        let rte_fraction = f.degradation.rte_fraction(self.battery_age_years);
        let bess_t = self.bess.degraded(capacity_fraction, rte_fraction);

        // 2. bill
        let billing = simulate_year(&self.eaf, &bess_t, &self.utility, year);
        let savings = billing.annual_savings;
        let discharge = billing.total_annual_discharge_mwh;

        // 3. cycle accounting against nameplate usable energy
        let usable_mwh = (self.bess.capacity_mwh * self.bess.dod_fraction()).max(MIN_DENOMINATOR);
        self.cumulative_cycles += discharge / usable_mwh;

        // 4. replacement
        let reason = self.replacement_reason(capacity_fraction);
        let replacement_cost = if let Some(reason) = reason {
            let cost = self.gross_capex * inflation_factor(f.inflation_rate, year);
            info!(
                year,
                %reason,
                age_years = self.battery_age_years,
                cycles = self.cumulative_cycles,
                cost,
                "battery replaced"
            );
            self.battery_age_years = 0;
            self.cumulative_cycles = 0.0;
            self.replacement_count += 1;
            cost
        } else {
            self.battery_age_years += 1;
            0.0
        };

        // 5-6. escalated O&M and ancillary revenue
        let om_cost = self.year_one_om * escalation;
        let ancillary = f.ancillary_revenue_per_year * escalation;

        // 7. debt service
        let debt = self.loan.next_year();

        // 8. depreciation
        let depreciation = self.depreciable_basis * f.depreciation.schedule.fraction(year);

        // 9. decommissioning
        let decommissioning_cost = if year == lifespan {
            self.bess.decommissioning_cost() * inflation_factor(f.inflation_rate, year)
        } else {
            0.0
        };

        // 10. taxes
        let taxable_income = savings + ancillary - om_cost - debt.interest - depreciation;
        let taxes = (taxable_income * tax_rate).max(0.0);

        // 11. cash flows
        let ebit = savings + ancillary - om_cost - depreciation;
        let project_cf =
            ebit * (1.0 - tax_rate) + depreciation - replacement_cost - decommissioning_cost;
        let equity_cf = (savings + ancillary - om_cost - debt.interest) * (1.0 - tax_rate)
            + depreciation * tax_rate
            - debt.principal
            - replacement_cost
            - decommissioning_cost;
        self.cumulative_equity += equity_cf;

        // 12. LCOS accumulators
        let discount = (1.0 + f.wacc).powi(year as i32).max(MIN_DENOMINATOR);
        self.discounted_costs +=
            (om_cost + replacement_cost + decommissioning_cost + billing.annual_charging_cost)
                / discount;
        self.discounted_discharge_mwh += discharge / discount;

        let debt_service = debt.debt_service();
        let dscr = (year <= f.debt.term_years && debt_service > 0.0).then(|| {
            let cfads = savings + ancillary - om_cost - taxes;
            cfads / debt_service.max(MIN_DENOMINATOR)
        });

        for (quantity, value) in [
            ("savings", savings),
            ("project cash flow", project_cf),
            ("equity cash flow", equity_cf),
        ] {
            if !value.is_finite() {
                return Err(EngineError::NonFinite { year, quantity });
            }
        }

        debug!(
            year,
            capacity_pct = capacity_fraction * 100.0,
            savings,
            project_cf,
            equity_cf,
            loan_balance = debt.balance,
            "year simulated"
        );

        Ok(YearOutcome {
            row: YearlyCashFlowRow {
                year,
                gross_savings: billing.gross_savings,
                charging_cost: billing.annual_charging_cost,
                net_savings: savings,
                ancillary_revenue: ancillary,
                om_cost,
                interest: debt.interest,
                principal: debt.principal,
                depreciation,
                replacement_cost,
                decommissioning_cost,
                taxable_income,
                taxes,
                project_net_cash_flow: project_cf,
                equity_net_cash_flow: equity_cf,
                cumulative_equity_cash_flow: self.cumulative_equity,
                remaining_loan_balance: debt.balance,
                battery_capacity_pct: capacity_fraction * 100.0,
                discharge_mwh: discharge,
                replaced: reason.is_some(),
            },
            dscr,
        })
    }

    /// Runs every project year and computes the summary metrics.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NonFinite` if any year's cash flows are not finite.
    pub fn run(mut self) -> Result<FinancialMetrics, EngineError> {
        let lifespan = self.financial.lifespan_years;
        let net_initial_cost = self.net_initial_cost();
        let equity_investment = self.equity_investment();

        let mut project_cash_flows = Vec::with_capacity(lifespan as usize + 1);
        let mut equity_cash_flows = Vec::with_capacity(lifespan as usize + 1);
        let mut rows = Vec::with_capacity(lifespan as usize);
        project_cash_flows.push(-net_initial_cost);
        equity_cash_flows.push(-equity_investment);
        self.cumulative_equity = -equity_investment;
        self.discounted_costs = self.gross_capex;

        for year in 1..=lifespan {
            let outcome = self.step(year)?;
            project_cash_flows.push(outcome.row.project_net_cash_flow);
            equity_cash_flows.push(outcome.row.equity_net_cash_flow);
            if let Some(dscr) = outcome.dscr {
                self.dscr_values.push(dscr);
            }
            rows.push(outcome.row);
        }

        let wacc = self.financial.wacc;
        let lcos_per_mwh = if self.discounted_discharge_mwh > 0.0 {
            self.discounted_costs / self.discounted_discharge_mwh
        } else {
            f64::NAN
        };
        let (avg_dscr, min_dscr) = if self.dscr_values.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let n = self.dscr_values.len() as f64;
            let avg = self.dscr_values.iter().sum::<f64>() / n;
            let min = self.dscr_values.iter().copied().fold(f64::INFINITY, f64::min);
            (avg, min)
        };

        let metrics = FinancialMetrics {
            project_npv: npv(wacc, &project_cash_flows),
            equity_npv: npv(wacc, &equity_cash_flows),
            project_irr: irr(&project_cash_flows),
            equity_irr: irr(&equity_cash_flows),
            payback_years: payback_years(&equity_cash_flows),
            lcos_per_mwh,
            avg_dscr,
            min_dscr,
            year_one_om_cost: self.year_one_om,
            year_one_discharge_mwh: rows.first().map_or(0.0, |r| r.discharge_mwh),
            project_cash_flows,
            equity_cash_flows,
            rows,
            gross_initial_cost: self.gross_capex,
            total_incentives: self.incentives.total,
            incentive_breakdown: self.incentives.breakdown,
            net_initial_cost,
            loan_amount: self.loan_amount,
            equity_investment,
            replacement_count: self.replacement_count,
        };

        if metrics.lcos_per_mwh.is_nan() {
            warn!("battery never discharged; LCOS is undefined");
        }
        info!(
            project_npv = metrics.project_npv,
            equity_irr = metrics.equity_irr,
            payback_years = metrics.payback_years,
            lcos = metrics.lcos_per_mwh,
            replacements = metrics.replacement_count,
            "financial run complete"
        );

        Ok(metrics)
    }
}

/// Runs the engine for `project`, degrading any failure to
/// [`FinancialMetrics::null`] so callers always receive a well-formed result.
pub fn calculate_financial_metrics(project: &Project) -> FinancialMetrics {
    match FinancialEngine::new(project).run() {
        Ok(metrics) => metrics,
        Err(err) => {
            warn!(error = %err, "financial run failed; returning null metrics");
            FinancialMetrics::null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::DegradationParams;

    fn project() -> Project {
        let mut p = Project::default();
        p.financial.degradation = DegradationParams::none();
        p
    }

    #[test]
    fn cash_flow_lengths_follow_lifespan() {
        let mut p = project();
        p.financial.lifespan_years = 12;
        let m = calculate_financial_metrics(&p);
        assert_eq!(m.project_cash_flows.len(), 13);
        assert_eq!(m.equity_cash_flows.len(), 13);
        assert_eq!(m.rows.len(), 12);
        assert_eq!(m.rows.last().map(|r| r.year), Some(12));
    }

    #[test]
    fn decommissioning_only_in_final_year() {
        let m = calculate_financial_metrics(&project());
        let (last, rest) = m.rows.split_last().expect("rows");
        assert!(last.decommissioning_cost > 0.0);
        assert!(rest.iter().all(|r| r.decommissioning_cost == 0.0));
    }

    #[test]
    fn calendar_life_triggers_replacement() {
        let mut p = project();
        p.bess.cycle_life = 1e12;
        p.bess.calendar_life_years = 10.0;
        p.financial.lifespan_years = 25;
        let m = calculate_financial_metrics(&p);
        let years: Vec<u32> = m.rows.iter().filter(|r| r.replaced).map(|r| r.year).collect();
        assert_eq!(years, vec![11, 22]);
        assert_eq!(m.replacement_count, 2);
        let r11 = &m.rows[10];
        let expected = m.gross_initial_cost * inflation_factor(p.financial.inflation_rate, 11);
        assert!((r11.replacement_cost - expected).abs() < 1e-6);
        assert!(m.rows[9].replacement_cost == 0.0);
    }

    #[test]
    fn cycle_life_triggers_replacement() {
        let mut p = project();
        p.bess.calendar_life_years = 100.0;
        p.bess.cycle_life = 1.0;
        p.financial.lifespan_years = 3;
        let m = calculate_financial_metrics(&p);
        assert!(m.rows.iter().all(|r| r.replaced));
    }

    #[test]
    fn capacity_threshold_triggers_replacement_and_resets_fade() {
        let mut p = project();
        p.bess.cycle_life = 1e12;
        p.bess.calendar_life_years = 100.0;
        p.financial.degradation = DegradationParams {
            capacity_loss_pct_per_year: 10.0,
            rte_loss_pct_per_year: 0.0,
            replacement_threshold_pct: 75.0,
        };
        p.financial.lifespan_years = 8;
        let m = calculate_financial_metrics(&p);
        let caps: Vec<f64> = m.rows.iter().map(|r| r.battery_capacity_pct.round()).collect();
        // ages 0,1,2,3 -> 100,90,80,70 (replaced) then fresh again
        assert_eq!(caps, vec![100.0, 90.0, 80.0, 70.0, 100.0, 90.0, 80.0, 70.0]);
        assert!(m.rows[3].replaced);
        assert!(!m.rows[2].replaced);
    }

    #[test]
    fn om_escalates_with_inflation() {
        let m = calculate_financial_metrics(&project());
        let ratio = m.rows[1].om_cost / m.rows[0].om_cost;
        assert!((ratio - 1.024).abs() < 1e-12);
        assert_eq!(m.rows[0].om_cost, m.year_one_om_cost);
    }

    #[test]
    fn depreciation_follows_macrs_and_basis_reduction() {
        let mut p = project();
        p.incentives.itc.enabled = true;
        let m = calculate_financial_metrics(&p);
        let basis = m.gross_initial_cost - 0.5 * 0.3 * m.gross_initial_cost;
        assert!((m.rows[0].depreciation - 0.20 * basis).abs() < 1e-6);
        let total: f64 = m.rows.iter().map(|r| r.depreciation).sum();
        assert!((total - basis).abs() < 1e-3);
        assert!(m.rows[6..].iter().all(|r| r.depreciation == 0.0));
    }

    #[test]
    fn debt_is_amortized_within_term() {
        let mut p = project();
        p.financial.debt.loan_pct = 50.0;
        p.financial.debt.term_years = 10;
        let m = calculate_financial_metrics(&p);
        assert!((m.loan_amount - 0.5 * m.gross_initial_cost).abs() < 1e-6);
        let principal: f64 = m.rows.iter().map(|r| r.principal).sum();
        assert!((principal - m.loan_amount).abs() < 1e-3);
        assert_eq!(m.rows[9].remaining_loan_balance, 0.0);
        assert!(m.rows[10..].iter().all(|r| r.interest == 0.0 && r.principal == 0.0));
        assert!(m.avg_dscr.is_finite());
        assert!(m.min_dscr <= m.avg_dscr);
    }

    #[test]
    fn project_cash_flow_formula() {
        let m = calculate_financial_metrics(&project());
        let tax = Project::default().financial.tax_rate;
        for r in &m.rows {
            let ebit = r.net_savings + r.ancillary_revenue - r.om_cost - r.depreciation;
            let expected = ebit * (1.0 - tax) + r.depreciation
                - r.replacement_cost
                - r.decommissioning_cost;
            assert!((r.project_net_cash_flow - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn equity_cash_flow_formula() {
        let mut p = project();
        p.financial.debt.loan_pct = 50.0;
        p.financial.debt.term_years = 10;
        p.financial.ancillary_revenue_per_year = 100_000.0;
        let tax = p.financial.tax_rate;
        let m = calculate_financial_metrics(&p);
        assert!(m.rows[0].interest > 0.0);
        for r in &m.rows {
            let pre_tax = r.net_savings + r.ancillary_revenue - r.om_cost - r.interest;
            let expected = pre_tax * (1.0 - tax) + r.depreciation * tax
                - r.principal
                - r.replacement_cost
                - r.decommissioning_cost;
            assert!(
                (r.equity_net_cash_flow - expected).abs() < 1e-6,
                "year {}: {} vs {expected}",
                r.year,
                r.equity_net_cash_flow
            );
        }
        let from_rows: Vec<f64> = m.rows.iter().map(|r| r.equity_net_cash_flow).collect();
        assert_eq!(m.equity_cash_flows[1..], from_rows[..]);
    }

    #[test]
    fn dscr_is_cash_available_over_debt_service() {
        let mut p = project();
        p.financial.debt.loan_pct = 50.0;
        p.financial.debt.term_years = 1;
        let m = calculate_financial_metrics(&p);
        let r = &m.rows[0];
        let debt_service = r.interest + r.principal;
        assert!(debt_service > 0.0);
        let expected = (r.net_savings + r.ancillary_revenue - r.om_cost - r.taxes) / debt_service;
        assert!((m.avg_dscr - expected).abs() <= 1e-9 * expected.abs());
        assert!((m.min_dscr - expected).abs() <= 1e-9 * expected.abs());
    }

    #[test]
    fn dscr_averages_only_term_years() {
        let mut p = project();
        p.financial.debt.loan_pct = 50.0;
        p.financial.debt.term_years = 3;
        let m = calculate_financial_metrics(&p);
        let dscrs: Vec<f64> = m.rows[..3]
            .iter()
            .map(|r| {
                let cfads = r.net_savings + r.ancillary_revenue - r.om_cost - r.taxes;
                cfads / (r.interest + r.principal)
            })
            .collect();
        let avg = dscrs.iter().sum::<f64>() / 3.0;
        let min = dscrs.iter().copied().fold(f64::INFINITY, f64::min);
        assert!((m.avg_dscr - avg).abs() <= 1e-9 * avg.abs());
        assert!((m.min_dscr - min).abs() <= 1e-9 * min.abs());
    }

    #[test]
    fn lcos_matches_discounted_rows() {
        let mut p = project();
        p.bess.calendar_life_years = 12.0;
        let wacc = p.financial.wacc;
        let m = calculate_financial_metrics(&p);
        assert!(m.replacement_count > 0);
        let mut costs = m.gross_initial_cost;
        let mut discharge = 0.0;
        for r in &m.rows {
            let discount = (1.0 + wacc).powi(r.year as i32);
            costs += (r.om_cost + r.replacement_cost + r.decommissioning_cost + r.charging_cost)
                / discount;
            discharge += r.discharge_mwh / discount;
        }
        let expected = costs / discharge;
        assert!((m.lcos_per_mwh - expected).abs() <= 1e-9 * expected);
    }

    #[test]
    fn non_finite_input_degrades_to_null_metrics() {
        let mut p = project();
        p.financial.ancillary_revenue_per_year = f64::NAN;
        assert_eq!(
            FinancialEngine::new(&p).run().err(),
            Some(EngineError::NonFinite {
                year: 1,
                quantity: "project cash flow"
            })
        );
        assert!(calculate_financial_metrics(&p).is_null());
    }

    #[test]
    fn run_is_deterministic() {
        let a = calculate_financial_metrics(&project());
        let b = calculate_financial_metrics(&project());
        assert_eq!(a.project_cash_flows, b.project_cash_flows);
        assert_eq!(a.equity_cash_flows, b.equity_cash_flows);
        assert_eq!(a.rows, b.rows);
    }
}
