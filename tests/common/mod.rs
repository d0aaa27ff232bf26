//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use eaf_bess_finance::assets::{BessParams, EafParams, Technology};
use eaf_bess_finance::finance::{DegradationParams, FinancialParams};
use eaf_bess_finance::incentives::IncentiveParams;
use eaf_bess_finance::project::Project;
use eaf_bess_finance::tariff::UtilityParams;

/// Reference battery: LFP, 40 MWh / 20 MW, 86% RTE, 4000 cycles,
/// 16-year calendar life, 95% DoD.
pub fn reference_bess() -> BessParams {
    BessParams {
        rte_pct: 86.0,
        cycle_life: 4000.0,
        calendar_life_years: 16.0,
        dod_pct: 95.0,
        ..BessParams::from_template(Technology::Lfp, 40.0, 20.0)
    }
}

/// Reference mill: one 100 t furnace, 35 MW grid cap, 24 heats/day of
/// 36 minutes, 300 operating days.
pub fn reference_eaf() -> EafParams {
    EafParams {
        furnace_size_tons: 100.0,
        eaf_count: 1,
        grid_cap_mw: 35.0,
        cycles_per_day: 24.0,
        cycle_duration_min: 36.0,
        operating_days_per_year: 300.0,
    }
}

/// WACC 13.1%, 30 years, 20.09% tax, 2.4% inflation, no debt, no degradation.
pub fn reference_financial() -> FinancialParams {
    FinancialParams {
        wacc: 0.131,
        lifespan_years: 30,
        tax_rate: 0.2009,
        inflation_rate: 0.024,
        degradation: DegradationParams::none(),
        ..FinancialParams::default()
    }
}

/// End-to-end reference project with no incentives.
pub fn reference_project() -> Project {
    Project {
        eaf: reference_eaf(),
        utility: UtilityParams::default(),
        bess: reference_bess(),
        financial: reference_financial(),
        incentives: IncentiveParams::default(),
        ..Project::default()
    }
}

/// Reference project with half the capex debt-financed over `term_years`.
pub fn financed_project(term_years: u32) -> Project {
    let mut project = reference_project();
    project.financial.debt.loan_pct = 50.0;
    project.financial.debt.interest_rate = 0.07;
    project.financial.debt.term_years = term_years;
    project
}
