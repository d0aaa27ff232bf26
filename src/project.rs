//! Project state: the five configuration records, persisted as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::assets::{BessParams, EafParams};
use crate::config::ConfigError;
use crate::finance::FinancialParams;
use crate::incentives::IncentiveParams;
use crate::tariff::UtilityParams;

/// Version string written into new project files.
pub const PROJECT_VERSION: &str = "18";

/// Errors raised while reading or writing a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("cannot read \"{path}\": {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write \"{path}\": {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to evaluate one BESS investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
    /// Informal schema marker; not interpreted beyond logging.
    pub version: String,
    pub eaf: EafParams,
    pub utility: UtilityParams,
    pub bess: BessParams,
    pub financial: FinancialParams,
    pub incentives: IncentiveParams,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            eaf: EafParams::default(),
            utility: UtilityParams::default(),
            bess: BessParams::default(),
            financial: FinancialParams::default(),
            incentives: IncentiveParams::default(),
        }
    }
}

impl Project {
    /// Serializes the project as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a project from JSON. Missing sections take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Json` on malformed JSON or unknown fields.
    pub fn from_json(s: &str) -> Result<Self, ProjectError> {
        let project: Self = serde_json::from_str(s)?;
        if project.version != PROJECT_VERSION {
            warn!(
                version = %project.version,
                expected = PROJECT_VERSION,
                "project file written by a different version"
            );
        }
        Ok(project)
    }

    /// Writes the project to `path`.
    ///
    /// # Errors
    ///
    /// Returns a `ProjectError` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ProjectError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "project saved");
        Ok(())
    }

    /// Reads a project from `path`.
    ///
    /// # Errors
    ///
    /// Returns a `ProjectError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Validates every field the engine relies on.
    ///
    /// Returns an empty vector if the project can be evaluated.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let e = &self.eaf;
        check(e.furnace_size_tons > 0.0, "eaf.furnace_size_tons", "must be > 0");
        check(e.eaf_count > 0, "eaf.eaf_count", "must be > 0");
        check(e.grid_cap_mw >= 0.0, "eaf.grid_cap_mw", "must be >= 0");
        check(e.cycles_per_day > 0.0, "eaf.cycles_per_day", "must be > 0");
        check(e.cycle_duration_min > 0.0, "eaf.cycle_duration_min", "must be > 0");
        check(
            e.cycles_per_day * e.cycle_duration_min <= 24.0 * 60.0,
            "eaf.cycles_per_day",
            "heats per day times heat duration must fit in 24 hours",
        );
        check(
            (0.0..=366.0).contains(&e.operating_days_per_year),
            "eaf.operating_days_per_year",
            "must be in [0, 366]",
        );

        let u = &self.utility;
        let r = &u.energy_rates;
        check(
            r.off_peak >= 0.0 && r.mid_peak >= 0.0 && r.peak >= 0.0,
            "utility.energy_rates",
            "rates must be >= 0",
        );
        check(
            u.demand_charge_per_kw_month >= 0.0,
            "utility.demand_charge_per_kw_month",
            "must be >= 0",
        );

        let b = &self.bess;
        check(b.capacity_mwh > 0.0, "bess.capacity_mwh", "must be > 0");
        check(b.power_mw > 0.0, "bess.power_mw", "must be > 0");
        check(
            b.storage_bos_cost_per_kwh >= 0.0
                && b.pcs_cost_per_kw >= 0.0
                && b.epc_cost_per_kwh >= 0.0
                && b.integration_cost_per_kwh >= 0.0,
            "bess.unit_costs",
            "capital unit costs must be >= 0",
        );
        check(
            b.om_cost_per_kw_yr >= 0.0 && b.om_cost_per_kwh_yr >= 0.0,
            "bess.om_cost",
            "O&M costs must be >= 0",
        );
        check(
            b.rte_pct > 0.0 && b.rte_pct <= 100.0,
            "bess.rte_pct",
            "must be in (0, 100]",
        );
        check(
            b.dod_pct > 0.0 && b.dod_pct <= 100.0,
            "bess.dod_pct",
            "must be in (0, 100]",
        );
        check(b.cycle_life > 0.0, "bess.cycle_life", "must be > 0");
        check(
            b.calendar_life_years > 0.0,
            "bess.calendar_life_years",
            "must be > 0",
        );
        check(b.insurance_pct >= 0.0, "bess.insurance_pct", "must be >= 0");

        let f = &self.financial;
        check(f.wacc > -1.0, "financial.wacc", "must be > -1");
        check(f.lifespan_years > 0, "financial.lifespan_years", "must be > 0");
        check(
            (0.0..=1.0).contains(&f.tax_rate),
            "financial.tax_rate",
            "must be in [0, 1]",
        );
        check(
            f.inflation_rate > -1.0,
            "financial.inflation_rate",
            "must be > -1",
        );
        check(
            f.ancillary_revenue_per_year.is_finite() && f.ancillary_revenue_per_year >= 0.0,
            "financial.ancillary_revenue_per_year",
            "must be finite and >= 0",
        );
        check(
            (0.0..=1.0).contains(&f.salvage_fraction),
            "financial.salvage_fraction",
            "must be in [0, 1]",
        );
        check(
            (0.0..=100.0).contains(&f.debt.loan_pct),
            "financial.debt.loan_pct",
            "must be in [0, 100]",
        );
        check(
            f.debt.interest_rate >= 0.0,
            "financial.debt.interest_rate",
            "must be >= 0",
        );
        let d = &f.degradation;
        check(
            d.capacity_loss_pct_per_year >= 0.0 && d.rte_loss_pct_per_year >= 0.0,
            "financial.degradation",
            "loss rates must be >= 0",
        );
        check(
            (0.0..=100.0).contains(&d.replacement_threshold_pct),
            "financial.degradation.replacement_threshold_pct",
            "must be in [0, 100]",
        );

        for (field, message) in u.check() {
            errors.push(ConfigError { field, message });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::{RateBucket, TouPeriod};

    #[test]
    fn default_project_is_valid() {
        let errors = Project::default().validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let mut project = Project::default();
        project.incentives.itc.enabled = true;
        project.financial.debt.loan_pct = 60.0;
        project.utility = UtilityParams::summer_peaking();
        let json = project.to_json().expect("serialize");
        let back = Project::from_json(&json).expect("parse");
        assert_eq!(back, project);
    }

    #[test]
    fn raw_tou_periods_are_persisted_not_filled() {
        let mut project = Project::default();
        project.utility.tou_periods = vec![TouPeriod::new(12.0, 18.0, RateBucket::Peak)];
        let json = project.to_json().expect("serialize");
        let back = Project::from_json(&json).expect("parse");
        assert_eq!(back.utility.tou_periods.len(), 1);
        assert_eq!(back.utility.filled_schedule(), project.utility.filled_schedule());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let back = Project::from_json(r#"{"version": "18"}"#).expect("parse");
        assert_eq!(back, Project::default());
    }

    #[test]
    fn unknown_bess_field_is_rejected() {
        let err = Project::from_json(r#"{"bess": {"warp_drive": true}}"#);
        assert!(matches!(err, Err(ProjectError::Json(_))));
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let err = Project::from_json(r#"{"incentive": {"itc": {"enabled": true}}}"#);
        assert!(matches!(err, Err(ProjectError::Json(_))));
    }

    #[test]
    fn validation_reports_field_paths() {
        let mut project = Project::default();
        project.bess.capacity_mwh = 0.0;
        project.financial.tax_rate = 1.5;
        project.eaf.cycles_per_day = 60.0;
        let errors = project.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"bess.capacity_mwh"));
        assert!(fields.contains(&"financial.tax_rate"));
        assert!(fields.contains(&"eaf.cycles_per_day"));
    }

    #[test]
    fn revenue_and_salvage_inputs_are_validated() {
        let mut project = Project::default();
        project.financial.ancillary_revenue_per_year = f64::NAN;
        project.financial.salvage_fraction = 1.5;
        let errors = project.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"financial.ancillary_revenue_per_year"));
        assert!(fields.contains(&"financial.salvage_fraction"));

        project.financial.ancillary_revenue_per_year = -1.0;
        project.financial.salvage_fraction = f64::NAN;
        assert_eq!(project.validate().len(), 2);

        project.financial.ancillary_revenue_per_year = 250_000.0;
        project.financial.salvage_fraction = 0.1;
        assert!(project.validate().is_empty());
    }
}
