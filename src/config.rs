//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{BessParams, EafParams, Technology};
use crate::finance::{DebtParams, FinancialParams};
use crate::incentives::{IncentiveParams, PercentProgram};
use crate::project::Project;
use crate::sim::optimizer::OptimizerConfig;
use crate::tariff::UtilityParams;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Furnace operating parameters.
    pub eaf: EafParams,
    /// Tariff: TOU rates, demand charge, seasons.
    pub utility: UtilityParams,
    /// Battery sizing and technology.
    pub bess: BessConfig,
    /// Financing, tax, and degradation assumptions.
    pub financial: FinancialParams,
    /// Incentive programs.
    pub incentives: IncentiveParams,
    /// Sizing sweep settings, used with `--optimize`.
    pub optimizer: OptimizerConfig,
}

/// Battery section: a technology template plus optional overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BessConfig {
    /// Cost and performance template.
    pub technology: Technology,
    /// Energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Power rating (MW).
    pub power_mw: f64,
    pub storage_bos_cost_per_kwh: Option<f64>,
    pub pcs_cost_per_kw: Option<f64>,
    pub epc_cost_per_kwh: Option<f64>,
    pub integration_cost_per_kwh: Option<f64>,
    pub om_cost_per_kw_yr: Option<f64>,
    pub om_cost_per_kwh_yr: Option<f64>,
    pub rte_pct: Option<f64>,
    pub insurance_pct: Option<f64>,
    pub disconnect_cost_per_kwh: Option<f64>,
    pub recycling_cost_per_kwh: Option<f64>,
    pub cycle_life: Option<f64>,
    pub dod_pct: Option<f64>,
    pub calendar_life_years: Option<f64>,
}

impl Default for BessConfig {
    fn default() -> Self {
        Self {
            technology: Technology::Lfp,
            capacity_mwh: 40.0,
            power_mw: 20.0,
            storage_bos_cost_per_kwh: None,
            pcs_cost_per_kw: None,
            epc_cost_per_kwh: None,
            integration_cost_per_kwh: None,
            om_cost_per_kw_yr: None,
            om_cost_per_kwh_yr: None,
            rte_pct: None,
            insurance_pct: None,
            disconnect_cost_per_kwh: None,
            recycling_cost_per_kwh: None,
            cycle_life: None,
            dod_pct: None,
            calendar_life_years: None,
        }
    }
}

impl BessConfig {
    /// Resolves the template and applies every override that is set.
    pub fn to_params(&self) -> BessParams {
        let mut p = BessParams::from_template(self.technology, self.capacity_mwh, self.power_mw);
        let overrides = [
            (self.storage_bos_cost_per_kwh, &mut p.storage_bos_cost_per_kwh),
            (self.pcs_cost_per_kw, &mut p.pcs_cost_per_kw),
            (self.epc_cost_per_kwh, &mut p.epc_cost_per_kwh),
            (self.integration_cost_per_kwh, &mut p.integration_cost_per_kwh),
            (self.om_cost_per_kw_yr, &mut p.om_cost_per_kw_yr),
            (self.om_cost_per_kwh_yr, &mut p.om_cost_per_kwh_yr),
            (self.rte_pct, &mut p.rte_pct),
            (self.insurance_pct, &mut p.insurance_pct),
            (self.disconnect_cost_per_kwh, &mut p.disconnect_cost_per_kwh),
            (self.recycling_cost_per_kwh, &mut p.recycling_cost_per_kwh),
            (self.cycle_life, &mut p.cycle_life),
            (self.dod_pct, &mut p.dod_pct),
            (self.calendar_life_years, &mut p.calendar_life_years),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
        p
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"bess.capacity_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: one 100 t furnace, LFP 40 MWh / 20 MW,
    /// all-equity, no incentives.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the financed preset: 60% debt plus ITC with the
    /// energy-community bonus.
    pub fn financed() -> Self {
        Self {
            financial: FinancialParams {
                debt: DebtParams {
                    loan_pct: 60.0,
                    interest_rate: 0.065,
                    term_years: 12,
                    ..DebtParams::default()
                },
                ..FinancialParams::default()
            },
            incentives: IncentiveParams {
                itc: PercentProgram::new(true, 30.0),
                energy_community_bonus: PercentProgram::new(true, 10.0),
                ..IncentiveParams::default()
            },
            ..Self::default()
        }
    }

    /// Returns the summer-peaking preset: seasonal tariff, a larger battery,
    /// and ancillary revenue.
    pub fn summer_peaking() -> Self {
        Self {
            utility: UtilityParams::summer_peaking(),
            bess: BessConfig {
                capacity_mwh: 60.0,
                power_mw: 30.0,
                ..BessConfig::default()
            },
            financial: FinancialParams {
                ancillary_revenue_per_year: 250_000.0,
                ..FinancialParams::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "financed", "summer_peaking"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "financed" => Ok(Self::financed()),
            "summer_peaking" => Ok(Self::summer_peaking()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Builds the project this scenario describes.
    pub fn to_project(&self) -> Project {
        Project {
            eaf: self.eaf.clone(),
            utility: self.utility.clone(),
            bess: self.bess.to_params(),
            financial: self.financial.clone(),
            incentives: self.incentives.clone(),
            ..Project::default()
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.to_project().validate();

        let o = &self.optimizer;
        for (name, axis) in [("capacity_mwh", &o.capacity_mwh), ("power_mw", &o.power_mw)] {
            if axis.steps == 0 {
                errors.push(ConfigError {
                    field: format!("optimizer.{name}.steps"),
                    message: "must be > 0".into(),
                });
            }
            if !(axis.min > 0.0 && axis.min <= axis.max) {
                errors.push(ConfigError {
                    field: format!("optimizer.{name}"),
                    message: "must satisfy 0 < min <= max".into(),
                });
            }
        }
        if let Some((lo, hi)) = o.c_rate_band {
            if !(lo >= 0.0 && lo <= hi) {
                errors.push(ConfigError::new(
                    "optimizer.c_rate_band",
                    "must satisfy 0 <= min <= max",
                ));
            }
        }

        errors
    }
}
