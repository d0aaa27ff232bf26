//! Brute-force sizing sweep over (capacity, power) combinations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::project::Project;

use super::engine::FinancialEngine;
use super::types::FinancialMetrics;

/// Metric maximized by [`optimize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    EquityIrr,
    ProjectIrr,
    EquityNpv,
    ProjectNpv,
}

impl Objective {
    pub const ALL: [Objective; 4] = [
        Objective::EquityIrr,
        Objective::ProjectIrr,
        Objective::EquityNpv,
        Objective::ProjectNpv,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Objective::EquityIrr => "equity_irr",
            Objective::ProjectIrr => "project_irr",
            Objective::EquityNpv => "equity_npv",
            Objective::ProjectNpv => "project_npv",
        }
    }

    /// Extracts this objective's value from a run.
    pub fn value(self, metrics: &FinancialMetrics) -> f64 {
        match self {
            Objective::EquityIrr => metrics.equity_irr,
            Objective::ProjectIrr => metrics.project_irr,
            Objective::EquityNpv => metrics.equity_npv,
            Objective::ProjectNpv => metrics.project_npv,
        }
    }

    fn format_value(self, v: f64) -> String {
        if !v.is_finite() {
            return "n/a".to_string();
        }
        match self {
            Objective::EquityIrr | Objective::ProjectIrr => format!("{:.2}%", v * 100.0),
            Objective::EquityNpv | Objective::ProjectNpv => format!("${v:.0}"),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.key() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|o| o.key()).collect();
                format!("unknown objective \"{s}\", expected one of: {}", names.join(", "))
            })
    }
}

/// Evenly spaced sweep over `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridAxis {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl GridAxis {
    pub fn new(min: f64, max: f64, steps: usize) -> Self {
        Self { min, max, steps }
    }

    /// Grid values, endpoints included. A single step yields `min`.
    pub fn points(&self) -> Vec<f64> {
        match self.steps {
            0 => Vec::new(),
            1 => vec![self.min],
            n => {
                let step = (self.max - self.min) / (n - 1) as f64;
                (0..n).map(|i| self.min + step * i as f64).collect()
            }
        }
    }
}

/// Sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub objective: Objective,
    /// Battery energy capacity sweep (MWh).
    pub capacity_mwh: GridAxis,
    /// Battery power rating sweep (MW).
    pub power_mw: GridAxis,
    /// Optional `[min, max]` C-rate (MW / MWh); combinations outside are skipped.
    pub c_rate_band: Option<(f64, f64)>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            objective: Objective::EquityIrr,
            capacity_mwh: GridAxis::new(5.0, 100.0, 5),
            power_mw: GridAxis::new(2.0, 50.0, 5),
            c_rate_band: None,
        }
    }
}

/// Result for one grid combination.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Evaluated {
        metric_value: f64,
        metrics: Box<FinancialMetrics>,
    },
    Failed {
        error: String,
    },
    Skipped {
        reason: String,
    },
}

impl Outcome {
    /// Objective value if the combination was evaluated.
    pub fn metric_value(&self) -> Option<f64> {
        match self {
            Outcome::Evaluated { metric_value, .. } => Some(*metric_value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub capacity_mwh: f64,
    pub power_mw: f64,
    pub outcome: Outcome,
}

/// Winning combination of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPoint {
    pub capacity_mwh: f64,
    pub power_mw: f64,
    pub metric_value: f64,
    pub metrics: FinancialMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub objective: Objective,
    /// `None` when no combination produced a finite objective value.
    pub best: Option<BestPoint>,
    /// Every combination tried, capacity-major.
    pub all_results: Vec<GridPoint>,
}

impl OptimizationResult {
    pub fn evaluated_count(&self) -> usize {
        self.all_results
            .iter()
            .filter(|p| matches!(p.outcome, Outcome::Evaluated { .. }))
            .count()
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Size Optimization ({}) ---", self.objective)?;
        for p in &self.all_results {
            let cell = match &p.outcome {
                Outcome::Evaluated { metric_value, .. } => {
                    self.objective.format_value(*metric_value)
                }
                Outcome::Failed { error } => format!("error: {error}"),
                Outcome::Skipped { reason } => format!("skipped: {reason}"),
            };
            writeln!(
                f,
                "{:>7.2} MWh x {:>6.2} MW  {}",
                p.capacity_mwh, p.power_mw, cell
            )?;
        }
        match &self.best {
            Some(b) => write!(
                f,
                "Best: {:.2} MWh / {:.2} MW ({} = {})",
                b.capacity_mwh,
                b.power_mw,
                self.objective,
                self.objective.format_value(b.metric_value)
            ),
            None => write!(f, "Best: none"),
        }
    }
}

/// Evaluates every (capacity, power) combination of `config` against
/// `project` and keeps the one with the largest finite objective value.
///
/// A combination that fails does not abort the sweep; it is recorded as
/// [`Outcome::Failed`]. Ties keep the first combination seen.
pub fn optimize(project: &Project, config: &OptimizerConfig) -> OptimizationResult {
    let capacities = config.capacity_mwh.points();
    let powers = config.power_mw.points();
    let objective = config.objective;

    let mut all_results = Vec::with_capacity(capacities.len() * powers.len());
    let mut best: Option<BestPoint> = None;

    for &capacity_mwh in &capacities {
        for &power_mw in &powers {
            let outcome = evaluate(project, config, capacity_mwh, power_mw);

            if let Outcome::Evaluated {
                metric_value,
                metrics,
            } = &outcome
            {
                let improves = best
                    .as_ref()
                    .is_none_or(|b| *metric_value > b.metric_value);
                if metric_value.is_finite() && improves {
                    best = Some(BestPoint {
                        capacity_mwh,
                        power_mw,
                        metric_value: *metric_value,
                        metrics: (**metrics).clone(),
                    });
                }
            }

            all_results.push(GridPoint {
                capacity_mwh,
                power_mw,
                outcome,
            });
        }
    }

    match &best {
        Some(b) => info!(
            %objective,
            capacity_mwh = b.capacity_mwh,
            power_mw = b.power_mw,
            value = b.metric_value,
            "optimization complete"
        ),
        None => warn!(%objective, "no combination produced a finite objective"),
    }

    OptimizationResult {
        objective,
        best,
        all_results,
    }
}

fn evaluate(
    project: &Project,
    config: &OptimizerConfig,
    capacity_mwh: f64,
    power_mw: f64,
) -> Outcome {
    if let Some((lo, hi)) = config.c_rate_band {
        let c_rate = if capacity_mwh > 0.0 {
            power_mw / capacity_mwh
        } else {
            f64::INFINITY
        };
        if !(lo..=hi).contains(&c_rate) {
            debug!(capacity_mwh, power_mw, c_rate, "outside C-rate band");
            return Outcome::Skipped {
                reason: format!("C-rate {c_rate:.2} outside [{lo}, {hi}]"),
            };
        }
    }

    let mut candidate = project.clone();
    candidate.bess = project.bess.with_size(capacity_mwh, power_mw);

    match FinancialEngine::new(&candidate).run() {
        Ok(metrics) => {
            let metric_value = config.objective.value(&metrics);
            info!(capacity_mwh, power_mw, value = metric_value, "grid point evaluated");
            Outcome::Evaluated {
                metric_value,
                metrics: Box::new(metrics),
            }
        }
        Err(err) => {
            warn!(capacity_mwh, power_mw, error = %err, "grid point failed");
            Outcome::Failed {
                error: err.to_string(),
            }
        }
    }
}
