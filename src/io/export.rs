//! CSV export for yearly cash-flow rows and optimizer sweeps.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::optimizer::{OptimizationResult, Outcome};
use crate::sim::types::YearlyCashFlowRow;

/// Column header for the yearly cash-flow export.
const CASHFLOW_HEADER: &str = "year,gross_savings,charging_cost,net_savings,ancillary_revenue,\
                               om_cost,interest,principal,depreciation,replacement_cost,\
                               decommissioning_cost,taxable_income,taxes,project_net_cash_flow,\
                               equity_net_cash_flow,cumulative_equity_cash_flow,\
                               remaining_loan_balance,battery_capacity_pct,discharge_mwh,replaced";

/// Column header for the optimizer grid export.
const GRID_HEADER: &str = "capacity_mwh,power_mw,status,metric_value,project_npv,equity_npv,\
                           project_irr,equity_irr,payback_years,lcos_per_mwh,detail";

/// Exports yearly cash-flow rows to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_cashflow_csv(rows: &[YearlyCashFlowRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_cashflow_csv(rows, buf)
}

/// Writes yearly cash-flow rows as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_cashflow_csv(rows: &[YearlyCashFlowRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(CASHFLOW_HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.year.to_string(),
            format!("{:.2}", r.gross_savings),
            format!("{:.2}", r.charging_cost),
            format!("{:.2}", r.net_savings),
            format!("{:.2}", r.ancillary_revenue),
            format!("{:.2}", r.om_cost),
            format!("{:.2}", r.interest),
            format!("{:.2}", r.principal),
            format!("{:.2}", r.depreciation),
            format!("{:.2}", r.replacement_cost),
            format!("{:.2}", r.decommissioning_cost),
            format!("{:.2}", r.taxable_income),
            format!("{:.2}", r.taxes),
            format!("{:.2}", r.project_net_cash_flow),
            format!("{:.2}", r.equity_net_cash_flow),
            format!("{:.2}", r.cumulative_equity_cash_flow),
            format!("{:.2}", r.remaining_loan_balance),
            format!("{:.4}", r.battery_capacity_pct),
            format!("{:.4}", r.discharge_mwh),
            r.replaced.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports every optimizer grid point to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_grid_csv(result: &OptimizationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_grid_csv(result, io::BufWriter::new(file))
}

/// Writes every optimizer grid point as CSV. Metric columns are empty for
/// failed or skipped points.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_grid_csv(result: &OptimizationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(GRID_HEADER.split(',').map(str::trim))?;

    for p in &result.all_results {
        let mut record = vec![format!("{:.4}", p.capacity_mwh), format!("{:.4}", p.power_mw)];
        match &p.outcome {
            Outcome::Evaluated {
                metric_value,
                metrics,
            } => {
                record.push("evaluated".to_string());
                for v in [
                    *metric_value,
                    metrics.project_npv,
                    metrics.equity_npv,
                    metrics.project_irr,
                    metrics.equity_irr,
                    metrics.payback_years,
                    metrics.lcos_per_mwh,
                ] {
                    record.push(v.to_string());
                }
                record.push(String::new());
            }
            Outcome::Failed { error } => {
                record.push("failed".to_string());
                record.extend(std::iter::repeat_n(String::new(), 7));
                record.push(error.clone());
            }
            Outcome::Skipped { reason } => {
                record.push("skipped".to_string());
                record.extend(std::iter::repeat_n(String::new(), 7));
                record.push(reason.clone());
            }
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
