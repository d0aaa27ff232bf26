//! eaf-bess-finance entry point: CLI wiring, project resolution, and reports.

mod cli;

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eaf_bess_finance::config::ScenarioConfig;
use eaf_bess_finance::io::export::{export_cashflow_csv, export_grid_csv};
use eaf_bess_finance::project::Project;
use eaf_bess_finance::sim::{FinancialEngine, optimize};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Resolves the project and optimizer settings: `--project` takes priority,
/// then `--scenario`, then `--preset`, then the baseline preset.
fn load(opts: &cli::CliOptions) -> anyhow::Result<(Project, ScenarioConfig)> {
    if let Some(path) = &opts.project {
        let project = Project::load(path)
            .with_context(|| format!("loading project {}", path.display()))?;
        return Ok((project, ScenarioConfig::baseline()));
    }

    let scenario = if let Some(path) = &opts.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &opts.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    Ok((scenario.to_project(), scenario))
}

fn main() -> anyhow::Result<()> {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("error: {msg}");
            cli::print_usage();
            std::process::exit(2);
        }
    };
    init_tracing();

    let (project, scenario) = load(&opts)?;

    let errors = if opts.project.is_some() {
        project.validate()
    } else {
        scenario.validate()
    };
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("{} configuration error(s)", errors.len());
    }

    if let Some(path) = &opts.save_project {
        project
            .save(path)
            .with_context(|| format!("saving project to {}", path.display()))?;
        info!(path = %path.display(), "project saved");
    }

    let metrics = FinancialEngine::new(&project)
        .run()
        .context("financial run failed")?;

    if opts.yearly {
        for row in &metrics.rows {
            println!("{row}");
        }
        println!();
    }
    println!("{metrics}");

    if let Some(path) = &opts.cashflow_out {
        export_cashflow_csv(&metrics.rows, path)
            .with_context(|| format!("writing cash flows to {}", path.display()))?;
        info!(path = %path.display(), "cash flows written");
    }

    if opts.optimize {
        let mut config = scenario.optimizer.clone();
        if let Some(objective) = opts.objective {
            config.objective = objective;
        }
        let result = optimize(&project, &config);
        println!("\n{result}");

        if let Some(path) = &opts.grid_out {
            export_grid_csv(&result, path)
                .with_context(|| format!("writing optimizer grid to {}", path.display()))?;
            info!(path = %path.display(), "optimizer grid written");
        }
    }

    Ok(())
}
