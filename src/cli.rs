use std::env;
use std::path::PathBuf;

use eaf_bess_finance::sim::Objective;

/// Parsed command-line options.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub project: Option<PathBuf>,
    pub save_project: Option<PathBuf>,
    pub cashflow_out: Option<PathBuf>,
    pub grid_out: Option<PathBuf>,
    pub optimize: bool,
    pub objective: Option<Objective>,
    pub yearly: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--project" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --project (expected a JSON file path)")?;
                if opts.project.replace(PathBuf::from(path)).is_some() {
                    return Err("--project provided more than once".to_string());
                }
            }
            "--save-project" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --save-project (expected a JSON file path)",
                )?;
                opts.save_project = Some(PathBuf::from(path));
            }
            "--cashflow-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --cashflow-out (expected a file path)")?;
                opts.cashflow_out = Some(PathBuf::from(path));
            }
            "--grid-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --grid-out (expected a file path)")?;
                opts.grid_out = Some(PathBuf::from(path));
            }
            "--objective" => {
                i += 1;
                let name = args.next_or_err(
                    i,
                    "missing value for --objective (expected equity_irr, project_irr, equity_npv or project_npv)",
                )?;
                opts.objective = Some(name.parse()?);
            }
            "--optimize" => opts.optimize = true,
            "--yearly" => opts.yearly = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    let sources = [
        opts.scenario.is_some(),
        opts.preset.is_some(),
        opts.project.is_some(),
    ];
    if sources.iter().filter(|s| **s).count() > 1 {
        return Err(
            "arguments `--scenario`, `--preset` and `--project` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if opts.grid_out.is_some() && !opts.optimize {
        return Err("--grid-out requires --optimize".to_string());
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("eaf-bess-finance: peak-shaving BESS financial model for EAF steel mills");
    eprintln!();
    eprintln!("Usage: eaf-bess-finance [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, financed, summer_peaking)");
    eprintln!("  --project <path>         Load a saved JSON project");
    eprintln!("  --save-project <path>    Write the resolved project as JSON");
    eprintln!("  --yearly                 Print one line per project year");
    eprintln!("  --cashflow-out <path>    Export yearly cash flows to CSV");
    eprintln!("  --optimize               Run the capacity/power sizing sweep");
    eprintln!("  --objective <name>       Sweep objective (default: equity_irr)");
    eprintln!("  --grid-out <path>        Export the sweep grid to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no source is given, the baseline preset is used.");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;
    use eaf_bess_finance::sim::Objective;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn supports_scenario_cli() {
        let opts = parse_args_from(args(&["--scenario", "mill.toml"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("mill.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn supports_preset_cli() {
        let opts =
            parse_args_from(args(&["--preset", "financed"])).expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("financed"));
        assert!(opts.scenario.is_none());
    }

    #[test]
    fn no_arguments_means_no_source() {
        let opts = parse_args_from(Vec::new()).expect("parse should succeed");
        assert!(opts.scenario.is_none() && opts.preset.is_none() && opts.project.is_none());
        assert!(!opts.optimize);
    }

    #[test]
    fn sources_are_mutually_exclusive() {
        let err = parse_args_from(args(&["--preset", "baseline", "--project", "p.json"]));
        assert!(err.is_err());
    }

    #[test]
    fn parses_optimizer_flags() {
        let opts = parse_args_from(args(&[
            "--optimize",
            "--objective",
            "project_npv",
            "--grid-out",
            "grid.csv",
        ]))
        .expect("parse should succeed");
        assert!(opts.optimize);
        assert_eq!(opts.objective, Some(Objective::ProjectNpv));
        assert!(opts.grid_out.is_some());
    }

    #[test]
    fn rejects_unknown_objective() {
        let err = parse_args_from(args(&["--objective", "roi"]));
        assert!(err.is_err_and(|e| e.contains("unknown objective")));
    }

    #[test]
    fn grid_out_requires_optimize() {
        assert!(parse_args_from(args(&["--grid-out", "grid.csv"])).is_err());
    }

    #[test]
    fn missing_value_is_reported() {
        let err = parse_args_from(args(&["--cashflow-out"]));
        assert!(err.is_err_and(|e| e.contains("--cashflow-out")));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        assert!(parse_args_from(args(&["--seed", "42"])).is_err());
    }
}
