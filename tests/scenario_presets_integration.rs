use std::env;
use std::fs;
use std::process::{self, Command};

#[derive(Debug)]
struct Report {
    gross_initial_cost: f64,
    equity_investment: f64,
    project_npv: f64,
    lcos: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_economics() {
    let baseline = run_and_parse_report(&["--scenario", "scenarios/baseline.toml"]);
    let financed = run_and_parse_report(&["--scenario", "scenarios/financed.toml"]);
    let summer = run_and_parse_report(&["--scenario", "scenarios/summer_peaking.toml"]);

    assert!(baseline.lcos > 0.0, "baseline LCOS should be positive: {baseline:?}");

    assert!(
        (baseline.gross_initial_cost - financed.gross_initial_cost).abs() < 1.0,
        "baseline and financed size the same battery: baseline={:.0}, financed={:.0}",
        baseline.gross_initial_cost,
        financed.gross_initial_cost
    );

    assert!(
        financed.equity_investment < 0.5 * baseline.equity_investment,
        "expected debt and ITC to cut equity: baseline={:.0}, financed={:.0}",
        baseline.equity_investment,
        financed.equity_investment
    );

    assert!(
        (baseline.project_npv - summer.project_npv).abs() > 1.0,
        "expected baseline and summer_peaking NPV to differ: baseline={:.0}, summer={:.0}",
        baseline.project_npv,
        summer.project_npv
    );
}

#[test]
fn presets_match_their_scenario_files() {
    for name in ["baseline", "financed"] {
        let preset = run_and_parse_report(&["--preset", name]);
        let path = format!("scenarios/{name}.toml");
        let file = run_and_parse_report(&["--scenario", &path]);
        assert!(
            (preset.equity_investment - file.equity_investment).abs() < 1.0,
            "preset {name} and {path} should agree: {preset:?} vs {file:?}"
        );
    }
}

#[test]
fn optimize_flag_prints_the_sweep() {
    let stdout = run(&["--preset", "baseline", "--optimize", "--objective", "project_npv"]);
    assert!(stdout.contains("--- Size Optimization (project_npv) ---"));
    let grid_lines = stdout.lines().filter(|l| l.contains(" MWh x ")).count();
    assert_eq!(grid_lines, 25);
    assert!(stdout.lines().any(|l| l.starts_with("Best: ")));
}

#[test]
fn cashflow_export_writes_one_row_per_year() {
    let path = env::temp_dir().join(format!("eaf-bess-cli-{}.csv", process::id()));
    let path_str = path.to_string_lossy().to_string();
    run(&["--preset", "financed", "--cashflow-out", &path_str]);
    let csv = fs::read_to_string(&path).expect("cash-flow CSV should exist");
    fs::remove_file(&path).ok();
    // header + 30 years
    assert_eq!(csv.lines().count(), 31);
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_eaf-bess-finance"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("eaf-bess-finance process should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

fn run(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_eaf-bess-finance"))
        .args(args)
        .output()
        .expect("eaf-bess-finance process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn run_and_parse_report(args: &[&str]) -> Report {
    let stdout = run(args);
    Report {
        gross_initial_cost: parse_metric(&stdout, "Gross initial cost:", ""),
        equity_investment: parse_metric(&stdout, "Equity investment:", ""),
        project_npv: parse_metric(&stdout, "Project NPV:", ""),
        lcos: parse_metric(&stdout, "LCOS:", "$/MWh"),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing report line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid report format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    let numeric = numeric.strip_prefix('$').unwrap_or(numeric);
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from report line `{line}`"))
}
