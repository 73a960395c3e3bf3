//! End-to-end CLI tests for the `statcalc` binary.
//!
//! Every test runs the binary as a subprocess inside its own temporary
//! directory so no configuration file leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` for the cargo-built `statcalc` binary in `dir`.
fn statcalc(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("statcalc").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("STATCALC_CONFIG")
        .env_remove("STATCALC_ALPHA")
        .env_remove("STATCALC_PRECISION")
        .env_remove("STATCALC_TAIL")
        .env_remove("STATCALC_MODE")
        .env("NO_COLOR", "1");
    cmd
}

/// Run with `--json` and parse stdout.
fn json(args: &[&str]) -> serde_json::Value {
    let tmp = TempDir::new().unwrap();
    let output = statcalc(&tmp).arg("--json").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "statcalc {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn approx(value: &serde_json::Value, expected: f64, tol: f64) -> bool {
    value
        .as_f64()
        .is_some_and(|v| (v - expected).abs() <= tol)
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

#[test]
fn binomial_at_least() {
    let v = json(&["binomial", "n=10", "p=0.4", "k=7", "art=mindestens"]);
    assert_eq!(v["mode"], "at_least");
    assert!(approx(&v["probability"], 0.054762, 1e-5), "{v}");
    assert!(approx(&v["mean"], 4.0, 1e-12));
}

#[test]
fn binomial_text_shows_percentage() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["binomial", "n=10", "p=0.4", "k=7", "art=at_least"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5.48%"))
        .stdout(predicate::str::contains("1 - F(6)"));
}

#[test]
fn poisson_rejects_negative_rate() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["poisson", "lambda=-1", "k=2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ---------------------------------------------------------------------------
// Formula calculators
// ---------------------------------------------------------------------------

#[test]
fn z_score_from_variance() {
    let v = json(&["z-score", "x=130", "mu=100", "var=225", "z=-"]);
    assert_eq!(v["values"]["sigma"], 15.0);
    assert_eq!(v["values"]["z"], 2.0);
    assert!(approx(&v["values"]["p"], 0.977250, 1e-6));
}

#[test]
fn k_sigma_from_percent() {
    let v = json(&["k-sigma", "mu=100", "sigma=15", "conf=95"]);
    assert!(approx(&v["values"]["k"], 1.959964, 1e-6));
    assert!(approx(&v["values"]["lower"], 70.600540, 1e-5));
}

#[test]
fn cohens_d_rates_effect() {
    let v = json(&["cohens-d", "x_bar=105", "mu0=100", "sigma=10", "d=-"]);
    assert_eq!(v["d"], 0.5);
    assert_eq!(v["effect"], "medium");
}

#[test]
fn inconsistent_values_are_reported() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["z-score", "x=130", "mu=100", "sigma=15", "z=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mismatch"));
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

#[test]
fn hypothesis_rejects_large_deviation() {
    let v = json(&[
        "hypothesis",
        "x_bar=110",
        "mu0=100",
        "sigma=15",
        "n=25",
        "alpha=0.05",
        "test=zweiseitig",
    ]);
    assert_eq!(v["kind"], "z");
    assert!(approx(&v["values"]["z"], 3.333333, 1e-6));
    assert_eq!(v["decision"]["reject_by_critical"], true);
    assert_eq!(v["decision"]["reject_by_p"], true);
}

#[test]
fn hypothesis_text_shows_verdict() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["hypothesis", "x_bar=105", "mu0=100", "sigma=15", "n=25", "alpha=0.05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fail to reject H0"));
}

#[test]
fn interval_uses_configured_alpha() {
    let v = json(&["interval", "x_bar=100", "sigma=15", "n=25"]);
    assert_eq!(v["kind"], "mean_z");
    assert!(approx(&v["bounds"]["lower"], 94.120108, 1e-5));
    assert!(approx(&v["bounds"]["upper"], 105.879892, 1e-5));
}

#[test]
fn power_of_z_test() {
    let v = json(&["power", "mu0=100", "mu1=105", "sigma=15", "n=25", "alpha=0.05"]);
    assert_eq!(v["target"], "power");
    let power = v["power"].as_f64().unwrap();
    assert!(power > 0.0 && power < 1.0);
    assert!(approx(&v["beta"], 1.0 - power, 1e-12));
}

// ---------------------------------------------------------------------------
// Descriptive
// ---------------------------------------------------------------------------

#[test]
fn describe_sample() {
    let v = json(&["describe", "data=[2,4,4,4,5,5,7,9]"]);
    assert_eq!(v["n"], 8);
    assert_eq!(v["mean"], 5.0);
    assert!(approx(&v["variance"], 4.571428571428571, 1e-12));
}

#[test]
fn describe_population() {
    let v = json(&["describe", "daten=2,4,4,4,5,5,7,9", "population=true"]);
    assert_eq!(v["kind"], "population");
    assert_eq!(v["sd"], 2.0);
}

#[test]
fn correlation_of_lists() {
    let v = json(&["correlation", "x=[1,2,3,4,5]", "y=[2,4,5,4,5]"]);
    assert!(approx(&v["pearson"]["value"], 0.774597, 1e-6));
    assert!(approx(&v["spearman"]["value"], 0.75, 1e-12));
}

#[test]
fn correlation_reports_significance() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["correlation", "x=[1,2,3,4,5]", "y=[2,4,5,4,5]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not significant at alpha = 0.050000"));
}

#[test]
fn contingency_table() {
    let v = json(&["correlation", "kontingenz=[[20,10,5],[5,15,25]]"]);
    assert!(approx(&v["chi2"], 22.433862, 1e-5));
    assert_eq!(v["yates"], false);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_key_prints_usage() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["binomial", "n=10", "p=0.4", "k=7", "foo=1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("foo"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn invalid_flag_value_prints_usage() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["--precision", "abc", "binomial", "n=10", "p=0.4", "k=7"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--precision"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn unknown_flag_as_json_error() {
    let tmp = TempDir::new().unwrap();
    let output = statcalc(&tmp)
        .args(["--json", "describe", "--bogus", "data=1,2"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(v["error"].as_str().unwrap().contains("--bogus"));
}

#[test]
fn help_exits_zero() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn partial_two_sample_power_names_missing_key() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["power", "mu1=5", "mu2=6", "n1=10", "n2=10", "s1=2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("s2 must be given"));
}

#[test]
fn json_errors_go_to_stderr() {
    let tmp = TempDir::new().unwrap();
    let output = statcalc(&tmp)
        .args(["--json", "describe", "data=[]"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(v["error"].is_string());
    assert!(output.stdout.is_empty());
}

// ---------------------------------------------------------------------------
// Registry, config, version
// ---------------------------------------------------------------------------

#[test]
fn formula_list_and_solve() {
    let list = json(&["formula", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 9);

    let v = json(&["formula", "solve", "normal-cdf,z-score", "p=0.95", "mu=100", "sigma=15"]);
    assert!(approx(&v["values"]["x"], 124.672804, 1e-5));
}

#[test]
fn formula_show_unknown_id_fails() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["formula", "show", "nope"])
        .assert()
        .failure();
}

#[test]
fn config_init_then_show() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp).args(["config", "init"]).assert().success();
    assert!(tmp.path().join("statcalc.yaml").exists());

    statcalc(&tmp)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    std::fs::write(tmp.path().join("statcalc.yaml"), "alpha: 0.01\n").unwrap();
    let output = statcalc(&tmp).args(["--json", "config", "show"]).output().unwrap();
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["exists"], true);
    assert_eq!(v["config"]["alpha"], 0.01);
}

#[test]
fn invalid_precision_is_rejected() {
    let tmp = TempDir::new().unwrap();
    statcalc(&tmp)
        .args(["--precision", "40", "version"])
        .assert()
        .failure();
}

#[test]
fn version_json() {
    let v = json(&["version"]);
    assert!(v["version"].is_string());
    assert_eq!(v["formulas"], 9);
}
