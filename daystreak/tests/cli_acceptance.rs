use daystreak_core::Database;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        for dir in [&home, &xdg_data, &xdg_config, &xdg_state] {
            fs::create_dir_all(dir).expect("failed to create test directory");
        }

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("daystreak/daystreak.db")
    }
}

fn run(env: &CliTestEnv, args: &[&str]) -> Output {
    Command::new(assert_cmd::cargo::cargo_bin!("daystreak"))
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute daystreak: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }
    panic!(
        "daystreak {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn record_two_days_then_show_json() {
    let env = CliTestEnv::new();

    run_ok(
        &env,
        &["record", "--completed", "3", "--at", "2024-03-04T09:15"],
    );
    let stdout = run_ok(
        &env,
        &[
            "record",
            "--completed",
            "5",
            "--total",
            "6",
            "--at",
            "2024-03-05T19:00",
        ],
    );
    assert!(stdout.contains("Current streak: 2"), "got:\n{stdout}");

    let stdout = run_ok(&env, &["show", "--json", "--date", "2024-03-05"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("show --json output");

    assert_eq!(value["streak"]["current"], 2);
    assert_eq!(value["streak"]["longest"], 2);
    assert_eq!(value["streak"]["lastActiveDate"], "2024-03-05");

    let weekly = value["weeklyProgress"].as_array().expect("weekly array");
    assert_eq!(weekly.len(), 7);
    assert_eq!(weekly[5]["day"], "Mon");
    assert_eq!(weekly[5]["completed"], 3);
    assert_eq!(weekly[6]["day"], "Tue");
    assert_eq!(weekly[6]["completed"], 5);
    assert_eq!(value["weekOverWeekChange"], 0);
    assert_eq!(value["mostProductiveDay"], "Tue");

    assert!(env.db_path().exists());
    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    assert!(db.keys().expect("keys").contains(&"activityLogs".to_string()));
}

#[test]
fn record_without_completions_changes_nothing() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["record", "--completed", "0", "--total", "4"]);
    assert!(stdout.contains("nothing recorded"), "got:\n{stdout}");

    let stdout = run_ok(&env, &["show", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("show --json output");
    assert_eq!(value["streak"]["current"], 0);
    assert!(value["streak"]["lastActiveDate"].is_null());
}

#[test]
fn record_rejects_more_completed_than_total() {
    let env = CliTestEnv::new();

    let output = run(&env, &["record", "--completed", "5", "--total", "2"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot exceed"));
}

#[test]
fn sync_reports_disabled_remote() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["sync"]);
    assert!(stdout.contains("Remote sync is disabled"), "got:\n{stdout}");
}
