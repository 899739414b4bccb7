use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// `logrig` run in an empty directory with no `LOGRIG_*` variables set
fn logrig(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("logrig").unwrap();
    cmd.current_dir(dir.path());
    for (key, _) in std::env::vars() {
        if key.starts_with("LOGRIG_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_parse_size() {
    let dir = TempDir::new().unwrap();
    let json = json_stdout(logrig(&dir).args(["--json", "parse", "10 MB"]));
    assert_eq!(json["kind"], "size");
    assert_eq!(json["canonical"], "10 MB");
    assert!(json.get("next_trigger").is_none());
}

#[test]
fn test_parse_preset_has_next_trigger() {
    let dir = TempDir::new().unwrap();
    let json = json_stdout(logrig(&dir).args(["--json", "parse", "daily"]));
    assert_eq!(json["kind"], "clock");
    assert_eq!(json["preset"], "daily");
    assert!(json["next_trigger"].is_string());
}

#[test]
fn test_parse_retention() {
    let dir = TempDir::new().unwrap();
    let json = json_stdout(logrig(&dir).args(["--json", "parse", "--retention", "5 files"]));
    assert_eq!(json["kind"], "max_count");
    assert_eq!(json["canonical"], "5 files");
}

#[test]
fn test_parse_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    logrig(&dir)
        .args(["parse", "not-a-time"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-time"));
}

#[test]
fn test_presets_lists_all() {
    let dir = TempDir::new().unwrap();
    let json = json_stdout(logrig(&dir).args(["presets", "--json"]));
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "development",
            "production",
            "testing",
            "performance",
            "daily",
            "hourly",
            "weekly",
            "monthly",
            "minute"
        ]
    );
}

#[test]
fn test_presets_table() {
    let dir = TempDir::new().unwrap();
    logrig(&dir)
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("production"))
        .stdout(predicate::str::contains("/var/log/app"));
}

#[test]
fn test_names_daily() {
    let dir = TempDir::new().unwrap();
    let json = json_stdout(logrig(&dir).args([
        "--json",
        "names",
        "daily",
        "svc",
        "--at",
        "2025-01-13T00:00:00",
    ]));
    assert_eq!(json["active"], "[svc]daily_latest.temp.log");
    assert_eq!(json["rotated"], "[svc]20250113.log");
    assert_eq!(json["next_rotation"], "2025-01-14T00:00:00");
}

#[test]
fn test_names_custom_template() {
    let dir = TempDir::new().unwrap();
    let json = json_stdout(logrig(&dir).args([
        "--json",
        "names",
        "1 day",
        "api",
        "--at",
        "2025-03-01",
        "--rotated-name",
        "{name}-{YYYYMMDD}.log",
    ]));
    assert_eq!(json["rotated"], "api-20250301.log");
}

#[test]
fn test_check_layers_env_under_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("logrig.toml");
    fs::write(
        &file,
        "preset = \"production\"\nrotation = \"weekly\"\nloggers = [\"api\", \"db\"]\n",
    )
    .unwrap();

    let json = json_stdout(
        logrig(&dir)
            .env("LOGRIG_LEVEL", "debug")
            .env("LOGRIG_ROTATION", "1 GB")
            .args(["--json", "check"])
            .arg(&file),
    );
    assert_eq!(json["level"], "DEBUG");
    assert_eq!(json["rotation"], "weekly");
    assert_eq!(json["compression"], "gzip");
    assert_eq!(json["loggers"], serde_json::json!(["api", "db"]));
}

#[test]
fn test_check_reports_bad_field() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("logrig.yaml");
    fs::write(&file, "retention: eventually\n").unwrap();

    logrig(&dir)
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("retention"));
}

#[test]
fn test_clean_applies_retention() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs).unwrap();
    for day in ["20250110", "20250111", "20250112"] {
        fs::write(logs.join(format!("[svc]{}.log", day)), "old\n").unwrap();
    }
    fs::write(logs.join("[svc]daily_latest.temp.log"), "live\n").unwrap();
    fs::write(logs.join("[other]20250110.log"), "not ours\n").unwrap();

    let file = dir.path().join("logrig.json");
    fs::write(
        &file,
        serde_json::json!({
            "path": logs,
            "rotation": "daily",
            "retention": "1 file",
            "loggers": ["svc"],
        })
        .to_string(),
    )
    .unwrap();

    let json = json_stdout(logrig(&dir).args(["--json", "clean"]).arg(&file));
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["logger"], "svc");
    assert_eq!(json["data"][0]["removed"].as_array().unwrap().len(), 2);

    assert!(logs.join("[svc]daily_latest.temp.log").exists());
    assert!(logs.join("[other]20250110.log").exists());
    let remaining = fs::read_dir(&logs).unwrap().count();
    assert_eq!(remaining, 3);
}

#[test]
fn test_clean_console_config_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("logrig.toml");
    fs::write(&file, "loggers = [\"svc\"]\n").unwrap();

    logrig(&dir)
        .arg("clean")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("console"));
}
