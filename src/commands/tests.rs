//! Tests for command dispatch against a real store directory.

use super::*;
use crate::exit_codes;
use clap::Parser;
use tempfile::TempDir;

fn run(store: &Path, args: &[&str]) -> (i32, String) {
    let store_arg = store.to_string_lossy().to_string();
    let mut argv = vec!["leasehold", "--store", store_arg.as_str()];
    argv.extend_from_slice(args);

    let cli = Cli::try_parse_from(argv).unwrap();
    let config = load_config(&cli.store).unwrap();
    let mut out = Vec::new();
    let code = dispatch(cli, config, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn token_of(output: &str) -> String {
    let grant: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    grant["token"].as_str().unwrap().to_string()
}

#[test]
fn test_install_command() {
    let temp_dir = TempDir::new().unwrap();

    let (code, output) = run(temp_dir.path(), &["install"]);

    assert_eq!(code, exit_codes::SUCCESS);
    assert!(output.contains("installed"));
    assert!(temp_dir.path().join("functions.json").exists());
}

#[test]
fn test_acquire_contended_and_renew() {
    let temp_dir = TempDir::new().unwrap();

    let (code, output) = run(temp_dir.path(), &["acquire", "db-primary", "--ttl-ms", "60000"]);
    assert_eq!(code, exit_codes::SUCCESS);
    let first = token_of(&output);
    let grant: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert!(grant["remaining_ms"].as_i64().unwrap() > 0);

    let (code, output) = run(temp_dir.path(), &["acquire", "db-primary", "--ttl-ms", "60000"]);
    assert_eq!(code, exit_codes::NOT_HELD);
    assert_eq!(output.trim(), "false");

    let (code, output) = run(
        temp_dir.path(),
        &["acquire", "db-primary", "--ttl-ms", "60000", "--token", &first],
    );
    assert_eq!(code, exit_codes::SUCCESS);
    assert_ne!(token_of(&output), first);
}

#[test]
fn test_release_command() {
    let temp_dir = TempDir::new().unwrap();
    let (_, output) = run(temp_dir.path(), &["acquire", "jobs", "-a", "leader"]);
    let token = token_of(&output);

    let (code, output) = run(temp_dir.path(), &["release", "jobs", "-a", "leader", "--token", &token]);
    assert_eq!(code, exit_codes::SUCCESS);
    assert_eq!(output.trim(), "true");

    // Releasing a stale token still reports true.
    let (code, output) = run(temp_dir.path(), &["release", "jobs", "-a", "leader", "--token", &token]);
    assert_eq!(code, exit_codes::SUCCESS);
    assert_eq!(output.trim(), "true");

    let (code, _) = run(temp_dir.path(), &["acquire", "jobs", "-a", "leader"]);
    assert_eq!(code, exit_codes::SUCCESS);
}

#[test]
fn test_status_command() {
    let temp_dir = TempDir::new().unwrap();

    let (_, output) = run(temp_dir.path(), &["status", "db-primary"]);
    assert_eq!(output.trim(), "null");

    let (_, output) = run(temp_dir.path(), &["acquire", "db-primary", "--ttl-ms", "60000"]);
    let token = token_of(&output);

    let (code, output) = run(temp_dir.path(), &["status", "db-primary", "--ttl-ms", "60000"]);
    assert_eq!(code, exit_codes::SUCCESS);
    let report: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(report["holder_token"], token.as_str());
    assert_eq!(report["attribute"], "holder");
    assert_eq!(report["expired"], false);
}

#[test]
fn test_history_command() {
    let temp_dir = TempDir::new().unwrap();
    let (_, output) = run(temp_dir.path(), &["acquire", "db-primary"]);
    let token = token_of(&output);
    run(temp_dir.path(), &["acquire", "queue"]);
    run(temp_dir.path(), &["release", "db-primary", "--token", &token]);

    let (_, output) = run(temp_dir.path(), &["history"]);
    assert_eq!(output.lines().count(), 4);
    assert!(output.lines().next().unwrap().contains("install"));

    let (_, output) = run(temp_dir.path(), &["history", "--resource", "db-primary"]);
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("acquire"));
    assert!(lines[1].contains("release"));

    let (_, output) = run(temp_dir.path(), &["history", "--limit", "1"]);
    assert_eq!(output.lines().count(), 1);
    assert!(output.contains("release"));
}

#[test]
fn test_config_defaults_apply() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        "default_attribute: leader\ndefault_ttl_ms: 45000\n",
    )
    .unwrap();

    let (_, output) = run(temp_dir.path(), &["acquire", "db-primary"]);
    let grant: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert!(grant["remaining_ms"].as_i64().unwrap() <= 45_000);
    assert!(temp_dir.path().join("records").join("db-primary").join("leader.json").exists());
}

#[test]
fn test_hold_command() {
    let temp_dir = TempDir::new().unwrap();

    let (code, output) = run(
        temp_dir.path(),
        &["hold", "db-primary", "--ttl-ms", "5000", "--renew-every-ms", "20", "--for-ms", "70"],
    );

    assert_eq!(code, exit_codes::SUCCESS);
    let lines: Vec<_> = output.lines().collect();
    assert!(lines.len() >= 3, "{output}");
    assert_eq!(*lines.last().unwrap(), "true");

    let (_, status) = run(temp_dir.path(), &["status", "db-primary"]);
    let report: serde_json::Value = serde_json::from_str(status.trim()).unwrap();
    assert!(report["holder_token"].is_null());
}

#[test]
fn test_hold_when_taken() {
    let temp_dir = TempDir::new().unwrap();
    run(temp_dir.path(), &["acquire", "db-primary", "--ttl-ms", "60000"]);

    let (code, output) = run(temp_dir.path(), &["hold", "db-primary", "--for-ms", "10"]);

    assert_eq!(code, exit_codes::NOT_HELD);
    assert_eq!(output.trim(), "false");
}

#[test]
fn test_hold_rejects_slow_renewal() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from([
        "leasehold",
        "--store",
        store.as_str(),
        "hold",
        "db-primary",
        "--ttl-ms",
        "100",
        "--renew-every-ms",
        "100",
        "--for-ms",
        "10",
    ])
    .unwrap();

    let err = dispatch(cli, Config::default(), &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("--renew-every-ms"));
}

#[test]
fn test_hold_rejects_ttl_too_short_to_renew() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from([
        "leasehold",
        "--store",
        store.as_str(),
        "hold",
        "db-primary",
        "--ttl-ms",
        "1",
        "--for-ms",
        "10",
    ])
    .unwrap();

    let err = dispatch(cli, Config::default(), &mut Vec::new()).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(err.to_string().contains("too short to renew"));
    assert!(!err.to_string().contains("--renew-every-ms"));
}

#[test]
fn test_invalid_resource_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["leasehold", "--store", store.as_str(), "acquire", "../x"])
        .unwrap();

    let err = dispatch(cli, Config::default(), &mut Vec::new()).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
#[serial_test::serial]
fn test_default_store_dir_is_relative_to_cwd() {
    use crate::config::types::{DEFAULT_STORE_DIR, STORE_DIR_ENV};
    use crate::test_support::DirGuard;

    if std::env::var_os(STORE_DIR_ENV).is_some() {
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let _cwd = DirGuard::new(temp_dir.path());

    let cli = Cli::try_parse_from(["leasehold", "acquire", "db-primary"]).unwrap();
    assert_eq!(cli.store, Path::new(DEFAULT_STORE_DIR));

    let code = dispatch(cli, Config::default(), &mut Vec::new()).unwrap();
    assert_eq!(code, exit_codes::SUCCESS);
    assert!(
        temp_dir
            .path()
            .join(DEFAULT_STORE_DIR)
            .join("records")
            .join("db-primary")
            .join("holder.json")
            .exists()
    );
}
