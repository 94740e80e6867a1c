//! Integration tests for the pw CLI.
//!
//! Run with: `cargo test --package propweave-cli --test cli_integration`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run pw inside `dir`, isolated from the user's config and environment.
fn run_pw(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pw"))
        .current_dir(dir)
        .env("PROPWEAVE_CONFIG", dir.join("config.json"))
        .env_remove("PROPWEAVE_DEFAULT_WEAVING")
        .env_remove("PROPWEAVE_NAMESPACES")
        .env_remove("PROPWEAVE_EVENT_INVOKER")
        .env_remove("PROPWEAVE_DISABLED")
        .env_remove("PROPWEAVE_MODULE")
        .args(args)
        .output()
        .expect("Failed to execute pw command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// A module where `Base` requests injection and `Derived` inherits it,
/// plus a view model deriving from a notifying framework type.
fn write_app_manifest(dir: &Path) -> PathBuf {
    let path = dir.join("app.json");
    fs::write(
        &path,
        r#"{
  "module": "App",
  "types": [
    {
      "name": "App.Base",
      "annotations": ["PropertyChanged.AddINotifyPropertyChangedInterfaceAttribute"]
    },
    { "name": "App.Derived", "base": "App.Base" },
    { "name": "App.ViewModel", "base": "Framework.ObservableObject" },
    { "name": "App.Plain" }
  ]
}"#,
    )
    .unwrap();
    path
}

fn write_framework_manifest(dir: &Path) -> PathBuf {
    let path = dir.join("framework.json");
    fs::write(
        &path,
        r#"{
  "module": "Framework",
  "types": [
    {
      "name": "Framework.ObservableObject",
      "interfaces": ["System.ComponentModel.INotifyPropertyChanged"]
    }
  ]
}"#,
    )
    .unwrap();
    path
}

/// Two annotated types that each already notify.
fn write_conflicting_manifest(dir: &Path) -> PathBuf {
    let path = dir.join("conflict.json");
    fs::write(
        &path,
        r#"{
  "module": "App",
  "types": [
    {
      "name": "App.Loud",
      "annotations": ["PropertyChanged.AddINotifyPropertyChangedInterfaceAttribute"],
      "declares_notify_event": true
    },
    {
      "name": "App.Louder",
      "annotations": ["PropertyChanged.AddINotifyPropertyChangedInterfaceAttribute"],
      "declares_notify_event": true
    }
  ]
}"#,
    )
    .unwrap();
    path
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_pw(dir.path(), &["--help"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("plan"));
    assert!(text.contains("apply"));
    assert!(text.contains("config"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_pw(dir.path(), &["plan", "does-not-exist.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Input not found"));
}

// =============================================================================
// Plan Command Tests
// =============================================================================

#[test]
fn test_plan_text_output() {
    let dir = TempDir::new().unwrap();
    write_app_manifest(dir.path());
    write_framework_manifest(dir.path());

    let output = run_pw(dir.path(), &["plan", ".", "--module", "App"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("+ App.Base (injected)"));
    assert!(text.contains("    App.Derived"));
    assert!(text.contains("= App.ViewModel (inherited)"));
    assert!(text.contains("protected virtual OnPropertyChanged(eventArgs)"));
    assert!(!text.contains("App.Plain"));
}

#[test]
fn test_plan_json_output() {
    let dir = TempDir::new().unwrap();
    write_app_manifest(dir.path());
    write_framework_manifest(dir.path());

    let output = run_pw(dir.path(), &["plan", ".", "-m", "App", "--format", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["injected"][0]["name"], "App.Base");
    assert_eq!(json["injected"][0]["covered"][0], "App.Derived");
    assert_eq!(json["inherited"][0]["name"], "App.ViewModel");
    assert_eq!(json["synthesis"][0]["type_name"], "App.Base");
}

#[test]
fn test_plan_requires_module_for_several_manifests() {
    let dir = TempDir::new().unwrap();
    write_app_manifest(dir.path());
    write_framework_manifest(dir.path());

    let output = run_pw(dir.path(), &["plan", "."]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--module"));
}

#[test]
fn test_plan_conflict_fails_fast() {
    let dir = TempDir::new().unwrap();
    let manifest = write_conflicting_manifest(dir.path());

    let output = run_pw(dir.path(), &["plan", manifest.to_str().unwrap()]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("error[declares-event]"));
    assert!(err.contains("Loud"));
    assert!(!err.contains("Louder"));
}

#[test]
fn test_plan_collects_all_conflicts() {
    let dir = TempDir::new().unwrap();
    let manifest = write_conflicting_manifest(dir.path());

    let output = run_pw(
        dir.path(),
        &["plan", manifest.to_str().unwrap(), "--collect-conflicts"],
    );
    assert!(!output.status.success());

    let err = stderr(&output);
    assert_eq!(err.matches("error[declares-event]").count(), 2);
    assert!(err.contains("2 conflict(s)"));
}

// =============================================================================
// Apply Command Tests
// =============================================================================

#[test]
fn test_apply_writes_stamped_manifest() {
    let dir = TempDir::new().unwrap();
    write_app_manifest(dir.path());
    write_framework_manifest(dir.path());
    let woven = dir.path().join("out").join("app.woven.json");

    let output = run_pw(
        dir.path(),
        &[
            "apply",
            "app.json",
            "framework.json",
            "--module",
            "App",
            "--output",
            woven.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Injected 1 type(s)"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&woven).unwrap()).unwrap();
    assert_eq!(json["module"], "App");
    let types = json["types"].as_array().unwrap();
    assert_eq!(types.len(), 4);

    let base = types.iter().find(|t| t["name"] == "App.Base").unwrap();
    assert_eq!(
        base["interfaces"][0],
        "System.ComponentModel.INotifyPropertyChanged"
    );
    let derived = types.iter().find(|t| t["name"] == "App.Derived").unwrap();
    assert!(derived.get("interfaces").is_none());
}

#[test]
fn test_replanning_woven_manifest_reports_inherited() {
    let dir = TempDir::new().unwrap();
    write_app_manifest(dir.path());
    write_framework_manifest(dir.path());
    let woven = dir.path().join("woven").join("app.json");

    let output = run_pw(
        dir.path(),
        &["apply", ".", "-m", "App", "-o", woven.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    // The stamped type now implements the capability itself.
    let framework = dir.path().join("framework.json");
    let output = run_pw(
        dir.path(),
        &[
            "plan",
            woven.to_str().unwrap(),
            framework.to_str().unwrap(),
            "-m",
            "App",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("= App.Base (inherited)"));
    assert!(!text.contains("(injected)"));
}

#[test]
fn test_disabled_config_weaves_nothing() {
    let dir = TempDir::new().unwrap();
    write_app_manifest(dir.path());
    write_framework_manifest(dir.path());

    let output = run_pw(dir.path(), &["config", "set", "disabled", "true"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run_pw(dir.path(), &["plan", "app.json", "framework.json", "-m", "App"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Nothing to weave.\n");
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();

    let output = run_pw(dir.path(), &["config", "set", "event-invoker", "RaisePropertyChanged"]);
    assert!(output.status.success());
    assert!(dir.path().join("config.json").exists());

    let output = run_pw(dir.path(), &["config", "get", "event-invoker"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "RaisePropertyChanged");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_pw(dir.path(), &["config", "set", "colour", "blue"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown config key"));
}

#[test]
fn test_config_path_honours_env() {
    let dir = TempDir::new().unwrap();
    let output = run_pw(dir.path(), &["config", "path"]);
    assert!(output.status.success());
    assert!(stdout(&output).trim().ends_with("config.json"));
}

#[test]
fn test_opt_in_mode_from_env_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.json"),
        r#"{ "module": "App", "types": [ { "name": "App.Person" } ] }"#,
    )
    .unwrap();

    // Everything is woven by default; a .env switch turns that off.
    let output = run_pw(dir.path(), &["plan", "app.json"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Nothing to weave.\n");

    fs::write(dir.path().join(".env"), "PROPWEAVE_DEFAULT_WEAVING=false\n").unwrap();
    let output = run_pw(dir.path(), &["config", "get", "default-weaving"]);
    assert_eq!(stdout(&output).trim(), "false");
}
