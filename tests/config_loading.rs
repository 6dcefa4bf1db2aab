// tests/config_loading.rs
mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use relaunch::config::{load_and_validate, resolve_config, ConfigFile};
use relaunch::errors::RelaunchError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn full_config_file_is_parsed() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Relaunch.toml");
    fs::write(
        &path,
        r#"
[run]
shell = "sh"
shell_args = ["-e", "-c"]
chunk_size = 512
clear_screen = true

[watch]
paths = ["src/**/*.rs"]
exclude = ["target/**"]
use_hash = true
debounce_ms = 250

[session]
auto = true
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    let options = cfg.run_options();
    assert_eq!(options.shell.program, "sh");
    assert_eq!(options.shell.args, vec!["-e".to_string(), "-c".to_string()]);
    assert_eq!(options.chunk_size, 512);
    assert!(cfg.run.clear_screen);
    assert!(cfg.watch_enabled());
    assert!(cfg.watch.use_hash);
    assert_eq!(cfg.watch.debounce(), Duration::from_millis(250));
    assert!(cfg.session.auto);
    Ok(())
}

#[test]
fn missing_default_file_falls_back_to_defaults() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let raw = resolve_config(None, &dir.path().join("Relaunch.toml"))?;
    let cfg = ConfigFile::try_from(raw)?;
    assert_eq!(cfg.run.shell, "bash");
    assert_eq!(cfg.run.shell_args, vec!["-c".to_string()]);
    assert!(!cfg.session.auto);
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() {
    init_tracing();

    let res = resolve_config(Some(Path::new("/nonexistent/Relaunch.toml")), Path::new("unused"));
    assert!(matches!(res, Err(RelaunchError::IoError(_))));
}

#[test]
fn malformed_toml_is_reported() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[run\nshell = ")?;
    assert!(matches!(load_and_validate(&path), Err(RelaunchError::TomlError(_))));
    Ok(())
}

#[test]
fn semantic_errors_are_config_errors() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Relaunch.toml");
    fs::write(&path, "[watch]\ndebounce_ms = 120000\n")?;
    assert!(matches!(load_and_validate(&path), Err(RelaunchError::ConfigError(_))));
    Ok(())
}
