use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use autointel_core::error::SettingsError;
use autointel_core::{Granularity, Settings};
use tempfile::NamedTempFile;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn file_values_fill_in_over_defaults() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "top_k = 5")?;
    writeln!(file, "granularity = \"quarter\"")?;
    writeln!(file, "report_dir = \"/var/lib/autointel/reports\"")?;

    let settings = Settings::from_file(file.path())?;
    assert_eq!(settings.top_k, 5);
    assert_eq!(settings.granularity, Granularity::Quarter);
    assert_eq!(settings.report_dir, PathBuf::from("/var/lib/autointel/reports"));
    assert_eq!(settings.unclassified_min_count, 3);
    assert_eq!(settings.min_bucket_samples, 5);
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "top_kk = 5")?;
    let err = Settings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, SettingsError::Format { .. }));
    Ok(())
}

#[test]
fn environment_overrides_win() -> Result<()> {
    let mut settings = Settings::default();
    settings.apply_overrides(lookup(&[
        ("AUTOINTEL_GRANULARITY", "weekly"),
        ("AUTOINTEL_WORKERS", " 3 "),
        ("AUTOINTEL_RUN_TIMEOUT_SECS", "90"),
        ("AUTOINTEL_DATABASE_URL", "postgres://fallback"),
    ]))?;
    assert_eq!(settings.granularity, Granularity::Week);
    assert_eq!(settings.workers, 3);
    assert_eq!(settings.run_timeout_secs, Some(90));
    assert_eq!(settings.database_url.as_deref(), Some("postgres://fallback"));

    settings.apply_overrides(lookup(&[
        ("DATABASE_URL", "postgres://primary"),
        ("AUTOINTEL_DATABASE_URL", "postgres://fallback"),
    ]))?;
    assert_eq!(settings.database_url.as_deref(), Some("postgres://primary"));
    Ok(())
}

#[test]
fn malformed_override_names_the_variable() {
    let mut settings = Settings::default();
    let err = settings
        .apply_overrides(lookup(&[("AUTOINTEL_TOP_K", "twenty")]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "environment variable AUTOINTEL_TOP_K has invalid value 'twenty'"
    );
}

#[test]
fn zero_workers_and_zero_timeout_are_invalid() {
    let workers = Settings {
        workers: 0,
        ..Settings::default()
    };
    assert!(matches!(workers.validate(), Err(SettingsError::Invalid(_))));

    let timeout = Settings {
        run_timeout_secs: Some(0),
        ..Settings::default()
    };
    assert!(matches!(timeout.validate(), Err(SettingsError::Invalid(_))));
    assert!(Settings::default().validate().is_ok());
}
