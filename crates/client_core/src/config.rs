use std::{collections::HashMap, fs, path::Path, time::Duration};

use shared::protocol::SNAPSHOT_STORAGE_KEY;
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "report.toml";
pub const ENV_PREFIX: &str = "REPORT__";

#[derive(Debug, Clone, PartialEq)]
pub struct FormSettings {
    // None: the application picks a per-user location.
    pub database_url: Option<String>,
    pub storage_key: String,
    pub endpoint: Option<Url>,
    pub autosave_interval: Duration,
    pub host_close_delay: Duration,
    pub submit_timeout: Duration,
    pub simulated_delay: Duration,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            storage_key: SNAPSHOT_STORAGE_KEY.into(),
            endpoint: None,
            autosave_interval: Duration::from_secs(30),
            host_close_delay: Duration::from_secs(3),
            submit_timeout: Duration::from_secs(30),
            simulated_delay: Duration::from_secs(2),
        }
    }
}

/// Defaults, then `report.toml` in the working directory, then `REPORT__*`
/// environment variables.
pub fn load_settings() -> FormSettings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> FormSettings {
    let mut settings = FormSettings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                for (key, value) in &file_cfg {
                    apply_setting(&mut settings, key, value);
                }
            }
            Err(err) => warn!(
                path = %config_path.display(),
                error = %err,
                "ignoring unreadable settings file"
            ),
        }
    }

    for key in [
        "database_url",
        "storage_key",
        "endpoint",
        "autosave_interval_secs",
        "host_close_delay_secs",
        "submit_timeout_secs",
        "simulated_delay_ms",
    ] {
        if let Some(value) = env(&format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())) {
            apply_setting(&mut settings, key, &value);
        }
    }

    settings
}

fn apply_setting(settings: &mut FormSettings, key: &str, value: &str) {
    match key {
        "database_url" => settings.database_url = Some(value.to_string()),
        "storage_key" if !value.trim().is_empty() => settings.storage_key = value.trim().into(),
        "endpoint" => match Url::parse(value) {
            Ok(url) => settings.endpoint = Some(url),
            Err(err) => warn!(endpoint = value, error = %err, "ignoring invalid report endpoint"),
        },
        "autosave_interval_secs" => {
            if let Some(secs) = parse_positive(key, value) {
                settings.autosave_interval = Duration::from_secs(secs);
            }
        }
        "host_close_delay_secs" => {
            if let Ok(secs) = value.trim().parse::<u64>() {
                settings.host_close_delay = Duration::from_secs(secs);
            }
        }
        "submit_timeout_secs" => {
            if let Some(secs) = parse_positive(key, value) {
                settings.submit_timeout = Duration::from_secs(secs);
            }
        }
        "simulated_delay_ms" => {
            if let Ok(ms) = value.trim().parse::<u64>() {
                settings.simulated_delay = Duration::from_millis(ms);
            }
        }
        _ => {}
    }
}

fn parse_positive(key: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Some(parsed),
        _ => {
            warn!(key, value, "ignoring non-positive duration setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_form_timings() {
        let settings = load_settings_from(Path::new("/nonexistent/report.toml"), no_env);
        assert_eq!(settings, FormSettings::default());
        assert_eq!(settings.autosave_interval, Duration::from_secs(30));
        assert_eq!(settings.host_close_delay, Duration::from_secs(3));
        assert_eq!(settings.storage_key, "managerReportData");
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.toml");
        fs::write(
            &path,
            "endpoint = \"https://reports.example.com/submit\"\nautosave_interval_secs = \"10\"\nsubmit_timeout_secs = \"5\"\n",
        )
        .expect("write config");

        let settings = load_settings_from(&path, |key| {
            (key == "REPORT__SUBMIT_TIMEOUT_SECS").then(|| "12".to_string())
        });

        assert_eq!(
            settings.endpoint.as_ref().map(Url::as_str),
            Some("https://reports.example.com/submit")
        );
        assert_eq!(settings.autosave_interval, Duration::from_secs(10));
        assert_eq!(settings.submit_timeout, Duration::from_secs(12));
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let settings = load_settings_from(Path::new("/nonexistent/report.toml"), |key| match key {
            "REPORT__ENDPOINT" => Some("not a url".into()),
            "REPORT__AUTOSAVE_INTERVAL_SECS" => Some("0".into()),
            _ => None,
        });
        assert!(settings.endpoint.is_none());
        assert_eq!(settings.autosave_interval, Duration::from_secs(30));
    }
}
