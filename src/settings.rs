//! Settings loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path in `HOSTKIT_CONFIG`), then applies `HOSTKIT_LOG_LEVEL`.
//!
//! ```toml
//! [host]
//! log_level = "info"
//!
//! [guard]
//! failure_policy = "retain"
//!
//! [namespaces.default]
//! port = 8888
//! ```

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::config_store::Properties;
use crate::error::AppError;
use crate::guard::FailurePolicy;
use crate::logger;

/// Fully-resolved host settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Plain level name, checked by [`logger::parse_level`] at load time.
    pub log_level: String,
    /// Policy for guards built with `CallGuard::from_settings`.
    pub failure_policy: FailurePolicy,
    /// One entry per `[namespaces.<name>]` table, applied to the config store
    /// at startup.
    pub namespaces: BTreeMap<String, Properties>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            failure_policy: FailurePolicy::default(),
            namespaces: BTreeMap::new(),
        }
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize)]
struct RawSettings {
    #[serde(default)]
    host: RawHost,
    #[serde(default)]
    guard: RawGuard,
    #[serde(default)]
    namespaces: BTreeMap<String, Properties>,
}

#[derive(Deserialize)]
struct RawHost {
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawHost {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

#[derive(Deserialize, Default)]
struct RawGuard {
    #[serde(default)]
    failure_policy: FailurePolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load settings from `HOSTKIT_CONFIG` (default `config/default.toml`), then
/// apply env-var overrides.
pub fn load() -> Result<Settings, AppError> {
    let path = env::var("HOSTKIT_CONFIG")
        .map(|p| expand_home(&p))
        .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
    let log_level_override = env::var("HOSTKIT_LOG_LEVEL").ok();
    load_from(&path, log_level_override.as_deref())
}

/// Internal loader. Accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, log_level_override: Option<&str>) -> Result<Settings, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let settings = parse(&raw, log_level_override)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    logger::parse_level(&settings.log_level)
        .map_err(|e| AppError::Config(format!("invalid log_level in {}: {e}", path.display())))?;
    Ok(settings)
}

fn parse(raw: &str, log_level_override: Option<&str>) -> Result<Settings, toml::de::Error> {
    let parsed: RawSettings = toml::from_str(raw)?;
    Ok(Settings {
        log_level: log_level_override.unwrap_or(&parsed.host.log_level).to_string(),
        failure_policy: parsed.guard.failure_policy,
        namespaces: parsed.namespaces,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_TOML: &str = r#"
[host]
log_level = "warn"

[guard]
failure_policy = "release"

[namespaces.default]
port = 8888
plugins = ["stockpile", "sandcat"]

[namespaces.agents]
sleep_min = 30
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_full_settings() {
        let f = write_toml(FULL_TOML);
        let s = load_from(f.path(), None).unwrap();
        assert_eq!(s.log_level, "warn");
        assert_eq!(s.failure_policy, FailurePolicy::Release);
        assert_eq!(s.namespaces.len(), 2);
        assert_eq!(s.namespaces["default"]["port"], json!(8888));
        assert_eq!(s.namespaces["default"]["plugins"], json!(["stockpile", "sandcat"]));
        assert_eq!(s.namespaces["agents"]["sleep_min"], json!(30));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_toml("");
        let s = load_from(f.path(), None).unwrap();
        assert_eq!(s.log_level, "info");
        assert_eq!(s.failure_policy, FailurePolicy::Retain);
        assert!(s.namespaces.is_empty());
    }

    #[test]
    fn log_level_override() {
        let f = write_toml(FULL_TOML);
        let s = load_from(f.path(), Some("debug")).unwrap();
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn invalid_log_level_rejected_at_load() {
        let f = write_toml("[host]\nlog_level = \"chatty\"\n");
        let err = load_from(f.path(), None).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("chatty")));

        let f = write_toml(FULL_TOML);
        assert!(matches!(load_from(f.path(), Some("loud")), Err(AppError::Config(_))));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/hostkit.toml"), None);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn unknown_policy_errors() {
        let f = write_toml("[guard]\nfailure_policy = \"sometimes\"\n");
        assert!(matches!(load_from(f.path(), None), Err(AppError::Config(_))));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.hostkit.toml");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".hostkit.toml"));
    }

    #[test]
    fn plain_paths_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }
}
