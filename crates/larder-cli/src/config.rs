// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use larder_app::{DEFAULT_MIN_CHARS, DEFAULT_QUIET_PERIOD, DEFAULT_SUGGESTION_LIMIT};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_INITIAL_QUERY: &str = "chicken";
const DEFAULT_INITIAL_LIMIT: usize = 12;
const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Beef",
    "Chicken",
    "Dessert",
    "Seafood",
    "Vegetarian",
    "Pasta",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            catalog: Catalog::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            base_url: Some(larder_catalog::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub suggestion_delay: Option<String>,
    pub min_suggestion_chars: Option<usize>,
    pub suggestion_limit: Option<usize>,
    pub initial_query: Option<String>,
    pub initial_limit: Option<usize>,
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("LARDER_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set LARDER_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(larder_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            larder_db::validate_db_path(db_path)?;
        }

        if let Some(base_url) = &self.catalog.base_url
            && base_url.trim_end_matches('/').is_empty()
        {
            bail!("catalog.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.catalog.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "catalog.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(delay) = &self.ui.suggestion_delay {
            parse_duration(delay)?;
        }

        for (key, value) in [
            ("ui.min_suggestion_chars", self.ui.min_suggestion_chars),
            ("ui.suggestion_limit", self.ui.suggestion_limit),
            ("ui.initial_limit", self.ui.initial_limit),
        ] {
            if value == Some(0) {
                bail!("{key} in {} must be at least 1", path.display());
            }
        }

        if let Some(query) = &self.ui.initial_query
            && query.trim().is_empty()
        {
            bail!("ui.initial_query in {} must not be blank", path.display());
        }

        if let Some(level) = &self.log.level {
            tracing_subscriber::EnvFilter::try_new(level)
                .with_context(|| format!("invalid log.level {level:?} in {}", path.display()))?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => larder_db::default_db_path(),
        }
    }

    pub fn catalog_base_url(&self) -> &str {
        self.catalog
            .base_url
            .as_deref()
            .unwrap_or(larder_catalog::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn catalog_timeout(&self) -> Result<Duration> {
        parse_duration(self.catalog.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn suggestion_delay(&self) -> Result<Duration> {
        match &self.ui.suggestion_delay {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_QUIET_PERIOD),
        }
    }

    pub fn min_suggestion_chars(&self) -> usize {
        self.ui.min_suggestion_chars.unwrap_or(DEFAULT_MIN_CHARS)
    }

    pub fn suggestion_limit(&self) -> usize {
        self.ui.suggestion_limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT)
    }

    pub fn initial_query(&self) -> &str {
        self.ui
            .initial_query
            .as_deref()
            .map_or(DEFAULT_INITIAL_QUERY, str::trim)
    }

    pub fn initial_limit(&self) -> usize {
        self.ui.initial_limit.unwrap_or(DEFAULT_INITIAL_LIMIT)
    }

    /// Configured category names, or `None` to take them from the catalog.
    pub fn categories(&self) -> Option<Vec<String>> {
        self.ui.categories.clone()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => larder_db::default_log_path(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# larder config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/larder/larder.db)\n# db_path = \"/absolute/path/to/larder.db\"\n\n[catalog]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[ui]\nsuggestion_delay = \"{}ms\"\nmin_suggestion_chars = {}\nsuggestion_limit = {}\ninitial_query = \"{}\"\ninitial_limit = {}\n# Optional. Default is the catalog's category list\n# categories = [{}]\n\n[log]\nlevel = \"{}\"\n# file = \"/absolute/path/to/larder.log\"\n",
            path.display(),
            larder_catalog::DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_QUIET_PERIOD.as_millis(),
            DEFAULT_MIN_CHARS,
            DEFAULT_SUGGESTION_LIMIT,
            DEFAULT_INITIAL_QUERY,
            DEFAULT_INITIAL_LIMIT,
            DEFAULT_CATEGORIES
                .iter()
                .map(|name| format!("\"{name}\""))
                .collect::<Vec<_>>()
                .join(", "),
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 220ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(
            config.catalog_base_url(),
            "https://www.themealdb.com/api/json/v1/1"
        );
        assert_eq!(config.suggestion_delay()?, Duration::from_millis(220));
        assert_eq!(config.min_suggestion_chars(), 2);
        assert_eq!(config.suggestion_limit(), 6);
        assert_eq!(config.initial_query(), "chicken");
        assert_eq!(config.initial_limit(), 12);
        assert!(config.categories().is_none());
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[ui]\ninitial_query = \"beef\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        assert!(error.to_string().contains("version = 1"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[catalog]\nbase_url = \"http://localhost:9000/api///\"\ntimeout = \"2s\"\n[ui]\nsuggestion_delay = \"300ms\"\nsuggestion_limit = 4\ninitial_query = \" beef \"\ncategories = [\"Beef\", \"Lamb\"]\n[log]\nlevel = \"larder=debug\"\nfile = \"/tmp/larder-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.catalog_base_url(), "http://localhost:9000/api");
        assert_eq!(config.catalog_timeout()?, Duration::from_secs(2));
        assert_eq!(config.suggestion_delay()?, Duration::from_millis(300));
        assert_eq!(config.suggestion_limit(), 4);
        assert_eq!(config.initial_query(), "beef");
        assert_eq!(
            config.categories(),
            Some(vec!["Beef".to_owned(), "Lamb".to_owned()])
        );
        assert_eq!(config.log_level(), "larder=debug");
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/larder-test.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("LARDER_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("LARDER_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn db_path_prefers_storage_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[storage]\ndb_path = \"/explicit/from-config.db\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("LARDER_DB_PATH", "/from/env.db");
        }
        let config = Config::load(&path)?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("LARDER_DB_PATH");
        }
        assert_eq!(config.db_path()?, PathBuf::from("/explicit/from-config.db"));
        Ok(())
    }

    #[test]
    fn db_path_uses_env_override_when_storage_db_path_missing() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("LARDER_DB_PATH", "/from/env-only.db");
        }
        let config = Config::load(&path)?;
        let resolved = config.db_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("LARDER_DB_PATH");
        }
        assert_eq!(resolved, PathBuf::from("/from/env-only.db"));
        Ok(())
    }

    #[test]
    fn db_path_rejects_uri_style_storage_value() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[storage]\ndb_path = \"https://evil.example/larder.db\"\n")?;
        let error = Config::load(&path).expect_err("URI db_path should fail validation");
        assert!(error.to_string().contains("looks like a URI"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("220ms")?, Duration::from_millis(220));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid duration"));
        Ok(())
    }

    #[test]
    fn oversized_minute_duration_is_an_error() {
        let raw = format!("{}m", u64::MAX / 2);
        let error = parse_duration(&raw).expect_err("overflowing minutes should fail");
        assert!(error.to_string().contains("too large"));
    }

    #[test]
    fn non_positive_timeout_and_zero_limits_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[catalog]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));

        let (_temp, path) = write_config("version = 1\n[ui]\nsuggestion_limit = 0\n")?;
        let error = Config::load(&path).expect_err("zero limit should fail");
        assert!(error.to_string().contains("ui.suggestion_limit"));
        Ok(())
    }

    #[test]
    fn blank_initial_query_and_bad_log_level_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\ninitial_query = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank query should fail");
        assert!(error.to_string().contains("must not be blank"));

        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"larder=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad level should fail");
        assert!(error.to_string().contains("invalid log.level"));
        Ok(())
    }

    #[test]
    fn example_config_loads_and_includes_sections() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        for section in ["version = 1", "[storage]", "[catalog]", "[ui]", "[log]"] {
            assert!(example.contains(section), "missing {section}");
        }
        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.suggestion_delay()?, Duration::from_millis(220));
        Ok(())
    }
}
