use anyhow::{Context, Result, anyhow};
use bankfusion_normalize::AdvisorySettings;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::{CONFIG_FILE, bankfusion_home};

pub const DISABLE_ADVISORY_ENV: &str = "BANKFUSION_DISABLE_ADVISORY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Used when RUST_LOG is unset
    pub log_level: Option<String>,
    pub paths: PathsSection,
    pub advisory: AdvisorySection,
    pub batch: BatchSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorySection {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Rows classified at once within one document
    pub concurrency: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    /// Documents processed at once
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// IANA name used for `generated_at`
    pub timezone: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw_pdfs"),
            output_dir: PathBuf::from("data/normalized_json"),
        }
    }
}

impl Default for AdvisorySection {
    fn default() -> Self {
        let settings = AdvisorySettings::default();
        Self {
            enabled: true,
            base_url: settings.base_url,
            model: settings.model,
            timeout_secs: settings.timeout.as_secs(),
            concurrency: 10,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

impl Default for BatchSection {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.output
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid output.timezone '{}': {e}", self.output.timezone))
    }

    pub fn advisory_settings(&self) -> AdvisorySettings {
        AdvisorySettings {
            base_url: self.advisory.base_url.clone(),
            model: self.advisory.model.clone(),
            temperature: self.advisory.temperature,
            max_tokens: self.advisory.max_tokens,
            timeout: Duration::from_secs(self.advisory.timeout_secs.max(1)),
        }
    }

    /// Config switch combined with the environment kill switch
    pub fn advisory_enabled(&self) -> bool {
        self.advisory.enabled && !env_disables_advisory(std::env::var(DISABLE_ADVISORY_ENV).ok().as_deref())
    }
}

fn env_disables_advisory(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

/// Where the config lives; nothing is created until `config init`
pub fn config_path() -> Result<PathBuf> {
    Ok(bankfusion_home()?.join(CONFIG_FILE))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write defaults to `<home>/config.toml`, creating `home`. An existing
/// file is left alone; returns the path and whether it was written.
pub fn init_config_in(home: &Path) -> Result<(PathBuf, bool)> {
    let p = home.join(CONFIG_FILE);
    if p.exists() {
        return Ok((p, false));
    }
    fs::create_dir_all(home).with_context(|| format!("create {}", home.display()))?;
    save_config_to(&Config::default(), &p)?;
    Ok((p, true))
}

pub fn init_config() -> Result<()> {
    match init_config_in(&bankfusion_home()?)? {
        (p, true) => println!("Wrote {}", p.display()),
        (p, false) => println!("Config already exists: {}", p.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.batch.concurrency, 4);
        assert_eq!(cfg.advisory.concurrency, 10);
        assert_eq!(cfg.advisory.timeout_secs, 20);
        assert_eq!(cfg.paths.input_dir, PathBuf::from("data/raw_pdfs"));
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
log_level = "debug"

[advisory]
enabled = false
model = "gpt-4o"

[output]
timezone = "UTC"
"#,
        )
        .unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert!(!cfg.advisory.enabled);
        assert_eq!(cfg.advisory.model, "gpt-4o");
        assert_eq!(cfg.advisory.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.batch.concurrency, 4);
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_saved_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.log_level = Some("warn".into());
        save_config_to(&cfg, &path).unwrap();
        let back = load_config_from(&path).unwrap();
        assert_eq!(back.log_level.as_deref(), Some("warn"));
        assert_eq!(back.output.timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_only_init_creates_home() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join(".bankfusion");

        let cfg = load_config_from(&home.join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg.batch.concurrency, 4);
        assert!(!home.exists());

        let (path, written) = init_config_in(&home).unwrap();
        assert!(written);
        assert!(path.is_file());
        let (_, again) = init_config_in(&home).unwrap();
        assert!(!again);
    }

    #[test]
    fn test_bad_timezone() {
        let mut cfg = Config::default();
        cfg.output.timezone = "Mars/Olympus".into();
        assert!(cfg.timezone().is_err());
    }

    #[rstest]
    #[case(Some("1"), true)]
    #[case(Some("TRUE"), true)]
    #[case(Some("0"), false)]
    #[case(None, false)]
    fn test_env_kill_switch(#[case] value: Option<&str>, #[case] disabled: bool) {
        assert_eq!(env_disables_advisory(value), disabled);
    }
}
