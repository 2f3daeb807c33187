use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendwise_core::UserProfile;
use spendwise_finance::{KeywordRule, KeywordTable};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_spendwise_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub profile: ProfileSection,
    /// Overrides the built-in keyword table, row order preserved
    #[serde(default)]
    pub keywords: Vec<KeywordRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "auto", "openai" or "anthropic"
    pub provider: String,
    /// Provider default when unset
    pub model: Option<String>,
    /// Replaces the per-request temperature when set
    pub temperature: Option<f32>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    pub monthly_income: f64,
    pub savings_goal: f64,
    /// IANA zone used to place "now" on the local calendar
    pub timezone: String,
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            model: None,
            temperature: None,
            enabled: true,
        }
    }
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            monthly_income: 0.0,
            savings_goal: 0.0,
            timezone: default_timezone(),
        }
    }
}

impl Config {
    pub fn user_profile(&self) -> UserProfile {
        UserProfile::new(self.profile.monthly_income, self.profile.savings_goal)
    }

    pub fn keyword_table(&self) -> KeywordTable {
        if self.keywords.is_empty() {
            KeywordTable::default()
        } else {
            KeywordTable::from_rules(&self.keywords)
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_spendwise_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        tracing::debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the default config, spelling out the keyword table so it can be edited.
pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config {
        keywords: KeywordTable::default().to_rules(),
        ..Config::default()
    };
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}
