use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::state::ensure_spendwise_home;

pub const OPENAI_ENV: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub anthropic_token: Option<String>,
    pub openai_api_key: Option<String>,
}

impl AuthState {
    /// Non-empty environment variables win over stored keys.
    fn with_env_overrides(mut self) -> Self {
        if let Some(key) = env_key(OPENAI_ENV) {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = env_key(ANTHROPIC_ENV) {
            self.anthropic_token = Some(key);
        }
        self
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_spendwise_home()?.join("auth.json"))
}

fn load_stored() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// Stored keys with environment overrides applied.
pub fn load_auth() -> Result<AuthState> {
    Ok(load_stored()?.with_env_overrides())
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn anthropic_paste_token() -> Result<()> {
    // env overrides must not be persisted
    let mut auth = load_stored()?;
    let token = prompt_secret("Paste Anthropic API key (starts with sk-ant-)")?;
    if !token.starts_with("sk-ant-") {
        bail!("key didn't look like an Anthropic key (expected prefix sk-ant-)");
    }
    auth.anthropic_token = Some(token);
    save_auth(&auth)?;
    println!("Saved Anthropic key to {}", auth_path()?.display());
    Ok(())
}

pub fn openai_paste_api_key() -> Result<()> {
    let mut auth = load_stored()?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth(&auth)?;
    println!("Saved OpenAI API key to {}", auth_path()?.display());
    Ok(())
}
