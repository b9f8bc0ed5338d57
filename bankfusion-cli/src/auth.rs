use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::state::{AUTH_FILE, bankfusion_home};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub openai_api_key: Option<String>,
}

pub fn load_auth_from(path: &Path) -> Result<AuthState> {
    if !path.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&bankfusion_home()?.join(AUTH_FILE))
}

/// API key from the environment, else `~/.bankfusion/auth.json`
pub fn api_key() -> Result<Option<String>> {
    if let Some(key) = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()) {
        return Ok(Some(key.trim().to_string()));
    }
    Ok(load_auth()?
        .openai_api_key
        .filter(|k| !k.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_auth_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let auth = load_auth_from(&dir.path().join("auth.json")).unwrap();
        assert!(auth.openai_api_key.is_none());
    }

    #[test]
    fn test_reads_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, r#"{"openai_api_key": "sk-test"}"#).unwrap();
        assert_eq!(load_auth_from(&path).unwrap().openai_api_key.as_deref(), Some("sk-test"));
    }
}
