use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    /// Overrides the Gemini models endpoint, e.g. for a proxy.
    pub gemini_api_base: Option<String>,
    /// Directory holding users.json, profile.json, profile_pics.json and history.json.
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub default_profile_pic: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE").ok(),
            data_dir: env_or("DATA_DIR", ".").into(),
            uploads_dir: env_or("UPLOADS_DIR", "uploads").into(),
            default_profile_pic: env_or("DEFAULT_PROFILE_PIC", "default_photo.png"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
