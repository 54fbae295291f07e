//! Library configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{Error, Result};

/// Configuration for lyric loading and playback.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory relative lyric file names are resolved against
    pub lyrics_dir: Option<PathBuf>,
    /// Milliseconds to fire each line before its timestamp
    pub lead_ms: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(lead) = env::var(constants::env::LEAD_MS) {
            config.lead_ms = parse_lead_ms(&lead)?;
        }

        // Lyrics dir: env var override, or default <audio dir>/Lyrics
        config.lyrics_dir = env::var(constants::env::LYRICS_DIR).ok().map_or_else(
            || {
                dirs::audio_dir()
                    .map(|a| a.join("Lyrics"))
                    .filter(|p| p.is_dir())
            },
            |path| {
                let p = PathBuf::from(shellexpand::tilde(&path).to_string());
                p.is_dir().then_some(p)
            },
        );

        tracing::debug!("Loaded config: lyrics_dir={:?} lead_ms={}", config.lyrics_dir, config.lead_ms);
        Ok(config)
    }

    /// Resolve a lyric file name. Absolute paths, and all paths when no
    /// lyrics directory is configured, are returned unchanged.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        match &self.lyrics_dir {
            Some(dir) if name.is_relative() => dir.join(name),
            _ => name.to_path_buf(),
        }
    }
}

fn parse_lead_ms(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        Error::config(
            format!("{} must be an integer, got {raw:?}", constants::env::LEAD_MS),
            "Set it to a whole number of milliseconds, e.g. 150",
        )
    })
}
