//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default backend base URL when `GUIDE_API_URL` is unset
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Silence window that ends an utterance
const DEFAULT_SILENCE_MS: u64 = 1500;

/// Bounded wait for the assistant backend before apologising
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 8;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Full URL of the assistant endpoint (`<base>/api/assistant`)
    pub assistant_url: String,

    /// How long the remote fallback may take before it is abandoned
    pub remote_timeout: Duration,

    /// Quiet period after the last final fragment before an utterance is emitted
    pub silence_window: Duration,

    /// Fixed voice parameters for every spoken reply
    pub voice: VoiceSettings,

    /// Fixed parameters requested from the recognition engine
    pub recognition: RecognitionSettings,
}

/// Voice parameters handed to the synthesizer with every utterance
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        // Slightly faster than normal speech
        Self {
            rate: 1.1,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Parameters for a continuous, interim-enabled listening episode
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecognitionSettings {
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("guide-daemon");

        let socket_path = match std::env::var("GUIDE_SOCKET_PATH") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => data_dir.join("guide.sock"),
        };

        let api_base = std::env::var("GUIDE_API_URL").unwrap_or_default();
        let assistant_url = assistant_endpoint(&api_base);

        let remote_timeout = Duration::from_secs(env_u64(
            "GUIDE_REMOTE_TIMEOUT_SECS",
            DEFAULT_REMOTE_TIMEOUT_SECS,
        )?);
        let silence_window = Duration::from_millis(env_u64("GUIDE_SILENCE_MS", DEFAULT_SILENCE_MS)?);

        Ok(Self {
            socket_path,
            data_dir,
            assistant_url,
            remote_timeout,
            silence_window,
            voice: VoiceSettings::default(),
            recognition: RecognitionSettings::default(),
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

/// Build the assistant endpoint from a backend base URL
fn assistant_endpoint(base: &str) -> String {
    let base = base.trim();
    let base = if base.is_empty() { DEFAULT_API_URL } else { base };
    format!("{}/api/assistant", base.trim_end_matches('/'))
}

/// Read a numeric environment variable, falling back when unset
fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a whole number, got {raw:?}")),
        _ => Ok(default),
    }
}
