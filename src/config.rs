//! Configuration for the session core.
//!
//! This module provides runtime configuration loading from JSON files with
//! warn-and-fall-back-to-default semantics, so a missing or malformed file
//! never prevents the demo from starting. Playback settings are also held
//! live behind the session so the presentation layer can adjust them
//! between button presses.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackSettings,
    /// Codec table mapping asset extensions to decoder names, handed to the
    /// engine at construction time
    #[serde(default = "default_codecs")]
    pub codecs: BTreeMap<String, String>,
    #[serde(default)]
    pub crash: CrashConfig,
}

/// Stream buffer parameters read at dispatch time by every play command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Base stream buffer size in bytes
    pub stream_buffer_size: u32,
    /// Multiplier applied to the base buffer size
    pub stream_buffer_size_multiplier: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            stream_buffer_size: 4096,
            stream_buffer_size_multiplier: 4,
        }
    }
}

/// Crash recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashConfig {
    /// Tag embedded in crash log file names
    pub tag: String,
    /// Directory for crash logs; falls back to the system temp directory
    /// when unset or unwritable
    pub report_dir: Option<PathBuf>,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            tag: "soundpad".to_string(),
            report_dir: None,
        }
    }
}

fn default_codecs() -> BTreeMap<String, String> {
    let mut codecs = BTreeMap::new();
    codecs.insert("ogg".to_string(), "vorbis".to_string());
    codecs.insert("spx".to_string(), "speex".to_string());
    codecs.insert("mod".to_string(), "ibxm".to_string());
    codecs.insert("xm".to_string(), "ibxm".to_string());
    codecs.insert("s3m".to_string(), "ibxm".to_string());
    codecs
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            playback: PlaybackSettings::default(),
            codecs: default_codecs(),
            crash: CrashConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing or malformed files are logged as warnings and replaced with
    /// the default configuration.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/session.json")
    }
}
