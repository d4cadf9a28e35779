//! Configuration management for coursetrack

pub mod session;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Score and time thresholds that drive completion and badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Quiz score at or above which a module completes itself
    pub passing_score: u8,

    /// Total minutes that must be exceeded for the dedicated-learner badge
    pub dedicated_learner_minutes: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { passing_score: 70, dedicated_learner_minutes: 120 }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name used as the author of discussion posts
    pub learner_name: String,

    /// Seconds between session timer ticks (each tick is one minute of credit)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Completion and badge thresholds
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_tick_interval() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learner_name: "Learner".to_string(),
            tick_interval_secs: default_tick_interval(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, writing defaults if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    /// Get the path to the course catalog override
    pub fn catalog_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("courses.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Get the key-value store directory path
    pub fn store_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("store"))
    }

    /// Get the timer tick interval
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs.max(1))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "coursetrack").context("Failed to determine config directory")
    }
}
