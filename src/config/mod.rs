//! # Configuration management
//!
//! Incarnadine reads a single TOML file with four sections:
//!
//! - [`ServerConfig`] - world identity (name, motd, start/safe rooms)
//! - [`GameConfig`] - engine tuning (combat cadence, sweep intervals, odds)
//! - [`StorageConfig`] - player store location
//! - [`LoggingConfig`] - log level and optional log file
//!
//! Values are validated on load; `Config::default()` provides a playable
//! starter configuration and `incarnadine init` writes it to disk.
//!
//! ```toml
//! [server]
//! name = "Incarnadine Castle"
//! start_room = "1"
//! safe_room = "1"
//!
//! [game]
//! combat_round_secs = 3
//! respawn_sweep_secs = 5
//! respawn_delay_secs = 30
//! wander_sweep_secs = 60
//! wander_chance = 0.1
//! aggro_chance = 0.5
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// World identity and entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    /// Message shown to every newly connected guest.
    pub motd: String,
    /// Room where new sessions and freshly registered players begin.
    pub start_room: String,
    /// Room players are returned to on death or successful retreat.
    pub safe_room: String,
}

/// Engine tuning knobs. All intervals are in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameConfig {
    /// Delay between combat rounds of one engagement.
    pub combat_round_secs: u64,
    /// How often the respawn sweep scans for elapsed death timers.
    pub respawn_sweep_secs: u64,
    /// How long a slain monster stays down before the sweep revives it.
    pub respawn_delay_secs: u64,
    /// How often the wander sweep considers relocating roaming monsters.
    pub wander_sweep_secs: u64,
    /// Per-sweep probability that a given roaming monster relocates.
    pub wander_chance: f64,
    /// Probability that a living aggressive monster lunges at a viewer.
    pub aggro_chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "Incarnadine Castle".to_string(),
            motd: "Welcome, Guest. The 144,000 doors await. Type 'help' for commands."
                .to_string(),
            start_room: "1".to_string(),
            safe_room: "1".to_string(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            combat_round_secs: 3,
            respawn_sweep_secs: 5,
            respawn_delay_secs: 30,
            wander_sweep_secs: 60,
            wander_chance: 0.10,
            aggro_chance: 0.50,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            game: GameConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("cannot read config file '{}': {}", path, e))?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| anyhow!("invalid config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a starter configuration file with default values.
    pub async fn create_default(path: &str) -> Result<Self> {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config)?;
        fs::write(path, serialized).await?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.start_room.is_empty() || self.server.safe_room.is_empty() {
            return Err(anyhow!("server.start_room and server.safe_room must be set"));
        }
        if self.game.combat_round_secs == 0
            || self.game.respawn_sweep_secs == 0
            || self.game.wander_sweep_secs == 0
        {
            return Err(anyhow!("game intervals must be nonzero"));
        }
        if !(0.0..=1.0).contains(&self.game.wander_chance) {
            return Err(anyhow!("game.wander_chance must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.game.aggro_chance) {
            return Err(anyhow!("game.aggro_chance must be within [0, 1]"));
        }
        if self.storage.data_dir.is_empty() {
            return Err(anyhow!("storage.data_dir must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().expect("defaults valid");
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let raw = toml::to_string_pretty(&config).expect("serialize");
        let parsed: Config = toml::from_str(&raw).expect("parse");
        parsed.validate().expect("still valid");
        assert_eq!(parsed.server.start_room, config.server.start_room);
        assert_eq!(parsed.game.respawn_delay_secs, config.game.respawn_delay_secs);
    }

    #[test]
    fn out_of_range_chance_is_rejected() {
        let mut config = Config::default();
        config.game.wander_chance = 1.5;
        assert!(config.validate().is_err());
    }
}
