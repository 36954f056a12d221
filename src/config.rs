//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::ConfigError,
    storage::{self, KeyValueStore, TIMER_CONFIG_KEY},
};

/// Smallest accepted tick interval
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "flowmodoro")]
#[command(about = "A Flowmodoro focus timer served over HTTP")]
#[command(version)]
pub struct Cli {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the persisted timer state
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Work-to-break divisor (break = work / ratio)
    #[arg(short, long)]
    pub break_ratio: Option<u32>,

    /// Display refresh cadence in milliseconds
    #[arg(short, long)]
    pub tick_interval_ms: Option<u64>,

    /// Minimum break length in seconds
    #[arg(short, long)]
    pub minimum_break: Option<u64>,

    /// Keep all state in memory only
    #[arg(long)]
    pub no_persist: bool,

    /// Base URL of the metrics API; page visits are not tracked when unset
    #[arg(long)]
    pub metrics_base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Resolve the data directory, falling back to the platform data dir
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("flowmodoro")
        })
    }

    /// Timer settings given explicitly on the command line
    pub fn config_overrides(&self) -> ConfigUpdate {
        ConfigUpdate {
            break_ratio: self.break_ratio,
            tick_interval_ms: self.tick_interval_ms,
            minimum_break_seconds: self.minimum_break,
            persist: self.no_persist.then_some(false),
        }
    }

    /// Explicit flags layered over the stored (or default) timer config
    pub fn timer_config(&self, stored: Option<TimerConfig>) -> Result<LayeredConfig, ConfigError> {
        LayeredConfig::new(stored.unwrap_or_default(), self.config_overrides())
    }
}

/// Tunables of the timer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    /// break = floor(work / break_ratio)
    pub break_ratio: u32,
    pub tick_interval_ms: u64,
    pub minimum_break_seconds: u64,
    pub persist: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            break_ratio: 5,
            tick_interval_ms: 1000,
            minimum_break_seconds: 0,
            persist: true,
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.break_ratio == 0 {
            return Err(ConfigError::InvalidBreakRatio(self.break_ratio));
        }
        if self.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::InvalidTickInterval {
                got: self.tick_interval_ms,
                min: MIN_TICK_INTERVAL_MS,
            });
        }
        Ok(())
    }

    /// Apply a partial update; on error `self` is left untouched
    pub fn apply(&mut self, update: &ConfigUpdate) -> Result<(), ConfigError> {
        let mut next = *self;
        if let Some(ratio) = update.break_ratio {
            next.break_ratio = ratio;
        }
        if let Some(interval) = update.tick_interval_ms {
            next.tick_interval_ms = interval;
        }
        if let Some(minimum) = update.minimum_break_seconds {
            next.minimum_break_seconds = minimum;
        }
        if let Some(persist) = update.persist {
            next.persist = persist;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Load the stored config; missing, corrupt or invalid payloads yield `None`
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        let config: Self = storage::load_record(store, TIMER_CONFIG_KEY)?;
        match config.validate() {
            Ok(()) => Some(config),
            Err(e) => {
                warn!("Ignoring stored timer config: {}", e);
                None
            }
        }
    }
}

/// Stored timer config with the command-line overrides of this run on top
///
/// Only the stored layer is ever persisted; overrides last for the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredConfig {
    stored: TimerConfig,
    overrides: ConfigUpdate,
    effective: TimerConfig,
}

impl LayeredConfig {
    pub fn new(stored: TimerConfig, overrides: ConfigUpdate) -> Result<Self, ConfigError> {
        let mut effective = stored;
        effective.apply(&overrides)?;
        Ok(Self {
            stored,
            overrides,
            effective,
        })
    }

    /// The config the timer runs with
    pub fn effective(&self) -> TimerConfig {
        self.effective
    }

    /// The config that is written to the store
    pub fn stored(&self) -> TimerConfig {
        self.stored
    }

    /// Apply `update` to the stored layer and recompute the effective config
    ///
    /// Settings pinned by an override keep the override's value. On error
    /// nothing changes.
    pub fn update(&mut self, update: &ConfigUpdate) -> Result<TimerConfig, ConfigError> {
        let mut stored = self.stored;
        stored.apply(update)?;
        *self = Self::new(stored, self.overrides.clone())?;
        Ok(self.effective)
    }
}

impl From<TimerConfig> for LayeredConfig {
    fn from(config: TimerConfig) -> Self {
        Self {
            stored: config,
            overrides: ConfigUpdate::default(),
            effective: config,
        }
    }
}

/// Partial config change, as accepted by `PUT /config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub break_ratio: Option<u32>,
    pub tick_interval_ms: Option<u64>,
    pub minimum_break_seconds: Option<u64>,
    pub persist: Option<bool>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::{save_record, MemoryStore};

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["flowmodoro"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = TimerConfig::default();
        assert_eq!(config.break_ratio, 5);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.minimum_break_seconds, 0);
        assert!(config.persist);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.address(), "127.0.0.1:20554");
        assert_eq!(cli.log_level(), "info");
        assert_eq!(cli.timer_config(None).unwrap().effective(), TimerConfig::default());
        assert_eq!(cli.config_overrides(), ConfigUpdate::default());
    }

    #[test]
    fn test_cli_flags_override_stored_config() {
        let stored = TimerConfig {
            break_ratio: 3,
            minimum_break_seconds: 30,
            ..TimerConfig::default()
        };
        let cli = cli(&["--break-ratio", "4", "--no-persist", "-v"]);

        let layered = cli.timer_config(Some(stored)).unwrap();
        let config = layered.effective();
        assert_eq!(config.break_ratio, 4);
        assert_eq!(config.minimum_break_seconds, 30);
        assert!(!config.persist);
        assert_eq!(layered.stored(), stored);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_update_keeps_overrides_out_of_stored_layer() {
        let stored = TimerConfig {
            break_ratio: 3,
            ..TimerConfig::default()
        };
        let mut layered = cli(&["--break-ratio", "4"]).timer_config(Some(stored)).unwrap();

        let effective = layered
            .update(&ConfigUpdate {
                tick_interval_ms: Some(500),
                ..ConfigUpdate::default()
            })
            .unwrap();
        assert_eq!(effective.break_ratio, 4);
        assert_eq!(effective.tick_interval_ms, 500);
        assert_eq!(layered.stored().break_ratio, 3);
        assert_eq!(layered.stored().tick_interval_ms, 500);

        // The flag still wins for this run
        let effective = layered
            .update(&ConfigUpdate {
                break_ratio: Some(2),
                ..ConfigUpdate::default()
            })
            .unwrap();
        assert_eq!(effective.break_ratio, 4);
        assert_eq!(layered.stored().break_ratio, 2);
    }

    #[test]
    fn test_failed_update_leaves_layers_alone() {
        let mut layered = LayeredConfig::from(TimerConfig::default());
        let before = layered.clone();

        let update = ConfigUpdate {
            break_ratio: Some(0),
            ..ConfigUpdate::default()
        };
        assert_eq!(layered.update(&update), Err(ConfigError::InvalidBreakRatio(0)));
        assert_eq!(layered, before);
    }

    #[test]
    fn test_cli_rejects_zero_ratio() {
        let cli = cli(&["--break-ratio", "0"]);
        assert_eq!(
            cli.timer_config(None),
            Err(ConfigError::InvalidBreakRatio(0))
        );
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut config = TimerConfig::default();
        let update = ConfigUpdate {
            break_ratio: Some(2),
            tick_interval_ms: Some(1),
            ..ConfigUpdate::default()
        };

        assert!(matches!(
            config.apply(&update),
            Err(ConfigError::InvalidTickInterval { got: 1, .. })
        ));
        assert_eq!(config, TimerConfig::default());
    }

    #[test]
    fn test_load_config() {
        let store = MemoryStore::new();
        assert!(TimerConfig::load(&store).is_none());

        let config = TimerConfig {
            break_ratio: 4,
            ..TimerConfig::default()
        };
        save_record(&store, TIMER_CONFIG_KEY, &config, 0).unwrap();
        assert_eq!(TimerConfig::load(&store), Some(config));
    }

    #[test]
    fn test_load_rejects_invalid_stored_config() {
        let store = MemoryStore::new();
        let invalid = TimerConfig {
            break_ratio: 0,
            ..TimerConfig::default()
        };
        save_record(&store, TIMER_CONFIG_KEY, &invalid, 0).unwrap();
        assert!(TimerConfig::load(&store).is_none());

        store
            .set(TIMER_CONFIG_KEY, json!({"version": 1, "savedAt": 0, "data": "nope"}))
            .unwrap();
        assert!(TimerConfig::load(&store).is_none());
    }

    #[test]
    fn test_partial_update_json() {
        let update: ConfigUpdate = serde_json::from_str(r#"{"breakRatio": 3}"#).unwrap();
        assert_eq!(update.break_ratio, Some(3));
        assert!(update.persist.is_none());
    }
}
