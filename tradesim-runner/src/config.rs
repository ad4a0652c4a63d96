//! Run file: one TOML document describing a complete backtest.
//!
//! ```toml
//! [backtest]
//! initial_capital = 10000
//! commission_rate = 0.001
//!
//! [strategy]
//! stop_loss_pct = 0.005
//! take_profit_pct = 0.01
//!
//! [ema]
//! fast_period = 9
//! slow_period = 21
//!
//! [risk]
//! max_daily_loss = 100
//!
//! [data]
//! path = "candles.csv"
//! symbol = "BTC-USD"
//! ```
//!
//! Every section is optional and falls back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tradesim_core::config::{BacktestConfig, ConfigError, RiskConfig, StrategyParams};
use tradesim_core::signals::EmaCrossover;

/// Content-addressed identifier for a run (BLAKE3 hex).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum FileConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse run file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("invalid ema section: {0}")]
    Ema(String),

    #[error("[data] needs either `path` or `synthetic_candles`")]
    NoDataSource,
}

/// EMA crossover parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaSection {
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
}

impl Default for EmaSection {
    fn default() -> Self {
        Self {
            fast_period: 9,
            slow_period: 21,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }
}

impl EmaSection {
    pub fn validate(&self) -> Result<(), FileConfigError> {
        if self.fast_period == 0 || self.rsi_period == 0 {
            return Err(FileConfigError::Ema(
                "fast_period and rsi_period must be at least 1".into(),
            ));
        }
        if self.slow_period <= self.fast_period {
            return Err(FileConfigError::Ema(format!(
                "slow_period ({}) must exceed fast_period ({})",
                self.slow_period, self.fast_period
            )));
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(FileConfigError::Ema(format!(
                "RSI bounds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                self.rsi_oversold, self.rsi_overbought
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<EmaCrossover, FileConfigError> {
        self.validate()?;
        Ok(
            EmaCrossover::try_new(self.fast_period, self.slow_period, self.rsi_period)?
                .with_rsi_bounds(self.rsi_oversold, self.rsi_overbought),
        )
    }
}

/// Where candles come from. A CSV `path` takes precedence over `synthetic_candles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub path: Option<PathBuf>,
    pub symbol: String,
    pub synthetic_candles: Option<usize>,
    pub seed: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            path: None,
            symbol: "BTC-USD".into(),
            synthetic_candles: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFile {
    pub backtest: BacktestConfig,
    pub strategy: StrategyParams,
    pub ema: EmaSection,
    pub risk: RiskConfig,
    pub data: DataSection,
}

impl RunFile {
    pub fn from_file(path: &Path) -> Result<Self, FileConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| FileConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::from_toml(&content)?;
        // Relative data paths resolve against the run file's directory.
        if let (Some(data_path), Some(dir)) = (&file.data.path, path.parent()) {
            if data_path.is_relative() {
                file.data.path = Some(dir.join(data_path));
            }
        }
        Ok(file)
    }

    pub fn from_toml(content: &str) -> Result<Self, FileConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), FileConfigError> {
        self.backtest.validate()?;
        self.strategy.validate()?;
        self.risk.validate()?;
        self.ema.validate()?;
        if self.data.path.is_none() && self.data.synthetic_candles.is_none() {
            return Err(FileConfigError::NoDataSource);
        }
        Ok(())
    }

    /// Deterministic id over the full configuration and the dataset it ran on.
    pub fn run_id(&self, dataset_hash: &str) -> RunId {
        let mut hasher = blake3::Hasher::new();
        if let Ok(json) = serde_json::to_vec(self) {
            hasher.update(&json);
        }
        hasher.update(dataset_hash.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
[backtest]
initial_capital = 5000
commission_rate = 0.002
allow_short = true

[strategy]
stop_loss_pct = 0.01
window_size = 60

[ema]
fast_period = 5
slow_period = 13

[risk]
max_daily_loss = 250
consecutive_loss_limit = 4

[data]
path = "btc.csv"
symbol = "BTC-USD"
"#;

    #[test]
    fn parses_partial_sections_with_defaults() {
        let file = RunFile::from_toml(SAMPLE).unwrap();
        assert_eq!(file.backtest.initial_capital, dec!(5000));
        assert_eq!(file.backtest.commission_rate, dec!(0.002));
        assert_eq!(file.backtest.slippage_rate, dec!(0.0005));
        assert!(file.backtest.allow_short);
        assert_eq!(file.strategy.window_size, 60);
        assert_eq!(file.strategy.min_history_candles, 25);
        assert_eq!(file.ema.fast_period, 5);
        assert_eq!(file.ema.rsi_period, 14);
        assert_eq!(file.risk.max_daily_loss, dec!(250));
        assert_eq!(file.risk.consecutive_loss_limit, 4);
        assert_eq!(file.data.path, Some(PathBuf::from("btc.csv")));
        assert!(file.validate().is_ok());
    }

    #[test]
    fn empty_file_needs_a_data_source() {
        let file = RunFile::from_toml("").unwrap();
        assert!(matches!(file.validate(), Err(FileConfigError::NoDataSource)));
    }

    #[test]
    fn ema_periods_are_checked() {
        let file = RunFile::from_toml("[ema]\nfast_period = 20\nslow_period = 10\n").unwrap();
        assert!(matches!(file.ema.validate(), Err(FileConfigError::Ema(_))));
        assert!(file.ema.build().is_err());
        assert_eq!(EmaSection::default().build().unwrap().slow_period, 21);
    }

    #[test]
    fn invalid_core_config_surfaces() {
        let toml = "[backtest]\ninitial_capital = 0\n[data]\nsynthetic_candles = 10\n";
        let file = RunFile::from_toml(toml).unwrap();
        assert!(matches!(
            file.validate(),
            Err(FileConfigError::Invalid(ConfigError::NotPositive { .. }))
        ));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let file = RunFile::from_toml(SAMPLE).unwrap();
        assert_eq!(file.run_id("abc"), file.run_id("abc"));
        assert_ne!(file.run_id("abc"), file.run_id("abd"));

        let mut other = file.clone();
        other.ema.fast_period = 6;
        assert_ne!(file.run_id("abc"), other.run_id("abc"));
    }

    #[test]
    fn unknown_toml_is_a_parse_error() {
        assert!(matches!(
            RunFile::from_toml("[backtest\n"),
            Err(FileConfigError::Parse(_))
        ));
    }
}
