//! TOML-backed configuration for the providers, the session and the charts.
//!
//! Every section is optional; a missing file or section falls back to the
//! vendor defaults. Credentials can also come from the environment, which
//! wins over the file:
//!
//! | variable | overrides |
//! |---|---|
//! | `BARCHART_API_KEY` | `barchart.api_key` |
//! | `ALPHAVANTAGE_API_KEY` | `alpha_vantage.api_key` |
//! | `IEX_TOKEN` | `iex.token` |
//! | `IB_HOST`, `IB_PORT`, `IB_CLIENT_ID` | `ib.host`, `ib.port`, `ib.client_id` |
//!
//! ```toml
//! preferences = ["ib", "bc", "av", "iex"]
//!
//! [alpha_vantage]
//! api_key = "demo"
//!
//! [ib]
//! port = 4001        # paper gateway
//! client_id = 7979
//! ```

use std::{fs, path::Path, time::Duration};

use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use shared_utils::env::{EnvVarError, get_env_var_opt, parse_env_var};
use thiserror::Error;
use tracing::error;

use crate::{indicators::MovingAverage, providers::ProviderKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] EnvVarError),

    #[error("Unknown time zone {0:?}")]
    TimeZone(String),
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Provider order for [`first_available`](crate::providers::first_available).
    pub preferences: Vec<ProviderKind>,
    /// IANA zone of the exchange whose wall time the bars are expressed in.
    pub exchange_time_zone: String,
    pub barchart: BarchartConfig,
    pub alpha_vantage: AlphaVantageConfig,
    pub iex: IexConfig,
    pub ib: IbConfig,
    pub chart: ChartConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferences: vec![
                ProviderKind::Ib,
                ProviderKind::Barchart,
                ProviderKind::AlphaVantage,
                ProviderKind::Iex,
            ],
            exchange_time_zone: "America/New_York".to_string(),
            barchart: BarchartConfig::default(),
            alpha_vantage: AlphaVantageConfig::default(),
            iex: IexConfig::default(),
            ib: IbConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BarchartConfig {
    #[serde(deserialize_with = "secret_opt")]
    pub api_key: Option<SecretString>,
    pub base_url: String,
}

impl Default for BarchartConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://marketdata.websol.barchart.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlphaVantageConfig {
    #[serde(deserialize_with = "secret_opt")]
    pub api_key: Option<SecretString>,
    pub base_url: String,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.alphavantage.co".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IexConfig {
    /// Only the cloud endpoints need one; the legacy API is open.
    #[serde(deserialize_with = "secret_opt")]
    pub token: Option<SecretString>,
    pub base_url: String,
}

impl Default for IexConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: "https://api.iextrading.com/1.0".to_string(),
        }
    }
}

/// TWS / IB Gateway connection settings.
///
/// Live TWS listens on 7496 by convention, the paper gateway on 4001.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IbConfig {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    /// Bounded wait for connect plus the complete historical response.
    pub timeout_secs: u64,
}

impl Default for IbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7496,
            client_id: 7878,
            timeout_secs: 30,
        }
    }
}

impl IbConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `host:port`, the form `ibapi::Client::connect` takes.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chart file naming and canvas settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub out_dir: String,
    /// File name prefix, e.g. `trade` -> `trade01_SQ_...`.
    pub base: String,
    pub extension: String,
    /// strftime format for the begin/end parts of the file name.
    pub time_format: String,
    pub width: u32,
    pub height: u32,
    /// Up to four lines over the candles.
    pub moving_averages: Vec<MovingAverage>,
    pub vwap: bool,
    /// TTF/OTF file for chart text. Without one, common system locations are
    /// tried; with none found the chart is drawn without text.
    pub font_path: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            out_dir: "out".to_string(),
            base: "trade".to_string(),
            extension: ".png".to_string(),
            time_format: "%H%M".to_string(),
            width: 1200,
            height: 800,
            moving_averages: vec![
                MovingAverage::ema(9),
                MovingAverage::ema(20),
                MovingAverage::ema(50),
                MovingAverage::ema(200),
            ],
            vwap: true,
            font_path: None,
        }
    }
}

impl Config {
    /// Reads a TOML file, then applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            error!("Failed to read config file {}: {source}", path.display());
            ConfigError::Read {
                path: path.display().to_string(),
                source,
            }
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides; for running without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.exchange_tz()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(key) = get_env_var_opt("BARCHART_API_KEY") {
            self.barchart.api_key = Some(SecretString::new(key.into()));
        }
        if let Some(key) = get_env_var_opt("ALPHAVANTAGE_API_KEY") {
            self.alpha_vantage.api_key = Some(SecretString::new(key.into()));
        }
        if let Some(token) = get_env_var_opt("IEX_TOKEN") {
            self.iex.token = Some(SecretString::new(token.into()));
        }
        if let Some(host) = get_env_var_opt("IB_HOST") {
            self.ib.host = host;
        }
        if let Some(port) = parse_env_var("IB_PORT")? {
            self.ib.port = port;
        }
        if let Some(id) = parse_env_var("IB_CLIENT_ID")? {
            self.ib.client_id = id;
        }
        Ok(())
    }

    pub fn exchange_tz(&self) -> Result<Tz, ConfigError> {
        self.exchange_time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::TimeZone(self.exchange_time_zone.clone()))
    }
}

fn secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(|s| SecretString::new(s.into())))
}
