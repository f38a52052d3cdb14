use crate::batch::BatchSize;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_OZON_URL: &str = "https://api-seller.ozon.ru";
pub const DEFAULT_YANDEX_URL: &str = "https://api.partner.market.yandex.ru";

const OZON_STOCK_BATCH: BatchSize = BatchSize::fixed(100);
const OZON_PRICE_BATCH: BatchSize = BatchSize::fixed(1000);
const OZON_RUN_PRICE_BATCH: BatchSize = BatchSize::fixed(900);
const YANDEX_STOCK_BATCH: BatchSize = BatchSize::fixed(2000);
const YANDEX_PRICE_BATCH: BatchSize = BatchSize::fixed(500);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("batch size must be positive, got {0}")]
    BatchSize(usize),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("unable to load config file {path}: {reason}")]
    File { path: String, reason: String },
    #[error("no marketplace configured: set SELLER_TOKEN and/or MARKET_TOKEN")]
    NoMarketplace,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_path: PathBuf,
    pub http: HttpSettings,
    pub dry_run: bool,
    pub ozon: Option<OzonSettings>,
    pub yandex: Option<YandexSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OzonSettings {
    pub base_url: String,
    pub client_id: String,
    pub api_key: String,
    pub ceilings: OzonCeilings,
}

#[derive(Debug, Clone)]
pub struct YandexSettings {
    pub base_url: String,
    pub token: String,
    pub campaigns: Vec<YandexCampaign>,
    pub ceilings: YandexCeilings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexCampaign {
    /// Fulfilment model, `fbs` or `dbs`.
    pub label: &'static str,
    pub campaign_id: String,
    pub warehouse_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OzonCeilings {
    pub stock_batch: BatchSize,
    /// Price ceiling of the standalone upload script (1000). No upload here
    /// uses it; it is held alongside `run_price_batch` until the Ozon limit is
    /// confirmed, and only reported in the startup log.
    pub price_batch: BatchSize,
    /// Price ceiling every sync run submits with.
    pub run_price_batch: BatchSize,
}

impl Default for OzonCeilings {
    fn default() -> Self {
        Self {
            stock_batch: OZON_STOCK_BATCH,
            price_batch: OZON_PRICE_BATCH,
            run_price_batch: OZON_RUN_PRICE_BATCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct YandexCeilings {
    pub stock_batch: BatchSize,
    pub price_batch: BatchSize,
}

impl Default for YandexCeilings {
    fn default() -> Self {
        Self {
            stock_batch: YANDEX_STOCK_BATCH,
            price_batch: YANDEX_PRICE_BATCH,
        }
    }
}

/// Optional YAML overrides, e.g.
///
/// ```yaml
/// ozon:
///   stock_batch: 100
/// yandex:
///   price_batch: 400
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CeilingsFile {
    pub ozon: OzonCeilings,
    pub yandex: YandexCeilings,
}

impl CeilingsFile {
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::File {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        Self::from_yaml_str(&raw).map_err(|err| ConfigError::File {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let file = match var("STOCKSYNC_CONFIG") {
            Some(path) => CeilingsFile::load(&path)?,
            None => CeilingsFile::default(),
        };

        let feed_path = PathBuf::from(require("FEED_PATH")?);

        let http = HttpSettings {
            timeout: Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECS", 15)?),
            connect_timeout: Duration::from_secs(parse_or(&var, "HTTP_CONNECT_TIMEOUT_SECS", 5)?),
        };

        let dry_run = var("SYNC_DRY_RUN").is_some_and(|value| {
            matches!(
                value.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        });

        let ozon = match var("SELLER_TOKEN") {
            Some(api_key) => Some(OzonSettings {
                base_url: base_url(var("OZON_API_URL"), DEFAULT_OZON_URL),
                client_id: require("CLIENT_ID")?,
                api_key,
                ceilings: OzonCeilings {
                    stock_batch: ceiling(&var, "OZON_STOCK_BATCH", file.ozon.stock_batch)?,
                    price_batch: ceiling(&var, "OZON_PRICE_BATCH", file.ozon.price_batch)?,
                    run_price_batch: ceiling(
                        &var,
                        "OZON_RUN_PRICE_BATCH",
                        file.ozon.run_price_batch,
                    )?,
                },
            }),
            None => None,
        };

        let yandex = match var("MARKET_TOKEN") {
            Some(token) => {
                let mut campaigns = Vec::new();
                for (label, id_var, warehouse_var) in [
                    ("fbs", "FBS_ID", "WAREHOUSE_FBS_ID"),
                    ("dbs", "DBS_ID", "WAREHOUSE_DBS_ID"),
                ] {
                    if let Some(campaign_id) = var(id_var) {
                        campaigns.push(YandexCampaign {
                            label,
                            campaign_id,
                            warehouse_id: require(warehouse_var)?,
                        });
                    }
                }
                if campaigns.is_empty() {
                    return Err(ConfigError::Missing("FBS_ID"));
                }
                Some(YandexSettings {
                    base_url: base_url(var("YANDEX_API_URL"), DEFAULT_YANDEX_URL),
                    token,
                    campaigns,
                    ceilings: YandexCeilings {
                        stock_batch: ceiling(&var, "YANDEX_STOCK_BATCH", file.yandex.stock_batch)?,
                        price_batch: ceiling(&var, "YANDEX_PRICE_BATCH", file.yandex.price_batch)?,
                    },
                })
            }
            None => None,
        };

        if ozon.is_none() && yandex.is_none() {
            return Err(ConfigError::NoMarketplace);
        }

        Ok(Self {
            feed_path,
            http,
            dry_run,
            ozon,
            yandex,
        })
    }
}

fn base_url(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn parse_or<V>(var: &V, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}

fn ceiling<V>(var: &V, name: &'static str, fallback: BatchSize) -> Result<BatchSize, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => {
            let size = raw.parse::<usize>().map_err(|err| ConfigError::Invalid {
                name,
                reason: err.to_string(),
            })?;
            BatchSize::new(size)
        }
        None => Ok(fallback),
    }
}
