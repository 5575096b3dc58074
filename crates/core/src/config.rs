use crate::common::{Instrument, Market, WatchEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置加载或校验失败
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub notification: NotificationConfig,
    pub alert: AlertConfig,
    pub quote: QuoteConfig,
    pub store: StoreConfig,
    // 仓库为空时使用的种子标的
    pub stocks: Vec<SeedInstrument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: String,
    // 定时播报间隔 (秒)
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    // 波动告警阈值 (%)
    pub threshold_percent: f64,
    // 同一标的两次告警的最小间隔 (秒)
    pub cooldown_secs: u64,
    // 告警检查间隔 (秒)
    pub check_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub cache_ttl_secs: u64,
    pub max_retries: u32,
    // 单次行情请求超时 (秒)
    pub request_timeout_secs: u64,
    // 每次请求的交易日数量
    pub history_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_file: String,
}

/// 配置文件中的种子标的，`threshold` 缺省时使用全局阈值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedInstrument {
    pub symbol: String,
    pub name: String,
    pub market: Market,
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            interval_secs: 300,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_percent: 5.0,
            cooldown_secs: 1800,
            check_interval_secs: 30,
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            max_retries: 3,
            request_timeout_secs: 10,
            history_sessions: 2,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: "data/stocks.json".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notification: NotificationConfig::default(),
            alert: AlertConfig::default(),
            quote: QuoteConfig::default(),
            store: StoreConfig::default(),
            stocks: default_seed(),
        }
    }
}

fn default_seed() -> Vec<SeedInstrument> {
    [
        ("7203.T", "トヨタ自動車", Market::Jp),
        ("6758.T", "ソニーグループ", Market::Jp),
        ("9984.T", "ソフトバンクグループ", Market::Jp),
        ("^N225", "日経平均", Market::Jp),
        ("^TOPX", "TOPIX", Market::Jp),
        ("AAPL", "Apple", Market::Us),
        ("GOOGL", "Alphabet", Market::Us),
        ("MSFT", "Microsoft", Market::Us),
        ("TSLA", "Tesla", Market::Us),
        ("^GSPC", "S&P 500", Market::Us),
        ("^DJI", "ダウ平均", Market::Us),
        ("BTC-USD", "Bitcoin", Market::Crypto),
    ]
    .into_iter()
    .map(|(symbol, name, market)| SeedInstrument {
        symbol: symbol.to_string(),
        name: name.to_string(),
        market,
        threshold: None,
    })
    .collect()
}

impl AppConfig {
    /// # Summary
    /// 校验配置的完整性。
    ///
    /// # Logic
    /// 1. Webhook URL 不能为空。
    /// 2. 种子标的不能为空。
    /// 3. 各间隔、冷却窗口、TTL、重试次数与阈值必须为正。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification.webhook_url.trim().is_empty() {
            return Err(ConfigError::Invalid("webhook_url is not set".into()));
        }
        if self.stocks.is_empty() {
            return Err(ConfigError::Invalid("no instruments configured".into()));
        }
        if self.notification.interval_secs == 0 || self.alert.check_interval_secs == 0 {
            return Err(ConfigError::Invalid("intervals must be positive".into()));
        }
        if self.alert.cooldown_secs == 0 {
            return Err(ConfigError::Invalid("cooldown_secs must be positive".into()));
        }
        if self.quote.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be positive".into()));
        }
        if self.quote.cache_ttl_secs == 0 || self.quote.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache ttl and request timeout must be positive".into(),
            ));
        }
        if self.quote.history_sessions == 0 {
            return Err(ConfigError::Invalid("history_sessions must be positive".into()));
        }
        if !(self.alert.threshold_percent > 0.0) {
            return Err(ConfigError::Invalid("threshold_percent must be positive".into()));
        }
        Ok(())
    }

    /// 种子标的转换为监控条目
    pub fn seed_watchlist(&self) -> Vec<WatchEntry> {
        self.stocks
            .iter()
            .map(|s| {
                WatchEntry::new(
                    Instrument::new(&s.symbol, &s.name, s.market),
                    s.threshold.unwrap_or(self.alert.threshold_percent),
                )
            })
            .collect()
    }

    /// # Summary
    /// 由持久化仓库的内容推导本轮的监控列表。
    ///
    /// # Logic
    /// 1. 仓库非空时使用仓库中的标的，阈值取全局阈值 (若种子中有同名标的则沿用其阈值)。
    /// 2. 仓库为空时回退到种子列表。
    pub fn watchlist_from(&self, stored: Vec<Instrument>) -> Vec<WatchEntry> {
        if stored.is_empty() {
            return self.seed_watchlist();
        }
        stored
            .into_iter()
            .map(|instrument| {
                let threshold = self
                    .stocks
                    .iter()
                    .find(|s| s.symbol == instrument.symbol)
                    .and_then(|s| s.threshold)
                    .unwrap_or(self.alert.threshold_percent);
                WatchEntry::new(instrument, threshold)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.notification.interval_secs, 300);
        assert_eq!(config.alert.threshold_percent, 5.0);
        assert_eq!(config.alert.cooldown_secs, 1800);
        assert_eq!(config.alert.check_interval_secs, 30);
        assert_eq!(config.quote.cache_ttl_secs, 60);
        assert_eq!(config.quote.max_retries, 3);
        assert_eq!(config.store.data_file, "data/stocks.json");
        assert_eq!(config.stocks.len(), 12);
    }

    #[test]
    fn test_validate_requires_webhook() {
        let mut config = AppConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.notification.webhook_url = "https://discord.com/api/webhooks/1/abc".into();
        assert!(config.validate().is_ok());

        config.alert.cooldown_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.alert.cooldown_secs = 1800;

        config.quote.max_retries = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.quote.max_retries = 3;
        assert!(config.validate().is_ok());

        config.stocks.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_watchlist_prefers_stored_instruments() {
        let mut config = AppConfig::default();
        config.stocks[0].threshold = Some(2.5);
        let toyota = config.stocks[0].symbol.clone();

        let stored = vec![
            Instrument::new(&toyota, "Toyota", Market::Jp),
            Instrument::new("NVDA", "NVIDIA", Market::Us),
        ];
        let watch = config.watchlist_from(stored);
        assert_eq!(watch.len(), 2);
        assert_eq!(watch[0].threshold, 2.5);
        assert_eq!(watch[1].threshold, 5.0);

        assert_eq!(config.watchlist_from(Vec::new()).len(), 12);
    }
}
