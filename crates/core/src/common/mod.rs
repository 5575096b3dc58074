pub mod time;

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// # Summary
/// 标的所属市场分类。
///
/// # Invariants
/// - 序列化形式为小写字符串 (`jp`, `us`, ...)，与持久化文件及聊天命令保持一致。
/// - 反序列化不区分大小写，旧记录中的 `US`、`Jp` 等写法同样可读。
/// - 排序按序列化字符串的字典序进行，保证 `(market, symbol)` 排序与落盘顺序稳定。
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    // 日本股票及指数
    Jp,
    // 美国股票及指数
    Us,
    // 加密货币
    Crypto,
    // 欧洲市场
    Eu,
    // 亚洲其他市场 (港股等)
    Asia,
    // 加拿大
    Ca,
    // 澳大利亚
    Au,
    // 外汇
    Forex,
}

impl Market {
    /// 播报时的市场分组顺序。
    pub const ALL: [Market; 8] = [
        Market::Jp,
        Market::Us,
        Market::Crypto,
        Market::Eu,
        Market::Asia,
        Market::Ca,
        Market::Au,
        Market::Forex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Jp => "jp",
            Market::Us => "us",
            Market::Crypto => "crypto",
            Market::Eu => "eu",
            Market::Asia => "asia",
            Market::Ca => "ca",
            Market::Au => "au",
            Market::Forex => "forex",
        }
    }
}

impl PartialOrd for Market {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Market {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jp" => Ok(Market::Jp),
            "us" => Ok(Market::Us),
            "crypto" => Ok(Market::Crypto),
            "eu" => Ok(Market::Eu),
            "asia" => Ok(Market::Asia),
            "ca" => Ok(Market::Ca),
            "au" => Ok(Market::Au),
            "forex" => Ok(Market::Forex),
            _ => Err(format!("Unknown Market: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for Market {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 被追踪的标的身份 (股票、指数、加密货币对、外汇对)。
///
/// # Invariants
/// - `symbol` 是自然主键，在 InstrumentStore 内唯一。
/// - 创建后不可变，修改需先删除再添加。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Instrument {
    // 行情源识别的代码 (例如: AAPL, 7203.T, BTC-USD)
    pub symbol: String,
    // 展示名称
    pub name: String,
    // 所属市场
    pub market: Market,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, market: Market) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            market,
        }
    }
}

/// # Summary
/// 带有波动告警阈值的监控条目。
///
/// # Invariants
/// - `threshold` 为百分比，`abs(change_percent) >= threshold` 时成为告警候选。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub instrument: Instrument,
    pub threshold: f64,
}

impl WatchEntry {
    pub fn new(instrument: Instrument, threshold: f64) -> Self {
        Self {
            instrument,
            threshold,
        }
    }
}

/// 按 `(market, symbol)` 就地排序。
pub fn sort_instruments(instruments: &mut [Instrument]) {
    instruments.sort_by(|a, b| (a.market, &a.symbol).cmp(&(b.market, &b.symbol)));
}
