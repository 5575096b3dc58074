use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kabu_core::market::entity::Candle;
use kabu_core::market::error::MarketError;
use kabu_core::market::port::QuoteProvider;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo chart 接口的默认地址
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// 伪装浏览器 User-Agent 以减少被拦截风险
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// # Summary
/// Yahoo Finance 日线行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，客户端自带请求超时。
/// - HTTP 429 映射为 `RateLimited`，其他非成功状态映射为不可重试的 `Request`。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    base_url: String,
}

impl YahooProvider {
    /// # Summary
    /// 创建一个新的 YahooProvider 实例。
    ///
    /// # Logic
    /// 1. 配置请求超时。
    /// 2. 设置伪装浏览器 Header (User-Agent)。
    /// 3. 初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `timeout`: 单次请求超时。
    ///
    /// # Returns
    /// 客户端构建失败时返回 `MarketError::Unknown`。
    pub fn new(timeout: Duration) -> Result<Self, MarketError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// 指向自定义地址 (测试或代理)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    description: String,
}

/// Yahoo API 单个时间序列结果。
#[derive(Deserialize, Debug)]
struct YahooResult {
    // 休市或新上市标的可能没有时间戳
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

/// Yahoo API 原始报价数据
#[derive(Deserialize, Debug)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// # Summary
/// 将 chart 结果展开为日线列表。
///
/// # Logic
/// 1. 按时间戳下标对齐 OHLCV 数组。
/// 2. 缺失收盘价的行直接丢弃；其余缺失字段回退为收盘价或 0。
fn candles_from(result: &YahooResult) -> Result<Vec<Candle>, MarketError> {
    let Some(quote) = result.indicators.quote.first() else {
        return Ok(Vec::new());
    };

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let time = DateTime::<Utc>::from_timestamp(ts, 0)
            .ok_or_else(|| MarketError::Parse(format!("Invalid timestamp: {}", ts)))?;
        let field = |list: &[Option<f64>]| list.get(i).copied().flatten().unwrap_or(close);

        candles.push(Candle {
            time,
            open: field(&quote.open),
            high: field(&quote.high),
            low: field(&quote.low),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }
    Ok(candles)
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取最近交易日的日线。
    ///
    /// # Logic
    /// 1. 以 `range=5d&interval=1d` 请求 chart 接口，覆盖周末与节假日。
    /// 2. 429 返回 `RateLimited`；其他非 2xx 返回 `Request`。
    /// 3. 解析 JSON；`chart.error` 视为请求级失败。
    /// 4. 仅保留最后 `sessions` 条日线。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    /// * `sessions`: 需要的交易日数量。
    ///
    /// # Returns
    /// 成功返回日线列表 (可能为空)。
    async fn recent_sessions(
        &self,
        symbol: &str,
        sessions: usize,
    ) -> Result<Vec<Candle>, MarketError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketError::RateLimited);
        }
        if !status.is_success() {
            return Err(MarketError::Request(format!("HTTP {}", status)));
        }

        let json: YahooResponse = resp
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        if let Some(err) = json.chart.error {
            return Err(MarketError::Request(err.description));
        }

        let Some(result) = json.chart.result.and_then(|mut r| r.pop()) else {
            return Ok(Vec::new());
        };

        let mut candles = candles_from(&result)?;
        let skip = candles.len().saturating_sub(sessions);
        let recent = candles.split_off(skip);
        debug!("Yahoo returned {} sessions for {}", recent.len(), symbol);
        Ok(recent)
    }
}
