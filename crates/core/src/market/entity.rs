use crate::common::{Instrument, Market};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 单个交易日的日线数据，由行情源返回。
///
/// # Invariants
/// - 由行情源按时间升序返回，最后一条为最近交易日。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // 交易日开始时间
    pub time: DateTime<Utc>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量
    pub volume: u64,
}

/// # Summary
/// 某一时刻的价格观测值，附带与上一交易日相比的涨跌。
///
/// # Invariants
/// - 构造后不可变，刷新时整体替换。
/// - 上一交易日收盘价 `<= 0` 时 `change_percent` 恒为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub market: Market,
    // 最新收盘价
    pub price: f64,
    // 涨跌额
    pub change: f64,
    // 涨跌幅 (%)
    pub change_percent: f64,
    // 最新交易日成交量
    pub volume: i64,
    // 观测时间
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    /// # Summary
    /// 由最近的日线序列构造报价。
    ///
    /// # Logic
    /// 1. `latest` 取最后一条，`previous` 取倒数第二条；只有一条时 `previous = latest`，涨跌为 0。
    /// 2. `change = latest.close - previous.close`。
    /// 3. `previous.close > 0` 时计算百分比，否则为 0。
    ///
    /// # Arguments
    /// * `instrument`: 报价对应的标的。
    /// * `candles`: 按时间升序的日线数据。
    /// * `observed_at`: 观测时间。
    ///
    /// # Returns
    /// 序列为空时返回 None。
    pub fn from_candles(
        instrument: &Instrument,
        candles: &[Candle],
        observed_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (latest, rest) = candles.split_last()?;
        let previous = rest.last().unwrap_or(latest);

        let change = latest.close - previous.close;
        let change_percent = if previous.close > 0.0 {
            change / previous.close * 100.0
        } else {
            0.0
        };

        Some(Self {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            market: instrument.market,
            price: latest.close,
            change,
            change_percent,
            volume: i64::try_from(latest.volume).unwrap_or(i64::MAX),
            observed_at,
        })
    }
}
