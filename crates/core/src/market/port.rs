use crate::market::entity::Candle;
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 外部行情数据提供者接口 (原始数据源)。
///
/// # Invariants
/// - 实现者本身不做重试，重试与退避由上层的 QuoteFetcher 统一负责。
/// - 返回的日线按时间升序排列。
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// # Summary
    /// 获取最近若干个交易日的日线数据。
    ///
    /// # Logic
    /// 1. 向数据源请求近期日线历史。
    /// 2. 丢弃缺失收盘价的行，仅保留最后 `sessions` 条。
    ///
    /// # Arguments
    /// * `symbol`: 行情源识别的证券代码。
    /// * `sessions`: 需要的交易日数量。
    ///
    /// # Returns
    /// 成功返回日线列表 (可能为空)，失败返回 MarketError。
    async fn recent_sessions(&self, symbol: &str, sessions: usize)
    -> Result<Vec<Candle>, MarketError>;
}
