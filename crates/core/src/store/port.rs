use super::error::StoreError;
use crate::common::{Instrument, Market};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// # Summary
/// 被追踪标的列表的持久化接口。
///
/// # Invariants
/// - `symbol` 在集合内唯一。
/// - 每次变更后集合按 `(market, symbol)` 排序并整体写回。
/// - 每个操作都是对整份记录的 读取-修改-写回，实现者必须串行化该周期。
#[async_trait]
pub trait InstrumentStore: Send + Sync {
    /// # Summary
    /// 读取全部标的。
    ///
    /// # Logic
    /// 1. 完整读取持久化记录。
    /// 2. 记录缺失或损坏时返回空列表。
    async fn load(&self) -> Vec<Instrument>;

    /// # Summary
    /// 添加标的。
    ///
    /// # Logic
    /// 1. 若 `symbol` 已存在返回 `Ok(false)`。
    /// 2. 否则追加、重新排序、写回并返回 `Ok(true)`。
    ///
    /// # Returns
    /// 写回失败时返回 `StoreError`。
    async fn add(&self, symbol: &str, name: &str, market: Market) -> Result<bool, StoreError>;

    /// # Summary
    /// 删除标的，`symbol` 不存在时返回 `Ok(false)`。
    async fn remove(&self, symbol: &str) -> Result<bool, StoreError>;

    /// # Summary
    /// 清空全部标的，返回清空前的数量。
    async fn clear(&self) -> Result<usize, StoreError>;

    /// 按代码查找标的
    async fn get(&self, symbol: &str) -> Option<Instrument> {
        self.load().await.into_iter().find(|i| i.symbol == symbol)
    }

    async fn exists(&self, symbol: &str) -> bool {
        self.get(symbol).await.is_some()
    }

    /// 获取指定市场的标的
    async fn by_market(&self, market: Market) -> Vec<Instrument> {
        self.load()
            .await
            .into_iter()
            .filter(|i| i.market == market)
            .collect()
    }

    async fn count(&self) -> usize {
        self.load().await.len()
    }

    /// 统计各市场的标的数量
    async fn count_by_market(&self) -> BTreeMap<Market, usize> {
        let mut summary = BTreeMap::new();
        for instrument in self.load().await {
            *summary.entry(instrument.market).or_insert(0) += 1;
        }
        summary
    }
}
