use crate::notify::entity::Embed;
use crate::notify::error::NotifyError;
use async_trait::async_trait;

/// # Summary
/// 向聊天频道投递结构化通知的接口定义。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持跨任务共享。
/// - 实现不得自行重试。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Summary
    /// 发送一条结构化通知。
    ///
    /// # Arguments
    /// * `embed` - 通知负载。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 失败返回 `Err(NotifyError)`。
    async fn notify(&self, embed: &Embed) -> Result<(), NotifyError>;
}
