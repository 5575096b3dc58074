use thiserror::Error;

/// # Summary
/// 通知服务错误枚举。
///
/// # Invariants
/// - 通知失败只记录日志，不做重试 (至多一次投递)。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 网络连接或传输错误
    #[error("Network error: {0}")]
    Network(String),

    /// 配置错误 (如缺少 Webhook URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 推送平台返回非成功状态
    #[error("Platform error: {0}")]
    Platform(String),
}
