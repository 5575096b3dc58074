use thiserror::Error;

/// # Summary
/// 行情源单次调用的错误枚举。
///
/// # Invariants
/// - `RateLimited` 与 `Request` 决定重试策略的分支，其余变体均按瞬时故障处理。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    // 行情源限流 (HTTP 429)
    #[error("Rate limited by provider")]
    RateLimited,
    // 请求级失败 (非 429 的 HTTP 错误或行情源明确拒绝)，不可重试
    #[error("Request failed: {0}")]
    Request(String),
    // 网络层错误 (连接失败、超时)
    #[error("Network error: {0}")]
    Network(String),
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 未知或未分类的错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// # Summary
/// 一次完整重试序列的终态错误。
///
/// # Invariants
/// - 四个变体都是终态；上层服务将其降级为 "无报价"，不会继续传播。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    // 所有尝试都没有返回任何日线数据
    #[error("No historical data for {0}")]
    EmptyData(String),
    // 限流持续到最后一次尝试
    #[error("Rate limited while fetching {0}")]
    RateLimited(String),
    // 不可重试的请求错误
    #[error("Request failed for {symbol}: {reason}")]
    RequestFailed { symbol: String, reason: String },
    // 其他故障持续到最后一次尝试
    #[error("Unknown failure for {symbol}: {reason}")]
    Unknown { symbol: String, reason: String },
}
