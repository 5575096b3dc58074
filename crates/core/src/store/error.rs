use thiserror::Error;

/// # Summary
/// 存储层错误枚举。
///
/// # Invariants
/// - 读取失败不会以此错误上抛 (降级为空列表)，只有写入与初始化会返回错误。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 文件读写失败
    #[error("IO error: {0}")]
    Io(String),
    /// 序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    /// 集合中出现重复代码
    #[error("Duplicate symbol: {0}")]
    Duplicate(String),
    /// 初始化存储失败
    #[error("Initialization error: {0}")]
    InitError(String),
}
