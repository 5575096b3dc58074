use async_trait::async_trait;
use kabu_core::common::{Instrument, Market, sort_instruments};
use kabu_core::store::error::StoreError;
use kabu_core::store::port::InstrumentStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 落盘格式：`{"stocks": [{"symbol", "name", "market"}, ...]}`
#[derive(Debug, Deserialize)]
struct StoreFile {
    #[serde(default)]
    stocks: Vec<serde_json::Value>,
}

/// InstrumentStore 的 JSON 文件实现。
///
/// # Summary
/// 以单个 JSON 文件保存被追踪的标的列表，每次操作完整读取，每次变更完整写回。
///
/// # Invariants
/// * 进程内所有 读取-修改-写回 周期都在同一把 `Mutex` 下串行执行。
/// * 假设只有一个进程写入该文件；跨进程并发写入不受保护。
/// * 写入先落到临时文件再原子重命名，读者不会看到半份记录。
/// * 文件缺失或损坏时读取结果为空列表，下一次成功写入即自愈。
/// * 单行无法解析时只丢弃该行，其余标的照常读取。
pub struct JsonInstrumentStore {
    path: PathBuf,
    // 串行化 读取-修改-写回 周期
    lock: Mutex<()>,
}

impl JsonInstrumentStore {
    /// 创建存储并确保数据文件存在。
    ///
    /// # Logic
    /// 1. 创建数据文件所在目录。
    /// 2. 文件不存在时写入空列表。
    ///
    /// # Arguments
    /// * `path` - 数据文件路径。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 目录或文件无法创建时返回 `InitError`。
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::InitError(e.to_string()))?;
        }

        if !path.exists() {
            let body = encode(&[]).map_err(|e| StoreError::InitError(e.to_string()))?;
            fs::write(&path, body).map_err(|e| StoreError::InitError(e.to_string()))?;
            info!("Created empty instrument store at {}", path.display());
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Summary
    /// 整体替换存储内容。
    ///
    /// # Logic
    /// 1. 拒绝包含重复代码的集合。
    /// 2. 按 `(market, symbol)` 排序后写回。
    pub async fn save(&self, instruments: &[Instrument]) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        if let Some(dup) = instruments.iter().find(|i| !seen.insert(i.symbol.as_str())) {
            return Err(StoreError::Duplicate(dup.symbol.clone()));
        }

        let _guard = self.lock.lock().await;
        let mut stocks = instruments.to_vec();
        sort_instruments(&mut stocks);
        self.write(&stocks).await
    }

    /// 读取文件；缺失或整体损坏时返回空列表，无法识别的单行被跳过
    async fn read(&self) -> Vec<Instrument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Instrument store unreadable ({}): {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_slice::<StoreFile>(&bytes) {
            Ok(file) => file
                .stocks
                .into_iter()
                .filter_map(|row| match Instrument::deserialize(&row) {
                    Ok(instrument) => Some(instrument),
                    Err(e) => {
                        warn!("Skipping unreadable store row {}: {}", row, e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!("Instrument store corrupt ({}): {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// 先写临时文件再重命名
    async fn write(&self, stocks: &[Instrument]) -> Result<(), StoreError> {
        let body = encode(stocks)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

fn encode(stocks: &[Instrument]) -> Result<Vec<u8>, StoreError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        stocks: &'a [Instrument],
    }
    serde_json::to_vec_pretty(&Borrowed { stocks }).map_err(|e| StoreError::Serialize(e.to_string()))
}

#[async_trait]
impl InstrumentStore for JsonInstrumentStore {
    async fn load(&self) -> Vec<Instrument> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// # Summary
    /// 添加标的。
    ///
    /// # Logic
    /// 1. 持锁读取当前列表。
    /// 2. 代码已存在则返回 false。
    /// 3. 追加后按 `(market, symbol)` 排序并写回。
    async fn add(&self, symbol: &str, name: &str, market: Market) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut stocks = self.read().await;
        if stocks.iter().any(|s| s.symbol == symbol) {
            return Ok(false);
        }

        stocks.push(Instrument::new(symbol, name, market));
        sort_instruments(&mut stocks);
        self.write(&stocks).await?;
        info!("Added {} ({}) to {}", symbol, market, self.path.display());
        Ok(true)
    }

    async fn remove(&self, symbol: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut stocks = self.read().await;
        let before = stocks.len();
        stocks.retain(|s| s.symbol != symbol);
        if stocks.len() == before {
            return Ok(false);
        }

        self.write(&stocks).await?;
        info!("Removed {} from {}", symbol, self.path.display());
        Ok(true)
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let count = self.read().await.len();
        self.write(&[]).await?;
        info!("Cleared {} instruments from {}", count, self.path.display());
        Ok(count)
    }
}
