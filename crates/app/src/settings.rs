use config::{Config, Environment, File};
use kabu_core::config::{AppConfig, ConfigError};
use std::path::Path;

/// 未指定 `--config` 时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "kabu.toml";

/// 环境变量前缀，例如 `KABU_NOTIFICATION__WEBHOOK_URL`
pub const ENV_PREFIX: &str = "KABU";

/// # Summary
/// 分层加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为最底层。
/// 2. 叠加配置文件：显式指定的路径必须存在，默认路径可缺省。
/// 3. 叠加 `KABU_` 前缀的环境变量，嵌套字段以 `__` 分隔。
///
/// # Arguments
/// * `path`: 命令行指定的配置文件路径。
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults =
        Config::try_from(&AppConfig::default()).map_err(|e| ConfigError::Load(e.to_string()))?;

    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
    };

    Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|settings| settings.try_deserialize::<AppConfig>())
        .map_err(|e| ConfigError::Load(e.to_string()))
}
