use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 上涨配色
pub const COLOR_RISE: u32 = 0x00FF00;
/// 下跌配色
pub const COLOR_FALL: u32 = 0xFF0000;
/// 常规播报配色
pub const COLOR_INFO: u32 = 0x0099FF;

/// # Summary
/// 结构化通知负载，字段与 Discord embed 对象一致。
///
/// # Invariants
/// - `timestamp` 以 RFC 3339 格式序列化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: DateTime<Utc>,
}

/// 通知负载中的单个字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            fields: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}
