use crate::common::Market;
use serde::{Deserialize, Serialize};

/// # Summary
/// 聊天命令的动作类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Add,
    Remove,
    List,
    Clear,
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandAction::Add => write!(f, "add"),
            CommandAction::Remove => write!(f, "remove"),
            CommandAction::List => write!(f, "list"),
            CommandAction::Clear => write!(f, "clear"),
        }
    }
}

/// # Summary
/// 从聊天文本解析出的结构化标的管理命令。
///
/// # Invariants
/// - `Add` 时 `symbol`、`name`、`market` 均有值。
/// - `Remove` 时仅 `symbol` 有值；`List`、`Clear` 时 `symbol` 为空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCommand {
    pub action: CommandAction,
    pub symbol: String,
    pub name: String,
    pub market: Option<Market>,
    // 发起命令的用户名
    pub user: String,
}
