use kabu_core::command::{CommandAction, StockCommand};
use kabu_core::common::Market;
use regex::{Regex, RegexBuilder};

/// 未指定市场时的默认市场
pub const DEFAULT_MARKET: Market = Market::Jp;

const MARKETS: &str = "jp|us|crypto|eu|asia|ca|au|forex";

/// # Summary
/// 聊天命令解析器，将原始文本行转换为结构化的 `StockCommand`。
///
/// # Invariants
/// - 所有模式不区分大小写，代码统一转为大写。
/// - 无法识别的文本返回 None，而不是错误。
pub struct CommandParser {
    add: Regex,
    remove: Regex,
    list: Regex,
    clear: Regex,
}

fn pattern(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}

impl CommandParser {
    /// # Summary
    /// 编译命令模式。
    ///
    /// # Logic
    /// 支持以下形式 (分隔符可为 `-`、`_` 或省略)：
    /// - `!add-stock SYMBOL [NAME] [MARKET]`
    /// - `!remove-stock SYMBOL`
    /// - `!list-stocks` / `!list-stock`
    /// - `!clear-stocks` / `!clear-stock`
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            add: pattern(&format!(
                r"^!add[-_]?stock\s+([A-Z0-9.^=-]+)(?:\s+(.+?))?(?:\s+({}))?$",
                MARKETS
            ))?,
            remove: pattern(r"^!remove[-_]?stock\s+([A-Z0-9.^=-]+)$")?,
            list: pattern(r"^!list[-_]?stocks?$")?,
            clear: pattern(r"^!clear[-_]?stocks?$")?,
        })
    }

    /// # Summary
    /// 解析一行聊天文本。
    ///
    /// # Logic
    /// 1. 去除首尾空白后依次匹配 add、remove、list、clear。
    /// 2. add 时名称缺省为代码，市场缺省为 `jp`。
    /// 3. 只给出一个词且该词是市场名时，视为市场而非名称。
    ///
    /// # Arguments
    /// * `message`: 原始文本。
    /// * `user`: 发起命令的用户名。
    pub fn parse(&self, message: &str, user: &str) -> Option<StockCommand> {
        let message = message.trim();

        if let Some(caps) = self.add.captures(message) {
            let symbol = caps.get(1)?.as_str().to_uppercase();
            let mut name = caps.get(2).map(|m| m.as_str().trim().to_string());
            let mut market = caps.get(3).and_then(|m| m.as_str().parse::<Market>().ok());

            if market.is_none()
                && let Some(as_market) = name.as_deref().and_then(|n| n.parse::<Market>().ok())
            {
                market = Some(as_market);
                name = None;
            }

            return Some(StockCommand {
                action: CommandAction::Add,
                name: name.unwrap_or_else(|| symbol.clone()),
                symbol,
                market: Some(market.unwrap_or(DEFAULT_MARKET)),
                user: user.to_string(),
            });
        }

        if let Some(caps) = self.remove.captures(message) {
            return Some(StockCommand {
                action: CommandAction::Remove,
                symbol: caps.get(1)?.as_str().to_uppercase(),
                name: String::new(),
                market: None,
                user: user.to_string(),
            });
        }

        let action = if self.list.is_match(message) {
            CommandAction::List
        } else if self.clear.is_match(message) {
            CommandAction::Clear
        } else {
            return None;
        };

        Some(StockCommand {
            action,
            symbol: String::new(),
            name: String::new(),
            market: None,
            user: user.to_string(),
        })
    }
}
