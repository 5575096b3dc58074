use kabu_core::command::{CommandAction, StockCommand};
use kabu_core::common::{Instrument, Market};
use kabu_core::store::error::StoreError;
use kabu_core::store::port::InstrumentStore;
use tracing::info;

use crate::command::DEFAULT_MARKET;

/// 命令执行结果，用于生成回复消息
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Added(Instrument),
    AlreadyExists(String),
    Removed(String),
    NotFound(String),
    Listed(Vec<Instrument>),
    Cleared(usize),
}

/// # Summary
/// 将已解析的命令作用于标的仓库。
///
/// # Logic
/// - `Add`: 已存在返回 `AlreadyExists`，否则写入并返回 `Added`。
/// - `Remove`: 不存在返回 `NotFound`。
/// - `List`: 返回按 `(market, symbol)` 排序的全部标的。
/// - `Clear`: 返回清空前的数量。
///
/// # Returns
/// 仓库写回失败时返回 `StoreError`。
pub async fn apply(
    store: &dyn InstrumentStore,
    command: &StockCommand,
) -> Result<CommandOutcome, StoreError> {
    match command.action {
        CommandAction::Add => {
            let market: Market = command.market.unwrap_or(DEFAULT_MARKET);
            if store.add(&command.symbol, &command.name, market).await? {
                info!(
                    "User {} added {} ({}) to {}",
                    command.user, command.symbol, command.name, market
                );
                Ok(CommandOutcome::Added(Instrument::new(
                    command.symbol.clone(),
                    command.name.clone(),
                    market,
                )))
            } else {
                Ok(CommandOutcome::AlreadyExists(command.symbol.clone()))
            }
        }
        CommandAction::Remove => {
            if store.remove(&command.symbol).await? {
                info!("User {} removed {}", command.user, command.symbol);
                Ok(CommandOutcome::Removed(command.symbol.clone()))
            } else {
                Ok(CommandOutcome::NotFound(command.symbol.clone()))
            }
        }
        CommandAction::List => Ok(CommandOutcome::Listed(store.load().await)),
        CommandAction::Clear => {
            let cleared = store.clear().await?;
            info!("User {} cleared {} instruments", command.user, cleared);
            Ok(CommandOutcome::Cleared(cleared))
        }
    }
}
