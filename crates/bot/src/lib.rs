//! # kabu-bot
//!
//! 应用服务层：定时播报、波动告警检查、调度循环以及聊天命令处理。

pub mod bot;
pub mod command;
pub mod handler;
pub mod report;
