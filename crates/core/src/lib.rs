//! # kabu-core
//!
//! 行情播报系统的领域核心：实体、错误与端口 (Port) 定义。
//! 所有具体实现 (Yahoo、Webhook、JSON 文件) 都位于各自的适配器 crate 中。

pub mod cache;
pub mod command;
pub mod common;
pub mod config;
pub mod market;
pub mod notify;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod test_utils;
