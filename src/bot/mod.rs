//! 聊天命令接口
//!
//! 提供命令解析、命令处理和Telegram入站消息轮询

pub mod commands;
pub mod poller;

// 重新导出主要类型
pub use commands::{BotCommand, CommandHandler};
pub use poller::UpdatePoller;
