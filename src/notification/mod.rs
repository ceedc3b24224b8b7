//! 通知模块
//!
//! 提供Telegram通知、告警模板和告警通知器

pub mod notifier;
pub mod sender;
pub mod telegram;
pub mod template;

// 重新导出主要类型
pub use notifier::Notifier;
pub use sender::{MemorySender, NoOpSender, NotificationSender};
pub use telegram::{TelegramClient, TelegramSender};
pub use template::AlertTemplate;
