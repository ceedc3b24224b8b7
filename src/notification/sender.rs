//! 通知发送器模块
//!
//! 定义通知发送的trait和基础实现

use crate::error::NotificationError;
use async_trait::async_trait;
use std::sync::Mutex;

/// 通知发送器trait
///
/// 单向发送一条文本消息到固定的目标频道
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 发送文本消息
    ///
    /// # 参数
    /// * `text` - 消息内容
    ///
    /// # 返回
    /// * `Result<(), NotificationError>` - 发送结果
    async fn send(&self, text: &str) -> Result<(), NotificationError>;
}

/// 空的通知发送器实现（用于禁用通知）
pub struct NoOpSender;

#[async_trait]
impl NotificationSender for NoOpSender {
    async fn send(&self, _text: &str) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// 在内存中记录消息的发送器，用于测试和本地检查
#[derive(Debug, Default)]
pub struct MemorySender {
    messages: Mutex<Vec<String>>,
}

impl MemorySender {
    /// 创建新的内存发送器
    pub fn new() -> Self {
        Self::default()
    }

    /// 已发送的消息
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSender for MemorySender {
    async fn send(&self, text: &str) -> Result<(), NotificationError> {
        self.messages
            .lock()
            .map_err(|e| NotificationError::SendError(e.to_string()))?
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sender_records_messages() {
        let sender = MemorySender::new();
        sender.send("first").await.unwrap();
        sender.send("second").await.unwrap();

        assert_eq!(sender.messages(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_noop_sender_always_succeeds() {
        assert!(NoOpSender.send("ignored").await.is_ok());
    }
}
