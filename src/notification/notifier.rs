//! 告警通知器
//!
//! 扫描注册表，为每个状态不为200的站点发送一条告警

use crate::notification::sender::NotificationSender;
use crate::notification::template::AlertTemplate;
use crate::registry::SiteRegistry;
use std::sync::Arc;
use tracing::{debug, error};

/// 告警通知器
pub struct Notifier {
    /// 通知发送器
    sender: Arc<dyn NotificationSender>,
    /// 告警消息模板
    template: AlertTemplate,
}

impl Notifier {
    /// 创建新的通知器
    pub fn new(sender: Arc<dyn NotificationSender>, template: AlertTemplate) -> Self {
        Self { sender, template }
    }

    /// 发送本轮告警
    ///
    /// 返回成功发送的消息数。发送失败只记录日志。
    pub async fn notify(&self, registry: &SiteRegistry) -> usize {
        // 先取快照再发送，不在持锁期间等待网络
        let unhealthy = registry.unhealthy().await;
        let mut sent = 0;

        for (url, status) in unhealthy {
            let message = match self.template.render(&url, status) {
                Ok(message) => message,
                Err(e) => {
                    error!("渲染告警消息失败 {}: {}", url, e);
                    continue;
                }
            };

            match self.sender.send(&message).await {
                Ok(()) => {
                    debug!("告警已发送: {}", message);
                    sent += 1;
                }
                Err(e) => error!("发送告警失败 {}: {}", url, e),
            }
        }

        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use crate::health::SiteStatus;
    use crate::notification::sender::MemorySender;
    use async_trait::async_trait;

    struct FailingSender;

    #[async_trait]
    impl NotificationSender for FailingSender {
        async fn send(&self, _text: &str) -> Result<(), NotificationError> {
            Err(NotificationError::SendError("channel closed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_one_message_per_unhealthy_site() {
        let registry = SiteRegistry::new();
        registry.add("https://ok.example").await;
        registry.set_status("https://ok.example", SiteStatus::OK).await;
        registry.add("https://down.example").await;
        registry
            .set_status("https://down.example", SiteStatus::from_code(500))
            .await;
        registry.add("https://new.example").await;

        let sender = Arc::new(MemorySender::new());
        let notifier = Notifier::new(sender.clone(), AlertTemplate::default());

        assert_eq!(notifier.notify(&registry).await, 2);

        let messages = sender.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&"CRIT - https://down.example ; status: 500".to_string()));
        assert!(messages.contains(&"CRIT - https://new.example ; status: 0".to_string()));
    }

    #[tokio::test]
    async fn test_repeats_every_pass() {
        let registry = SiteRegistry::new();
        registry.add("https://down.example").await;

        let sender = Arc::new(MemorySender::new());
        let notifier = Notifier::new(sender.clone(), AlertTemplate::default());

        notifier.notify(&registry).await;
        notifier.notify(&registry).await;

        assert_eq!(sender.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_send_failures_are_not_counted() {
        let registry = SiteRegistry::new();
        registry.add("https://down.example").await;

        let notifier = Notifier::new(Arc::new(FailingSender), AlertTemplate::default());
        assert_eq!(notifier.notify(&registry).await, 0);
    }
}
