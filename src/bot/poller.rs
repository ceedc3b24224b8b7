//! 入站消息轮询
//!
//! 通过 `getUpdates` 长轮询接收聊天消息，交给命令处理器并回复到来源会话

use crate::bot::commands::CommandHandler;
use crate::notification::TelegramClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// 长轮询等待时间
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// 轮询失败后的等待时间
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// 消息轮询器
pub struct UpdatePoller {
    /// API客户端
    client: Arc<TelegramClient>,
    /// 命令处理器
    handler: CommandHandler,
    /// 长轮询等待时间
    poll_timeout: Duration,
    /// 下一个待确认的更新ID
    offset: i64,
}

impl UpdatePoller {
    /// 创建新的轮询器
    pub fn new(client: Arc<TelegramClient>, handler: CommandHandler) -> Self {
        Self {
            client,
            handler,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            offset: 0,
        }
    }

    /// 设置长轮询等待时间
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// 拉取并处理一批更新，返回发送的回复数
    pub async fn poll_once(&mut self) -> Result<usize, crate::error::NotificationError> {
        let updates = self
            .client
            .get_updates(self.offset, self.poll_timeout)
            .await?;
        let mut replies = 0;

        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };

            let sender = message
                .from
                .as_ref()
                .and_then(|user| user.username.as_deref())
                .unwrap_or("unknown");
            info!("[{}] {}", sender, text);

            let Some(reply) = self.handler.handle_text(text).await else {
                debug!("忽略非命令消息");
                continue;
            };

            match self.client.send_message(message.chat.id, &reply).await {
                Ok(()) => replies += 1,
                Err(e) => error!("回复命令失败: {}", e),
            }
        }

        Ok(replies)
    }

    /// 持续轮询，直到收到停止信号
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("启动命令轮询");

        loop {
            tokio::select! {
                result = self.poll_once() => {
                    if let Err(e) = result {
                        error!("拉取更新失败: {}", e);
                        tokio::select! {
                            _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                            _ = shutdown_rx.recv() => break,
                        }
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        info!("命令轮询已停止");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SiteRegistry;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_poll_once_handles_commands_and_advances_offset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/botTOKEN/getUpdates")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(
                json!({
                    "ok": true,
                    "result": [
                        {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 5}, "text": "/site_add https://a.example"}},
                        {"update_id": 11, "message": {"message_id": 2, "chat": {"id": 5}, "text": "hello"}},
                        {"update_id": 12, "message": {"message_id": 3, "chat": {"id": 5}, "text": "/unknown"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let reply = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::Json(
                json!({"chat_id": 5, "text": "Site added to monitoring list"}),
            ))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":4}}"#)
            .expect(1)
            .create_async()
            .await;

        let registry = SiteRegistry::new();
        let client = Arc::new(TelegramClient::new(&server.url(), "TOKEN").unwrap());
        let mut poller = UpdatePoller::new(client, CommandHandler::new(registry.clone()))
            .with_poll_timeout(Duration::from_secs(0));

        let replies = poller.poll_once().await.unwrap();

        assert_eq!(replies, 1);
        assert_eq!(poller.offset, 13);
        assert_eq!(registry.len().await, 1);
        reply.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/botTOKEN/getUpdates")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok":true,"result":[]}"#)
            .create_async()
            .await;

        let client = Arc::new(TelegramClient::new(&server.url(), "TOKEN").unwrap());
        let poller = UpdatePoller::new(client, CommandHandler::new(SiteRegistry::new()))
            .with_poll_timeout(Duration::from_secs(0));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(poller.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("轮询未在停止信号后退出")
            .unwrap();
    }
}
