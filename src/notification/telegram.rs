//! Telegram通知发送器模块
//!
//! 封装 Telegram Bot API 的 `getMe`、`sendMessage` 和 `getUpdates`

use crate::error::NotificationError;
use crate::notification::sender::NotificationSender;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// 默认 Bot API 地址
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Bot API 通用响应
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// 机器人账号信息
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    /// 用户ID
    pub id: i64,
    /// 用户名
    pub username: Option<String>,
}

/// 会话
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// 会话ID
    pub id: i64,
}

/// 消息
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// 发送者
    pub from: Option<BotUser>,
    /// 所在会话
    pub chat: Chat,
    /// 文本内容
    pub text: Option<String>,
}

/// 入站更新
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// 更新ID
    pub update_id: i64,
    /// 消息（非消息类更新为空）
    pub message: Option<Message>,
}

/// Telegram Bot API 客户端
#[derive(Debug, Clone)]
pub struct TelegramClient {
    /// HTTP客户端
    client: Client,
    /// API地址
    api_url: String,
    /// 机器人令牌
    token: String,
}

impl TelegramClient {
    /// 创建新的客户端
    ///
    /// # 参数
    /// * `api_url` - Bot API 地址
    /// * `token` - 机器人令牌
    pub fn new(api_url: &str, token: &str) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// 解析 Bot API 响应，令牌不会出现在错误信息中
    async fn parse_response<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, NotificationError> {
        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|e| {
            NotificationError::SendError(format!("{} 响应解析失败 ({}): {}", method, status, e))
        })?;

        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(NotificationError::SendError(format!(
                "{} 调用失败 ({}): {}",
                method,
                status,
                body.description.unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }

    /// 获取机器人账号信息
    pub async fn get_me(&self) -> Result<BotUser, NotificationError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| NotificationError::SendError(e.without_url().to_string()))?;

        Self::parse_response("getMe", response).await
    }

    /// 发送文本消息到指定会话
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), NotificationError> {
        debug!("发送Telegram消息到会话: {}", chat_id);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| NotificationError::SendError(e.without_url().to_string()))?;

        Self::parse_response::<serde_json::Value>("sendMessage", response)
            .await
            .map(|_| ())
    }

    /// 长轮询入站更新
    ///
    /// # 参数
    /// * `offset` - 首个未确认的更新ID
    /// * `poll_timeout` - 服务端等待时间
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, NotificationError> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", poll_timeout.as_secs().to_string()),
            ])
            .timeout(poll_timeout + Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| NotificationError::SendError(e.without_url().to_string()))?;

        Self::parse_response("getUpdates", response).await
    }
}

/// Telegram通知发送器，固定发往配置的会话
pub struct TelegramSender {
    /// API客户端
    client: Arc<TelegramClient>,
    /// 目标会话ID
    chat_id: i64,
}

impl TelegramSender {
    /// 创建新的发送器
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, text: &str) -> Result<(), NotificationError> {
        self.client
            .send_message(self.chat_id, text)
            .await
            .inspect_err(|e| error!("Telegram消息发送失败: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_send_message_posts_chat_and_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": 42,
                "text": "CRIT - https://a.example ; status: 1"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .create_async()
            .await;

        let client = Arc::new(TelegramClient::new(&server.url(), "TOKEN").unwrap());
        let sender = TelegramSender::new(client, 42);
        sender
            .send("CRIT - https://a.example ; status: 1")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&server.url(), "TOKEN").unwrap();
        let err = client.send_message(1, "hi").await.unwrap_err();

        assert!(err.to_string().contains("chat not found"));
        assert!(!err.to_string().contains("TOKEN"));
    }

    #[tokio::test]
    async fn test_get_updates_parses_messages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/botTOKEN/getUpdates")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "7".into()),
                Matcher::UrlEncoded("timeout".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"ok":true,"result":[
                    {"update_id":7,"message":{"message_id":3,"from":{"id":5,"username":"ops"},"chat":{"id":99},"text":"/site_list"}},
                    {"update_id":8}
                ]}"#,
            )
            .create_async()
            .await;

        let client = TelegramClient::new(&server.url(), "TOKEN").unwrap();
        let updates = client.get_updates(7, Duration::from_secs(0)).await.unwrap();

        assert_eq!(updates.len(), 2);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 99);
        assert_eq!(message.text.as_deref(), Some("/site_list"));
        assert!(updates[1].message.is_none());
    }

    #[tokio::test]
    async fn test_get_me() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/botTOKEN/getMe")
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"id":1,"is_bot":true,"username":"vitals_bot"}}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&server.url(), "TOKEN").unwrap();
        let me = client.get_me().await.unwrap();
        assert_eq!(me.username.as_deref(), Some("vitals_bot"));
    }
}
