//! 聊天命令处理
//!
//! 解析 `/command [argument]` 形式的消息，直接读写站点注册表

use crate::registry::SiteRegistry;
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

/// 缺少URL参数时的回复
pub const URL_REQUIRED_REPLY: &str = "URL is required";

/// 添加成功的回复
pub const SITE_ADDED_REPLY: &str = "Site added to monitoring list";

/// 删除成功的回复
pub const SITE_DELETED_REPLY: &str = "Site deleted from monitoring list";

/// 帮助信息
pub const HELP_TEXT: &str = "A simple site availability monitor. It polls every site in the list \
and expects HTTP 200; any other response or a connection error triggers a notification in this chat.\n\
Available commands:\n\
/site_list - show monitored sites and their statuses (see below)\n\
/site_add [url] - add url to the monitoring list\n\
/site_del [url] - remove url from the monitoring list\n\
/help - show this message\n\
\n\
Site statuses:\n\
0 - never checked (waiting for the first check)\n\
1 - connection error\n\
2 - certificate is expiring\n\
200 - OK\n\
any other HTTP code is treated as unhealthy";

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$")
        .expect("命令正则表达式无效")
});

/// 聊天命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// 列出站点
    SiteList,
    /// 添加站点
    SiteAdd(String),
    /// 删除站点
    SiteDel(String),
    /// 帮助
    Help,
    /// 未识别的命令
    Unknown(String),
}

impl BotCommand {
    /// 由命令名和参数构造
    pub fn from_parts(name: &str, argument: &str) -> Self {
        let argument = argument.trim().to_string();
        match name {
            "site_list" => BotCommand::SiteList,
            "site_add" => BotCommand::SiteAdd(argument),
            "site_del" => BotCommand::SiteDel(argument),
            "help" => BotCommand::Help,
            other => BotCommand::Unknown(other.to_string()),
        }
    }
}

/// 把消息文本拆分为命令名和参数，非命令消息返回None
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let captures = COMMAND_RE.captures(text.trim())?;
    let name = captures.get(1)?.as_str();
    let argument = captures.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((name, argument))
}

/// 命令处理器
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// 站点注册表
    registry: SiteRegistry,
}

impl CommandHandler {
    /// 创建新的命令处理器
    pub fn new(registry: SiteRegistry) -> Self {
        Self { registry }
    }

    /// 处理一条命令，返回回复文本；未识别的命令不回复
    pub async fn handle(&self, name: &str, argument: &str) -> Option<String> {
        match BotCommand::from_parts(name, argument) {
            BotCommand::SiteList => Some(self.site_list().await),
            BotCommand::SiteAdd(url) if url.is_empty() => Some(URL_REQUIRED_REPLY.to_string()),
            BotCommand::SiteAdd(url) => {
                self.registry.add(&url).await;
                info!("添加监控站点: {}", url);
                Some(SITE_ADDED_REPLY.to_string())
            }
            BotCommand::SiteDel(url) if url.is_empty() => Some(URL_REQUIRED_REPLY.to_string()),
            BotCommand::SiteDel(url) => {
                if self.registry.remove(&url).await {
                    info!("移除监控站点: {}", url);
                }
                Some(SITE_DELETED_REPLY.to_string())
            }
            BotCommand::Help => Some(HELP_TEXT.to_string()),
            BotCommand::Unknown(_) => None,
        }
    }

    /// 处理一条原始消息文本
    pub async fn handle_text(&self, text: &str) -> Option<String> {
        let (name, argument) = split_command(text)?;
        self.handle(name, argument).await
    }

    async fn site_list(&self) -> String {
        let sites = self.registry.list().await;
        serde_json::to_string(&sites).unwrap_or_else(|e| format!("failed to encode site list: {e}"))
    }
}
