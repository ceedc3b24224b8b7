//! 消息模板模块
//!
//! 使用Handlebars渲染告警消息

use crate::error::NotificationError;
use crate::health::SiteStatus;
use handlebars::Handlebars;
use serde::Serialize;

/// 默认的告警消息模板
pub const DEFAULT_ALERT_TEMPLATE: &str = "CRIT - {{url}} ; status: {{status}}";

const ALERT_TEMPLATE_NAME: &str = "alert";

/// 模板上下文数据
#[derive(Debug, Clone, Serialize)]
pub struct AlertContext<'a> {
    /// 站点URL
    pub url: &'a str,
    /// 状态码
    pub status: i64,
    /// 状态描述
    pub description: String,
}

impl<'a> AlertContext<'a> {
    /// 由站点和状态构造上下文
    pub fn new(url: &'a str, status: SiteStatus) -> Self {
        Self {
            url,
            status: status.code(),
            description: status.describe(),
        }
    }
}

/// 告警消息模板
pub struct AlertTemplate {
    registry: Handlebars<'static>,
}

impl AlertTemplate {
    /// 编译模板
    ///
    /// # 参数
    /// * `template` - Handlebars模板字符串，可用变量: `url`, `status`, `description`
    ///
    /// # 返回
    /// * `Result<Self, NotificationError>` - 模板语法错误时返回错误
    pub fn new(template: &str) -> Result<Self, NotificationError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // 消息是纯文本，不做HTML转义
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(ALERT_TEMPLATE_NAME, template)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;

        Ok(Self { registry })
    }

    /// 渲染一条告警消息
    pub fn render(&self, url: &str, status: SiteStatus) -> Result<String, NotificationError> {
        self.registry
            .render(ALERT_TEMPLATE_NAME, &AlertContext::new(url, status))
            .map_err(|e| NotificationError::TemplateError(e.to_string()))
    }
}

impl Default for AlertTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TEMPLATE).expect("内置告警模板必须能够编译")
    }
}
