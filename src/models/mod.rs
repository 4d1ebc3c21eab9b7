// 数据模型模块 - 定义所有的数据结构

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 默认通知自动消失时间（毫秒）
pub const DEFAULT_NOTIFICATION_TIMEOUT_MS: u64 = 5000;

/// 应用配置（部分更新）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 成员数据源
    pub member_source: Option<MemberSourceConfig>,
    /// 通知默认超时（毫秒）
    pub notification_timeout_ms: Option<u64>,
    /// 配色方案（system/dark/light）
    pub color_scheme: Option<ColorSchemePreference>,
    /// 主题偏好存储文件路径
    pub theme_storage_path: Option<String>,
    /// 日志配置
    pub logger_settings: Option<LoggerSettings>,
}

/// 持久化的应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAppConfig {
    /// 成员数据源
    #[serde(default)]
    pub member_source: MemberSourceConfig,
    /// 通知默认超时（毫秒）
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_ms: u64,
    /// 配色方案
    #[serde(default)]
    pub color_scheme: ColorSchemePreference,
    /// 主题偏好存储文件路径（为空时使用数据目录）
    #[serde(default)]
    pub theme_storage_path: Option<String>,
    /// 日志配置
    #[serde(default)]
    pub logger_settings: LoggerSettings,
}

fn default_notification_timeout() -> u64 {
    DEFAULT_NOTIFICATION_TIMEOUT_MS
}

impl Default for PersistedAppConfig {
    fn default() -> Self {
        Self {
            member_source: MemberSourceConfig::default(),
            notification_timeout_ms: DEFAULT_NOTIFICATION_TIMEOUT_MS,
            color_scheme: ColorSchemePreference::System,
            theme_storage_path: None,
            logger_settings: LoggerSettings::default(),
        }
    }
}

/// 成员数据源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MemberSourceConfig {
    /// 内置常量列表
    #[serde(rename = "builtin")]
    Builtin,
    /// 本地静态 JSON 文件
    #[serde(rename = "static_file")]
    StaticFile {
        /// 文件路径
        path: String,
    },
    /// 远程 JSON
    #[serde(rename = "remote")]
    Remote {
        /// 完整 URL
        url: String,
    },
    /// 本地静态路由（{base_url}/jkt48_members.json）
    #[serde(rename = "static_route")]
    StaticRoute {
        /// 站点根地址
        base_url: String,
    },
}

impl Default for MemberSourceConfig {
    fn default() -> Self {
        MemberSourceConfig::Builtin
    }
}

/// 配色方案偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSchemePreference {
    /// 跟随系统
    #[default]
    System,
    Dark,
    Light,
}

/// 日志设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// 是否把日志推送到事件总线
    pub enable_event_logging: bool,
    /// 日志级别（trace/debug/info/warn/error）
    pub level: String,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            enable_event_logging: false,
            level: "info".to_string(),
        }
    }
}

/// 成员信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub nickname: Vec<String>,
    pub birth_place: String,
    pub birth_date: String,
    pub generation: String,
    pub introduction_phrase: String,
    pub profile_picture_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_details_jkt48: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_details_jkt48: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_formation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fanbase_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// 社交媒体（平台 -> 账号/链接）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media: Option<BTreeMap<String, String>>,
}

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// 通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 唯一ID（由创建时间生成）
    pub id: String,
    /// 通知级别
    #[serde(rename = "type")]
    pub severity: Severity,
    /// 通知内容
    pub message: String,
    /// 自动消失时间（毫秒），0 表示不自动消失
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
}

/// 连接状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    /// 是否已连接
    pub is_connected: bool,
    /// 重连次数
    pub reconnect_attempts: u32,
    /// 最后一次连接成功的时间
    pub last_connected: Option<DateTime<Utc>>,
}

/// 连接状态部分更新
///
/// `last_connected` 区分"未提供"（保留原值）和 `null`（清空）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_attempts: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub last_connected: Option<Option<DateTime<Utc>>>,
}

impl ConnectionStatusUpdate {
    /// 把部分字段合并到当前记录上，返回新记录
    pub fn apply(&self, current: &ConnectionStatus) -> ConnectionStatus {
        let mut next = current.clone();
        if let Some(value) = self.is_connected {
            next.is_connected = value;
        }
        if let Some(value) = self.reconnect_attempts {
            next.reconnect_attempts = value;
        }
        if let Some(value) = self.last_connected {
            next.last_connected = value;
        }
        next
    }
}

// 字段存在即为 Some，null 对应 Some(None)
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
