use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use crate::models::{AppConfig, PersistedAppConfig};

/// 默认数据目录
pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Application Support/venti")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("venti")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/venti")
    }
}

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedAppConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("创建配置目录失败: {:?}", parent))?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedAppConfig>(&bytes).unwrap_or_else(|e| {
                    tracing::warn!("配置文件解析失败，使用默认配置: {}", e);
                    PersistedAppConfig::default()
                })
            }
            _ => {
                let default = PersistedAppConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("写入默认配置失败: {:?}", path))?;
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self) -> PersistedAppConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: AppConfig) -> Result<PersistedAppConfig> {
        let mut config = self.data.write().await;

        if let Some(source) = update.member_source {
            config.member_source = source;
        }
        if let Some(timeout) = update.notification_timeout_ms {
            config.notification_timeout_ms = timeout;
        }
        if let Some(scheme) = update.color_scheme {
            config.color_scheme = scheme;
        }
        if let Some(path) = update.theme_storage_path {
            config.theme_storage_path = Some(path);
        }
        if let Some(logger) = update.logger_settings {
            config.logger_settings = logger;
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    /// 主题偏好存储文件路径
    pub async fn theme_storage_path(&self) -> PathBuf {
        match &self.data.read().await.theme_storage_path {
            Some(path) => PathBuf::from(path),
            None => self
                .path
                .parent()
                .map(|dir| dir.join("storage.json"))
                .unwrap_or_else(|| default_data_dir().join("storage.json")),
        }
    }

    async fn save(&self, config: &PersistedAppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("保存配置失败: {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorSchemePreference, LoggerSettings, MemberSourceConfig};

    #[tokio::test]
    async fn test_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("settings.json");

        let manager = SettingsManager::new(path.clone()).await.unwrap();
        assert!(path.exists());
        assert_eq!(manager.get().await, PersistedAppConfig::default());
        assert_eq!(
            manager.theme_storage_path().await,
            dir.path().join("config").join("storage.json")
        );
    }

    #[tokio::test]
    async fn test_update_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let manager = SettingsManager::new(path.clone()).await.unwrap();
        let updated = manager
            .update(AppConfig {
                member_source: Some(MemberSourceConfig::Remote {
                    url: "https://example.com/members.json".to_string(),
                }),
                notification_timeout_ms: Some(1500),
                color_scheme: Some(ColorSchemePreference::Dark),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.notification_timeout_ms, 1500);

        let reloaded = SettingsManager::new(path).await.unwrap();
        let config = reloaded.get().await;
        assert_eq!(config.notification_timeout_ms, 1500);
        assert_eq!(config.color_scheme, ColorSchemePreference::Dark);
        assert_eq!(
            config.member_source,
            MemberSourceConfig::Remote {
                url: "https://example.com/members.json".to_string()
            }
        );
        // 未提供的字段保持不变
        assert_eq!(config.logger_settings, LoggerSettings::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ broken").await.unwrap();

        let manager = SettingsManager::new(path).await.unwrap();
        assert_eq!(manager.get().await, PersistedAppConfig::default());
    }
}
