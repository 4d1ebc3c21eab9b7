// 本地键值存储 - 浏览器 localStorage 的桌面等价物
//
// JsonFileStorage 把所有键值保存在一个 JSON 对象文件里，每次写入都整体落盘

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};

use super::KeyValueStorage;

/// 基于 JSON 文件的键值存储
pub struct JsonFileStorage {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// 打开（或创建）存储文件
    ///
    /// 文件损坏时按空存储处理
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建存储目录失败: {:?}", parent))?;
        }

        let data = match std::fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<BTreeMap<String, String>>(&bytes).unwrap_or_else(|e| {
                    tracing::warn!("本地存储文件损坏，按空存储处理: {}", e);
                    BTreeMap::new()
                })
            }
            _ => BTreeMap::new(),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow!("本地存储锁已损坏"))?;
        Ok(data.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("本地存储锁已损坏"))?;
        data.insert(key.to_string(), value.to_string());

        let json = serde_json::to_string_pretty(&*data)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("写入本地存储失败: {:?}", self.path))?;
        Ok(())
    }
}

/// 纯内存键值存储
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置键值
    pub fn with_item(key: &str, value: &str) -> Self {
        let mut data = BTreeMap::new();
        data.insert(key.to_string(), value.to_string());
        Self {
            data: RwLock::new(data),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow!("内存存储锁已损坏"))?;
        Ok(data.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow!("内存存储锁已损坏"))?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
