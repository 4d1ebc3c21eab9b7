// 成员数据源 - 内置常量、本地静态文件、远程 JSON、本地静态路由
//
// 四种数据源输出同样的形状：按顺序排列的 Member 列表

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::models::{Member, MemberSourceConfig};

/// 远程数据地址
pub const REMOTE_MEMBERS_URL: &str = "https://venti.safatanc.com/jkt48_members.json";

/// 静态资源路由
pub const STATIC_MEMBERS_ROUTE: &str = "/jkt48_members.json";

/// 内置数据集
const BUILTIN_MEMBERS_JSON: &str = include_str!("../../data/jkt48_members.json");

/// 成员数据源接口
#[async_trait]
pub trait MemberSource: Send + Sync {
    /// 数据源名称（用于日志和事件）
    fn name(&self) -> String;

    /// 加载全部成员
    async fn load(&self) -> Result<Vec<Member>>;
}

/// 按ID查找成员，线性扫描；找不到返回 None
pub fn find_member<'a>(members: &'a [Member], id: &str) -> Option<&'a Member> {
    members.iter().find(|member| member.id == id)
}

/// 内置常量列表
#[derive(Debug, Clone, Default)]
pub struct BuiltinMembers;

impl BuiltinMembers {
    pub fn members() -> Result<Vec<Member>> {
        serde_json::from_str(BUILTIN_MEMBERS_JSON).context("内置成员数据解析失败")
    }
}

#[async_trait]
impl MemberSource for BuiltinMembers {
    fn name(&self) -> String {
        "builtin".to_string()
    }

    async fn load(&self) -> Result<Vec<Member>> {
        Self::members()
    }
}

/// 本地静态 JSON 文件
#[derive(Debug, Clone)]
pub struct StaticFileMembers {
    path: PathBuf,
}

impl StaticFileMembers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MemberSource for StaticFileMembers {
    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn load(&self) -> Result<Vec<Member>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("读取成员文件失败: {:?}", self.path))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("成员文件格式错误: {:?}", self.path))
    }
}

/// 通过 HTTP 获取的 JSON（远程地址或本地静态路由）
#[derive(Clone)]
pub struct HttpMembers {
    url: String,
    client: Client,
}

impl HttpMembers {
    /// 指定完整 URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// 固定的远程地址
    pub fn remote() -> Result<Self> {
        Self::new(REMOTE_MEMBERS_URL)
    }

    /// 本地站点的静态路由
    pub fn static_route(base_url: &str) -> Result<Self> {
        Self::new(format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            STATIC_MEMBERS_ROUTE
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MemberSource for HttpMembers {
    fn name(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> Result<Vec<Member>> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("获取成员数据失败 ({}): {}", status, error_text));
        }

        let members: Vec<Member> = response.json().await?;
        Ok(members)
    }
}

/// 根据配置创建数据源
pub fn from_config(config: &MemberSourceConfig) -> Result<Arc<dyn MemberSource>> {
    let source: Arc<dyn MemberSource> = match config {
        MemberSourceConfig::Builtin => Arc::new(BuiltinMembers),
        MemberSourceConfig::StaticFile { path } => Arc::new(StaticFileMembers::new(path)),
        MemberSourceConfig::Remote { url } => Arc::new(HttpMembers::new(url.clone())?),
        MemberSourceConfig::StaticRoute { base_url } => {
            Arc::new(HttpMembers::static_route(base_url)?)
        }
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn member(id: &str) -> Member {
        Member {
            id: id.to_string(),
            name: format!("Member {}", id),
            full_name: format!("Member {} Lengkap", id),
            nickname: vec![],
            birth_place: "Jakarta, Indonesia".to_string(),
            birth_date: "1 Januari 2005".to_string(),
            generation: "1".to_string(),
            introduction_phrase: "Halo".to_string(),
            profile_picture_url: String::new(),
            join_details_jkt48: None,
            promoted_details_jkt48: None,
            previous_formation: None,
            sub_unit: None,
            fanbase_name: None,
            reference: None,
            social_media: None,
        }
    }

    /// 只应答一次的 HTTP 服务
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_find_member() {
        let members = vec![member("a"), member("b"), member("c")];
        assert_eq!(find_member(&members, "b").map(|m| m.id.as_str()), Some("b"));
        assert!(find_member(&members, "z").is_none());
        assert!(find_member(&[], "a").is_none());
    }

    #[tokio::test]
    async fn test_builtin_members_parse() {
        let members = BuiltinMembers.load().await.unwrap();
        assert!(!members.is_empty());
        assert!(members.iter().all(|m| !m.id.is_empty()));
    }

    #[tokio::test]
    async fn test_static_file_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jkt48_members.json");
        std::fs::write(
            &path,
            serde_json::to_string(&vec![member("a"), member("b")]).unwrap(),
        )
        .unwrap();

        let members = StaticFileMembers::new(&path).load().await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].id, "b");
    }

    #[tokio::test]
    async fn test_static_file_missing() {
        let result = StaticFileMembers::new("/nonexistent/jkt48_members.json")
            .load()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_static_route() {
        let body = serde_json::to_string(&vec![member("x")]).unwrap();
        let base = serve_once("HTTP/1.1 200 OK", body).await;

        let source = HttpMembers::static_route(&format!("{}/", base)).unwrap();
        assert_eq!(source.url(), format!("{}/jkt48_members.json", base));

        let members = source.load().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, "x");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let base = serve_once("HTTP/1.1 404 Not Found", "missing".to_string()).await;
        let source = HttpMembers::static_route(&base).unwrap();
        assert!(source.load().await.is_err());
    }

    #[test]
    fn test_remote_url_is_fixed() {
        assert_eq!(HttpMembers::remote().unwrap().url(), REMOTE_MEMBERS_URL);
    }

    #[test]
    fn test_from_config() {
        let source = from_config(&MemberSourceConfig::StaticFile {
            path: "static/jkt48_members.json".to_string(),
        })
        .unwrap();
        assert_eq!(source.name(), "file:static/jkt48_members.json");
        assert_eq!(from_config(&MemberSourceConfig::Builtin).unwrap().name(), "builtin");
    }
}
