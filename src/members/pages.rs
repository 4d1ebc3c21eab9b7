// 页面数据加载器 - 成员列表页和成员详情页
//
// 只负责取数并原样传给展示层，不做校验

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use super::source::{find_member, MemberSource};
use crate::event_bus::{AppEvent, EventBus};
use crate::models::Member;

/// 成员列表页数据
#[derive(Debug, Clone, Serialize)]
pub struct RosterPage {
    pub members: Vec<Member>,
}

/// 成员详情页数据；找不到成员时 member 为 None
#[derive(Debug, Clone, Serialize)]
pub struct MemberPage {
    pub id: String,
    pub member: Option<Member>,
}

/// 页面加载器
#[derive(Clone)]
pub struct MemberPages {
    source: Arc<dyn MemberSource>,
    event_bus: Option<Arc<EventBus>>,
}

impl MemberPages {
    pub fn new(source: Arc<dyn MemberSource>) -> Self {
        Self {
            source,
            event_bus: None,
        }
    }

    /// 加载结果同时发布到事件总线
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    async fn load_members(&self) -> Result<Vec<Member>> {
        let source = self.source.name();
        match self.source.load().await {
            Ok(members) => {
                info!("从 {} 加载了 {} 位成员", source, members.len());
                self.publish(AppEvent::MembersLoaded {
                    source,
                    count: members.len(),
                });
                Ok(members)
            }
            Err(e) => {
                warn!("从 {} 加载成员失败: {}", source, e);
                self.publish(AppEvent::MembersLoadFailed {
                    source,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn publish(&self, event: AppEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// 成员列表页
    pub async fn roster_page(&self) -> Result<RosterPage> {
        Ok(RosterPage {
            members: self.load_members().await?,
        })
    }

    /// 成员详情页
    pub async fn member_page(&self, id: &str) -> Result<MemberPage> {
        let members = self.load_members().await?;
        let member = find_member(&members, id).cloned();
        if member.is_none() {
            info!("未找到成员: {}", id);
        }
        Ok(MemberPage {
            id: id.to_string(),
            member,
        })
    }
}
