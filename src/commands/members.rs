//! 成员数据命令

use crate::members::{MemberPage, RosterPage};
use crate::AppState;

/// 成员列表页
#[tauri::command]
pub async fn get_roster(state: tauri::State<'_, AppState>) -> Result<RosterPage, String> {
    state.members.roster_page().await.map_err(|e| e.to_string())
}

/// 成员详情页；找不到时 member 为 null
#[tauri::command]
pub async fn get_member(
    state: tauri::State<'_, AppState>,
    id: String,
) -> Result<MemberPage, String> {
    state.members.member_page(&id).await.map_err(|e| e.to_string())
}
