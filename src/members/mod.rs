//! 成员数据模块
//!
//! - source: 四种成员数据源和按ID查找
//! - pages: 列表页/详情页加载器
//! - import: 原始表格数据的合并与清洗

pub mod import;
pub mod pages;
pub mod source;

pub use import::{import_members, merge_rows, normalize_row, RawRow};
pub use pages::{MemberPage, MemberPages, RosterPage};
pub use source::{
    find_member, from_config, BuiltinMembers, HttpMembers, MemberSource, StaticFileMembers,
    REMOTE_MEMBERS_URL, STATIC_MEMBERS_ROUTE,
};
