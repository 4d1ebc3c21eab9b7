// 文档根元素 - 记录根元素上的 class 以及系统配色偏好

use std::collections::BTreeSet;
use std::sync::RwLock;

use super::DisplaySurface;

/// 文档根元素
///
/// 桌面壳通过订阅 class 变化（或 ThemeChanged 事件）把状态同步到 webview
pub struct DocumentRoot {
    prefers_dark: bool,
    classes: RwLock<BTreeSet<String>>,
}

impl DocumentRoot {
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            prefers_dark,
            classes: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes
            .read()
            .map(|classes| classes.contains(class))
            .unwrap_or(false)
    }

    /// 当前所有 class（按字母序）
    pub fn classes(&self) -> Vec<String> {
        self.classes
            .read()
            .map(|classes| classes.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl DisplaySurface for DocumentRoot {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    fn toggle_root_class(&self, class: &str, enabled: bool) {
        if let Ok(mut classes) = self.classes.write() {
            if enabled {
                classes.insert(class.to_string());
            } else {
                classes.remove(class);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_root_class() {
        let root = DocumentRoot::new(true);
        assert!(root.prefers_dark());

        root.toggle_root_class("dark", true);
        assert!(root.has_class("dark"));
        root.toggle_root_class("dark", true);
        assert_eq!(root.classes(), vec!["dark".to_string()]);

        root.toggle_root_class("dark", false);
        assert!(!root.has_class("dark"));
        assert!(root.classes().is_empty());
    }
}
