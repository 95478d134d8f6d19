//! 髒標記追蹤

use std::collections::HashSet;

/// 髒標記追蹤器
///
/// 記錄自上次重算後變動過的節點ID（製造方法或物料）。
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty_nodes: HashSet<String>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記節點為髒
    pub fn mark_dirty(&mut self, node_id: impl Into<String>) {
        self.dirty_nodes.insert(node_id.into());
    }

    /// 檢查節點是否為髒
    pub fn is_dirty(&self, node_id: &str) -> bool {
        self.dirty_nodes.contains(node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty_nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty_nodes.len()
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty_nodes.clear();
    }

    /// 取出並清空所有髒節點（依ID排序）
    pub fn take_dirty(&mut self) -> Vec<String> {
        let mut nodes: Vec<String> = self.dirty_nodes.drain().collect();
        nodes.sort_unstable();
        nodes
    }
}
