//! 增量解析
//!
//! 以根製造方法為鍵緩存解析結果，並記錄每個結果依賴的製造方法與物料。
//! 任一依賴被標記為髒時，只有受影響的根需要重算。

use method_calc::{MethodResolver, ResolvedMethod};
use method_core::{CostProvider, NodeStore, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dirty_tracking::DirtyTracker;

/// 緩存項目
#[derive(Debug, Clone)]
struct CacheEntry {
    resolved: Arc<ResolvedMethod>,
    /// 樹中所有製造方法ID與物料ID
    dependencies: HashSet<String>,
}

/// 解析結果緩存
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root_id: &str) -> Option<Arc<ResolvedMethod>> {
        self.entries
            .get(root_id)
            .map(|entry| Arc::clone(&entry.resolved))
    }

    /// 存入解析結果，並從方法樹收集依賴
    pub fn insert(
        &mut self,
        root_id: impl Into<String>,
        resolved: ResolvedMethod,
    ) -> Arc<ResolvedMethod> {
        let tree = &resolved.tree;
        let dependencies = tree
            .methods()
            .flat_map(|(_, node)| [node.make_method.id.clone(), node.make_method.item_id.clone()])
            .chain(tree.materials().map(|(_, node)| node.line.item_id.clone()))
            .collect();

        let resolved = Arc::new(resolved);
        self.entries.insert(
            root_id.into(),
            CacheEntry {
                resolved: Arc::clone(&resolved),
                dependencies,
            },
        );
        resolved
    }

    /// 使依賴此節點的所有緩存失效，回傳被移除的根ID
    pub fn invalidate(&mut self, node_id: &str) -> Vec<String> {
        let mut evicted: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.dependencies.contains(node_id))
            .map(|(root_id, _)| root_id.clone())
            .collect();
        evicted.sort_unstable();

        for root_id in &evicted {
            self.entries.remove(root_id);
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, root_id: &str) -> bool {
        self.entries.contains_key(root_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 緩存命中統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// 增量解析器
///
/// 資料異動後呼叫 [`mark_dirty`](Self::mark_dirty)：製造方法本身、其物料行或工序行
/// 變動時標記製造方法ID；物料成本或主檔變動時標記物料ID。
/// 下次解析前才套用髒標記。
pub struct IncrementalResolver<S: NodeStore, C: CostProvider> {
    resolver: MethodResolver<S, C>,
    cache: ResolutionCache,
    tracker: DirtyTracker,
    stats: CacheStats,
}

impl<S: NodeStore, C: CostProvider> IncrementalResolver<S, C> {
    /// 創建新的增量解析器
    pub fn new(resolver: MethodResolver<S, C>) -> Self {
        Self {
            resolver,
            cache: ResolutionCache::new(),
            tracker: DirtyTracker::new(),
            stats: CacheStats::default(),
        }
    }

    /// 解析（命中緩存時直接回傳）
    pub fn resolve(&mut self, root_id: &str) -> Result<Arc<ResolvedMethod>> {
        self.apply_dirty();

        if let Some(resolved) = self.cache.get(root_id) {
            self.stats.hits += 1;
            tracing::debug!("緩存命中: {}", root_id);
            return Ok(resolved);
        }

        self.stats.misses += 1;
        let resolved = self.resolver.resolve(root_id)?;
        Ok(self.cache.insert(root_id, resolved))
    }

    /// 標記節點為髒
    pub fn mark_dirty(&mut self, node_id: impl Into<String>) {
        self.tracker.mark_dirty(node_id);
    }

    /// 清除全部緩存
    pub fn invalidate_all(&mut self) {
        self.stats.evictions += self.cache.len() as u64;
        self.cache.clear();
        self.tracker.clear();
    }

    fn apply_dirty(&mut self) {
        if self.tracker.is_empty() {
            return;
        }

        let dirty = self.tracker.take_dirty();
        let mut evicted = 0;
        for node_id in &dirty {
            evicted += self.cache.invalidate(node_id).len();
        }
        self.stats.evictions += evicted as u64;

        tracing::info!(
            "增量重算: 髒節點 {} 個，失效緩存 {} 個",
            dirty.len(),
            evicted
        );
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn resolver(&self) -> &MethodResolver<S, C> {
        &self.resolver
    }

    /// 取得解析器可變引用，用於異動資料來源
    pub fn resolver_mut(&mut self) -> &mut MethodResolver<S, C> {
        &mut self.resolver
    }
}
