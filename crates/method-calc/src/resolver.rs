//! 方法解析主流程

use method_core::{CancellationToken, CostProvider, EngineConfig, NodeStore, Result};
use rayon::prelude::*;

use crate::builder::TreeBuilder;
use crate::quantity::QuantityPropagator;
use crate::rollup::CostRollup;
use crate::tree::MethodTree;
use crate::ResolvedMethod;

/// 方法解析器
///
/// 串接 建構 → 數量傳播 → 成本累計。本身不持有可變狀態，
/// 多個根可以並行解析。
pub struct MethodResolver<S: NodeStore, C: CostProvider> {
    /// 方法節點資料來源
    store: S,

    /// 葉節點成本來源
    costs: C,

    config: EngineConfig,
}

impl<S: NodeStore, C: CostProvider> MethodResolver<S, C> {
    /// 創建新的解析器
    pub fn new(store: S, costs: C, config: EngineConfig) -> Self {
        Self {
            store,
            costs,
            config,
        }
    }

    /// 只建構方法樹（供需要結構的呼叫端，例如由報價轉工單）
    pub fn build_tree(&self, root_id: &str) -> Result<MethodTree> {
        TreeBuilder::new(&self.store, &self.config).build(root_id)
    }

    /// 解析單一根製造方法
    pub fn resolve(&self, root_id: &str) -> Result<ResolvedMethod> {
        self.run(root_id, None)
    }

    /// 解析單一根製造方法，並在每個節點檢查取消訊號
    pub fn resolve_with_cancel(
        &self,
        root_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolvedMethod> {
        self.run(root_id, Some(cancel))
    }

    /// 並行解析多個互相獨立的根，結果順序與輸入相同
    pub fn resolve_many(&self, root_ids: &[&str]) -> Vec<Result<ResolvedMethod>> {
        tracing::info!("並行解析 {} 個製造方法", root_ids.len());
        root_ids
            .par_iter()
            .map(|root_id| self.resolve(root_id))
            .collect()
    }

    fn run(&self, root_id: &str, cancel: Option<&CancellationToken>) -> Result<ResolvedMethod> {
        tracing::info!("開始解析製造方法: {}", root_id);
        let start_time = std::time::Instant::now();

        let result = self.run_steps(root_id, cancel, start_time);
        match &result {
            Ok(resolved) => tracing::info!(
                "解析完成: {}，節點 {} 個，每單位成本 {}，耗時 {:?}",
                root_id,
                resolved.tree.node_count(),
                resolved.root_unit_cost(),
                start_time.elapsed()
            ),
            Err(err) => tracing::warn!("解析失敗: {}: {}", root_id, err),
        }
        result
    }

    fn run_steps(
        &self,
        root_id: &str,
        cancel: Option<&CancellationToken>,
        start_time: std::time::Instant,
    ) -> Result<ResolvedMethod> {
        // Step 1: 建構方法樹
        tracing::debug!("Step 1: 建構方法樹");
        let mut builder = TreeBuilder::new(&self.store, &self.config);
        if let Some(token) = cancel {
            builder = builder.with_cancellation(token);
        }
        let tree = builder.build(root_id)?;

        // Step 2: 數量傳播（由上而下）
        tracing::debug!("Step 2: 數量傳播");
        let quantities = QuantityPropagator::propagate(&tree)?;

        // Step 3: 成本累計（由下而上）
        tracing::debug!("Step 3: 成本累計");
        let mut rollup = CostRollup::new(&self.store, &self.costs, &self.config);
        if let Some(token) = cancel {
            rollup = rollup.with_cancellation(token);
        }
        let costs = rollup.rollup(&tree)?;

        for warning in tree.warnings() {
            tracing::warn!("{}: {}", warning.node_id, warning.message);
        }

        Ok(ResolvedMethod {
            tree,
            quantities,
            costs,
            decimal_places: self.config.decimal_places,
            calculation_time_ms: Some(start_time.elapsed().as_millis()),
        })
    }

    /// 取得配置引用
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 取得資料來源引用
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 取得資料來源可變引用（資料異動後須另行使緩存失效）
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn costs(&self) -> &C {
        &self.costs
    }

    pub fn costs_mut(&mut self) -> &mut C {
        &mut self.costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use method_core::{MakeMethod, MaterialLine, MemoryNodeStore, MethodError, MethodType};
    use rust_decimal_macros::dec;

    fn store() -> MemoryNodeStore {
        let mut store = MemoryNodeStore::new();
        for (method_id, item_id, cost) in [("MM-A", "A", dec!(2)), ("MM-B", "B", dec!(7))] {
            store.insert_make_method(MakeMethod::new(method_id, item_id));
            store.insert_material(MaterialLine::new(
                format!("{method_id}-LINE"),
                method_id,
                format!("{item_id}-RAW"),
                MethodType::Buy,
                dec!(3),
            ));
            store.set_item_cost(format!("{item_id}-RAW"), cost);
        }
        store
    }

    #[test]
    fn test_resolve_many_keeps_input_order() {
        let store = store();
        let resolver = MethodResolver::new(&store, &store, EngineConfig::default());

        let results = resolver.resolve_many(&["MM-B", "MM-404", "MM-A"]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().root_unit_cost(), dec!(21));
        assert!(matches!(results[1], Err(MethodError::NotFound { .. })));
        assert_eq!(results[2].as_ref().unwrap().root_unit_cost(), dec!(6));
    }

    #[test]
    fn test_resolve_with_cancelled_token() {
        let store = store();
        let resolver = MethodResolver::new(&store, &store, EngineConfig::default());
        let token = CancellationToken::new();
        token.cancel();

        let err = resolver.resolve_with_cancel("MM-A", &token).unwrap_err();
        assert!(err.is_resource());
    }

    #[test]
    fn test_invalid_config_rejected_before_traversal() {
        let store = store();
        let resolver =
            MethodResolver::new(&store, &store, EngineConfig::new().with_max_depth(0));

        assert!(matches!(
            resolver.resolve("MM-A"),
            Err(MethodError::InvalidConfig(_))
        ));
    }
}
