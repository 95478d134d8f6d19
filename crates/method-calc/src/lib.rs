//! # Method Resolution Engine
//!
//! 製造方法樹解析：建構、數量傳播、成本累計與扁平化

pub mod builder;
pub mod flatten;
pub mod quantity;
pub mod resolver;
pub mod rollup;
pub mod routing;
pub mod snapshot;
pub mod tree;

// Re-export 主要類型
pub use builder::TreeBuilder;
pub use flatten::{FlatRow, FlattenIter, FlattenOrder, Flattener};
pub use quantity::{Quantities, QuantityPropagator};
pub use resolver::MethodResolver;
pub use rollup::{operation_batch_cost, CostBreakdown, CostRollup};
pub use routing::{routing_steps, RoutingStep};
pub use snapshot::{IdIssuer, MethodSnapshot, SnapshotCopier, UuidIssuer};
pub use tree::{
    MaterialIdx, MaterialNode, MethodIdx, MethodNode, MethodTree, OperationIdx, OperationNode,
};

use rust_decimal::{Decimal, RoundingStrategy};

/// 方法解析結果
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    /// 方法樹
    pub tree: MethodTree,

    /// 每單位根產出的有效數量
    pub quantities: Quantities,

    /// 成本累計結果
    pub costs: CostBreakdown,

    /// 報表用小數位數
    pub decimal_places: u32,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl ResolvedMethod {
    /// 根製造方法每單位成本（完整精度）
    pub fn root_unit_cost(&self) -> Decimal {
        self.costs.method_unit_cost(self.tree.root())
    }

    /// 根製造方法每單位成本（依配置四捨五入）
    pub fn root_unit_cost_rounded(&self) -> Decimal {
        self.root_unit_cost()
            .round_dp_with_strategy(self.decimal_places, RoundingStrategy::MidpointAwayFromZero)
    }

    /// 查詢樹中任一製造方法的每單位成本
    pub fn unit_cost_of(&self, make_method_id: &str) -> Option<Decimal> {
        self.tree
            .find_method(make_method_id)
            .map(|idx| self.costs.method_unit_cost(idx))
    }

    /// 前序扁平化資料列（附有效數量與累計成本）
    pub fn rows(&self) -> Vec<FlatRow> {
        self.rows_in(FlattenOrder::PreOrder)
    }

    pub fn rows_in(&self, order: FlattenOrder) -> Vec<FlatRow> {
        Flattener::new(&self.tree)
            .with_quantities(&self.quantities)
            .with_costs(&self.costs)
            .rows(order)
            .collect()
    }

    /// 樹中所有物料行ID（前序）
    pub fn material_ids(&self) -> Vec<String> {
        Flattener::new(&self.tree)
            .rows(FlattenOrder::PreOrder)
            .map(|row| row.method_material_id)
            .collect()
    }

    /// 樹中所有製造方法ID（含根）
    pub fn make_method_ids(&self) -> Vec<String> {
        self.tree
            .methods()
            .map(|(_, node)| node.make_method.id.clone())
            .collect()
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        self.tree.warnings()
    }
}

/// 解析警告（不中斷解析）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveWarning {
    pub node_id: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ResolveWarning {
    pub fn new(node_id: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            node_id,
            message,
            severity,
        }
    }

    pub fn info(node_id: String, message: String) -> Self {
        Self::new(node_id, message, WarningSeverity::Info)
    }

    pub fn warning(node_id: String, message: String) -> Self {
        Self::new(node_id, message, WarningSeverity::Warning)
    }

    pub fn error(node_id: String, message: String) -> Self {
        Self::new(node_id, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
