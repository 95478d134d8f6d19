//! 成本累計（由下而上）

use method_core::{
    CancellationToken, CostProvider, EngineConfig, MethodError, NodeStore, OperationLine,
    OperationType, Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::tree::{MaterialIdx, MethodIdx, MethodTree, OperationIdx};

/// 成本累計結果（全精度，不在層間四捨五入）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostBreakdown {
    method_unit_cost: Vec<Decimal>,
    material_unit_cost: Vec<Decimal>,
    material_line_cost: Vec<Decimal>,
    operation_cost: Vec<Decimal>,
}

impl CostBreakdown {
    /// 製造方法每單位產出成本
    pub fn method_unit_cost(&self, idx: MethodIdx) -> Decimal {
        self.method_unit_cost[idx.index()]
    }

    /// 物料單位成本（葉節點取自成本來源，Make 取子製造方法單位成本）
    pub fn material_unit_cost(&self, idx: MaterialIdx) -> Decimal {
        self.material_unit_cost[idx.index()]
    }

    /// 物料行成本（每批父件）
    pub fn material_line_cost(&self, idx: MaterialIdx) -> Decimal {
        self.material_line_cost[idx.index()]
    }

    /// 工序成本（每批父件，已套用最低成本）
    pub fn operation_cost(&self, idx: OperationIdx) -> Decimal {
        self.operation_cost[idx.index()]
    }
}

/// 計算工序整批成本
///
/// 廠內：準備工時 × 人工費率 + 人工工時 × (人工 + 間接費率) + 機台工時 × (機台 + 間接費率)
/// 委外：委外單價 × 批量
/// 兩者皆以最低成本為下限。金額溢位時回傳 `InvalidQuantity`。
pub fn operation_batch_cost(
    operation: &OperationLine,
    batch_quantity: Decimal,
) -> Result<Decimal> {
    let id = operation.id.as_str();
    let overflow = |value| MethodError::overflow(id, "operation_cost", value);

    let cost = match operation.operation_type {
        OperationType::Inside => {
            let labor_rate = operation
                .labor_rate
                .checked_add(operation.overhead_rate)
                .ok_or_else(|| overflow(operation.overhead_rate))?;
            let machine_rate = operation
                .machine_rate
                .checked_add(operation.overhead_rate)
                .ok_or_else(|| overflow(operation.overhead_rate))?;

            let setup = operation.setup_unit.batch_cost(
                id,
                operation.setup_time,
                batch_quantity,
                operation.labor_rate,
            )?;
            let labor =
                operation
                    .labor_unit
                    .batch_cost(id, operation.labor_time, batch_quantity, labor_rate)?;
            let machine =
                operation
                    .machine_unit
                    .batch_cost(id, operation.machine_time, batch_quantity, machine_rate)?;

            setup
                .checked_add(labor)
                .and_then(|sum| sum.checked_add(machine))
                .ok_or_else(|| overflow(machine))?
        }
        OperationType::Outside => operation
            .operation_unit_cost
            .checked_mul(batch_quantity)
            .ok_or_else(|| overflow(batch_quantity))?,
    };

    Ok(cost.max(operation.operation_minimum_cost))
}

fn accumulate(total: Decimal, cost: Decimal, make_method_id: &str) -> Result<Decimal> {
    total
        .checked_add(cost)
        .ok_or_else(|| MethodError::overflow(make_method_id, "batch_cost", cost))
}

/// 成本累計計算器
pub struct CostRollup<'a, S: NodeStore, C: CostProvider> {
    store: &'a S,
    provider: &'a C,
    config: &'a EngineConfig,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, S: NodeStore, C: CostProvider> CostRollup<'a, S, C> {
    /// 創建新的成本累計計算器
    pub fn new(store: &'a S, provider: &'a C, config: &'a EngineConfig) -> Self {
        Self {
            store,
            provider,
            config,
            cancel: None,
        }
    }

    /// 建構器模式：設置取消訊號
    pub fn with_cancellation(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 後序累計成本
    ///
    /// 任何葉節點缺少成本即整體失敗，不以 0 代替。
    pub fn rollup(&self, tree: &MethodTree) -> Result<CostBreakdown> {
        let mut breakdown = CostBreakdown {
            method_unit_cost: vec![Decimal::ZERO; tree.method_count()],
            material_unit_cost: vec![Decimal::ZERO; tree.material_count()],
            material_line_cost: vec![Decimal::ZERO; tree.material_count()],
            operation_cost: vec![Decimal::ZERO; tree.operation_count()],
        };
        let mut leaf_costs: HashMap<&str, Decimal> = HashMap::new();

        // arena 為前序，反向走訪即子節點先於父節點
        for (method_idx, node) in tree.methods().rev() {
            if self.cancel.is_some_and(|token| token.is_cancelled()) {
                return Err(MethodError::Cancelled {
                    make_method_id: node.make_method.id.clone(),
                });
            }

            let batch = node.make_method.production_quantity;
            let mut batch_cost = Decimal::ZERO;

            for &material_idx in &node.materials {
                let material = tree.material(material_idx);
                let unit_cost = match material.child {
                    Some(child) => breakdown.method_unit_cost[child.index()],
                    None => match leaf_costs.get(material.line.item_id.as_str()) {
                        Some(cost) => *cost,
                        None => {
                            let cost = self.leaf_unit_cost(&material.line.item_id)?;
                            leaf_costs.insert(material.line.item_id.as_str(), cost);
                            cost
                        }
                    },
                };

                let quantity = if self.config.include_scrap_in_cost {
                    material.line.gross_quantity()?
                } else {
                    material.line.quantity
                };
                let line_cost = unit_cost
                    .checked_mul(quantity)
                    .ok_or_else(|| MethodError::overflow(&material.line.id, "line_cost", quantity))?;

                breakdown.material_unit_cost[material_idx.index()] = unit_cost;
                breakdown.material_line_cost[material_idx.index()] = line_cost;
                batch_cost = accumulate(batch_cost, line_cost, &node.make_method.id)?;
            }

            for &operation_idx in &node.operations {
                let operation = &tree.operation(operation_idx).line;
                let cost = operation_batch_cost(operation, batch)?;
                breakdown.operation_cost[operation_idx.index()] = cost;
                batch_cost = accumulate(batch_cost, cost, &node.make_method.id)?;
            }

            breakdown.method_unit_cost[method_idx.index()] = batch_cost
                .checked_div(batch)
                .ok_or_else(|| MethodError::overflow(&node.make_method.id, "unit_cost", batch_cost))?;

            tracing::debug!(
                "成本累計: {} 每單位 {}",
                node.make_method.id,
                breakdown.method_unit_cost[method_idx.index()]
            );
        }

        Ok(breakdown)
    }

    /// 依物料計價方法向成本來源取得單位成本
    fn leaf_unit_cost(&self, item_id: &str) -> Result<Decimal> {
        let costing_method = self.store.get_item_costing_method(item_id)?;
        let unit_cost = self
            .provider
            .unit_cost(item_id, costing_method)?
            .ok_or_else(|| MethodError::MissingCost {
                item_id: item_id.to_string(),
            })?;

        if unit_cost < Decimal::ZERO {
            return Err(MethodError::InvalidQuantity {
                node_id: item_id.to_string(),
                field: "unit_cost",
                value: unit_cost,
            });
        }

        Ok(unit_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TreeBuilder;
    use method_core::{
        CostingMethod, Item, MakeMethod, MaterialLine, MemoryNodeStore, MethodType, TimeFactor,
    };
    use rstest::rstest;
    use rust_decimal_macros::dec;

    /// M1 → 2 × M2 (Make)；M2 = 3 × PART ($5) + 10 分鐘人工 ($30/hr)
    fn scenario_store() -> MemoryNodeStore {
        let mut store = MemoryNodeStore::new();
        store.insert_make_method(MakeMethod::new("M1", "TOP"));
        store.insert_make_method(MakeMethod::new("M2", "SUB"));
        store.insert_material(
            MaterialLine::new("MAT-1", "M1", "SUB", MethodType::Make, dec!(2))
                .with_child_method("M2"),
        );
        store.insert_material(MaterialLine::new("MAT-2", "M2", "PART", MethodType::Buy, dec!(3)));
        store.insert_operation(OperationLine::new("OP-1", "M2", "ASSEMBLE").with_labor(
            dec!(10),
            TimeFactor::MinutesPerPiece,
            dec!(30),
        ));
        store.set_item_cost("PART", dec!(5));
        store
    }

    fn rollup(store: &MemoryNodeStore, config: &EngineConfig) -> Result<(MethodTree, CostBreakdown)> {
        let tree = TreeBuilder::new(store, config).build("M1")?;
        let costs = CostRollup::new(store, store, config).rollup(&tree)?;
        Ok((tree, costs))
    }

    #[test]
    fn test_two_level_rollup() {
        let store = scenario_store();
        let config = EngineConfig::default();
        let (tree, costs) = rollup(&store, &config).unwrap();

        let m2 = tree.find_method("M2").unwrap();
        assert_eq!(costs.method_unit_cost(m2), dec!(20));
        assert_eq!(costs.method_unit_cost(tree.root()), dec!(40));

        let root_line = tree.method(tree.root()).materials[0];
        assert_eq!(costs.material_unit_cost(root_line), dec!(20));
        assert_eq!(costs.material_line_cost(root_line), dec!(40));
    }

    #[test]
    fn test_missing_leaf_cost_fails_whole_rollup() {
        let mut store = scenario_store();
        store.insert_material(
            MaterialLine::new("MAT-3", "M2", "UNPRICED", MethodType::Pick, dec!(1)).with_order(2),
        );
        let config = EngineConfig::default();

        let err = rollup(&store, &config).unwrap_err();
        assert_eq!(
            err,
            MethodError::MissingCost {
                item_id: "UNPRICED".to_string()
            }
        );
    }

    #[test]
    fn test_costing_method_selects_ledger_cost() {
        let mut store = scenario_store();
        store.insert_item(Item::new("PART", "PART").with_costing_method(CostingMethod::Fifo));
        store.set_ledger_cost("PART", CostingMethod::Fifo, dec!(6));
        let config = EngineConfig::default();

        let (tree, costs) = rollup(&store, &config).unwrap();
        // 3 × 6 + 5 = 23；根 = 46
        assert_eq!(costs.method_unit_cost(tree.root()), dec!(46));
    }

    #[test]
    fn test_scrap_in_cost_is_configurable() {
        let mut clean = MemoryNodeStore::new();
        clean.insert_make_method(MakeMethod::new("M1", "TOP"));
        clean.insert_material(
            MaterialLine::new("MAT-2", "M1", "PART", MethodType::Buy, dec!(3)).with_scrap(dec!(1)),
        );
        clean.set_item_cost("PART", dec!(5));

        let without = rollup(&clean, &EngineConfig::default()).unwrap();
        let with = rollup(&clean, &EngineConfig::new().with_scrap_in_cost(true)).unwrap();

        assert_eq!(without.1.method_unit_cost(without.0.root()), dec!(15));
        assert_eq!(with.1.method_unit_cost(with.0.root()), dec!(20));
    }

    #[test]
    fn test_production_quantity_spreads_batch_cost() {
        let mut store = MemoryNodeStore::new();
        store.insert_make_method(
            MakeMethod::new("M1", "TOP").with_production_quantity(dec!(4)),
        );
        store.insert_material(MaterialLine::new("MAT-1", "M1", "PART", MethodType::Buy, dec!(2)));
        store.insert_operation(
            OperationLine::new("OP-1", "M1", "CUT").with_setup(dec!(1), TimeFactor::TotalHours),
        );
        store.insert_operation(
            OperationLine::new("OP-2", "M1", "CUT")
                .with_order(1)
                .with_labor(dec!(30), TimeFactor::MinutesPerPiece, dec!(20)),
        );
        store.set_item_cost("PART", dec!(10));
        let config = EngineConfig::default();

        let (tree, costs) = rollup(&store, &config).unwrap();
        // 物料 20 + 準備 0（費率 0）+ 人工 0.5h × 4 × 20 = 40，共 60 / 4 = 15
        assert_eq!(costs.method_unit_cost(tree.root()), dec!(15));
    }

    #[test]
    fn test_rollup_is_idempotent() {
        let store = scenario_store();
        let config = EngineConfig::default();
        let tree = TreeBuilder::new(&store, &config).build("M1").unwrap();
        let rollup = CostRollup::new(&store, &store, &config);

        assert_eq!(rollup.rollup(&tree).unwrap(), rollup.rollup(&tree).unwrap());
    }

    #[test]
    fn test_cancelled_rollup() {
        let store = scenario_store();
        let config = EngineConfig::default();
        let tree = TreeBuilder::new(&store, &config).build("M1").unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = CostRollup::new(&store, &store, &config)
            .with_cancellation(&token)
            .rollup(&tree)
            .unwrap_err();
        assert!(matches!(err, MethodError::Cancelled { .. }));
    }

    #[test]
    fn test_line_cost_overflow_is_error() {
        let mut store = MemoryNodeStore::new();
        store.insert_make_method(MakeMethod::new("M1", "TOP"));
        store.insert_material(MaterialLine::new(
            "MAT-HUGE",
            "M1",
            "PART",
            MethodType::Buy,
            Decimal::from(1_000_000_000_000_000_000i64),
        ));
        store.set_item_cost("PART", Decimal::from(1_000_000_000_000i64));
        let config = EngineConfig::default();

        match rollup(&store, &config) {
            Err(MethodError::InvalidQuantity { node_id, field, .. }) => {
                assert_eq!(node_id, "MAT-HUGE");
                assert_eq!(field, "line_cost");
            }
            other => panic!("預期 InvalidQuantity，實際 {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_outside_operation_overflow_is_error() {
        let operation = OperationLine::new("OP-OUT", "M", "P")
            .outside(Decimal::from(1_000_000_000_000_000_000i64));

        let err = operation_batch_cost(&operation, Decimal::from(1_000_000_000_000i64)).unwrap_err();
        assert!(matches!(
            err,
            MethodError::InvalidQuantity { field: "operation_cost", .. }
        ));
    }

    #[rstest]
    #[case::inside(
        OperationLine::new("OP", "M", "P").with_labor(dec!(10), TimeFactor::MinutesPerPiece, dec!(30)),
        dec!(1),
        dec!(5)
    )]
    #[case::overhead(
        OperationLine::new("OP", "M", "P")
            .with_machine(dec!(2), TimeFactor::HoursPerPiece, dec!(40))
            .with_overhead_rate(dec!(10)),
        dec!(1),
        dec!(100)
    )]
    #[case::setup_uses_labor_rate(
        OperationLine::new("OP", "M", "P")
            .with_setup(dec!(30), TimeFactor::TotalMinutes)
            .with_labor(dec!(0), TimeFactor::MinutesPerPiece, dec!(60)),
        dec!(10),
        dec!(30)
    )]
    #[case::outside(OperationLine::new("OP", "M", "P").outside(dec!(2.5)), dec!(4), dec!(10))]
    #[case::minimum_floor(
        OperationLine::new("OP", "M", "P").outside(dec!(1)).with_minimum_cost(dec!(25)),
        dec!(4),
        dec!(25)
    )]
    fn test_operation_batch_cost(
        #[case] operation: OperationLine,
        #[case] batch: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(operation_batch_cost(&operation, batch).unwrap(), expected);
    }
}
