//! Property-based tests for the resolution engine.
//!
//! Run with: cargo test -p method-engine --test `property_tests`

use method_engine::method_calc::{CostRollup, QuantityPropagator};
use method_engine::method_core::{MakeMethod, MaterialLine, MethodType};
use method_engine::{EngineConfig, MemoryNodeStore, MethodError, MethodResolver, TreeBuilder};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..10_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_cost() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// ROOT → sub_qty × SUB；SUB → left_qty × LEFT + right_qty × RIGHT
fn two_level_store(
    sub_qty: Decimal,
    left_qty: Decimal,
    right_qty: Decimal,
    left_scrap: Decimal,
    left_cost: Decimal,
    right_cost: Decimal,
) -> MemoryNodeStore {
    let mut store = MemoryNodeStore::new();
    store.insert_make_method(MakeMethod::new("MM-ROOT", "ROOT"));
    store.insert_make_method(MakeMethod::new("MM-SUB", "SUB"));
    store.insert_material(
        MaterialLine::new("L-SUB", "MM-ROOT", "SUB", MethodType::Make, sub_qty)
            .with_child_method("MM-SUB"),
    );
    store.insert_material(
        MaterialLine::new("L-LEFT", "MM-SUB", "LEFT", MethodType::Buy, left_qty)
            .with_scrap(left_scrap)
            .with_order(1),
    );
    store.insert_material(
        MaterialLine::new("L-RIGHT", "MM-SUB", "RIGHT", MethodType::Buy, right_qty).with_order(2),
    );
    store.set_item_cost("LEFT", left_cost);
    store.set_item_cost("RIGHT", right_cost);
    store
}

fn effective(store: &MemoryNodeStore, material_id: &str) -> Decimal {
    let tree = TreeBuilder::new(store, &EngineConfig::default())
        .build("MM-ROOT")
        .unwrap();
    let quantities = QuantityPropagator::propagate(&tree).unwrap();
    let value = tree
        .materials()
        .find(|(_, node)| node.line.id == material_id)
        .map(|(idx, _)| quantities.material(idx))
        .unwrap();
    value
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// 無損耗時，葉節點有效數量等於祖先用量連乘
    #[test]
    fn prop_quantity_conservation(
        sub_qty in arb_quantity(),
        left_qty in arb_quantity(),
        right_qty in arb_quantity(),
    ) {
        let store = two_level_store(sub_qty, left_qty, right_qty, Decimal::ZERO, Decimal::ONE, Decimal::ONE);

        prop_assert_eq!(effective(&store, "L-SUB"), sub_qty);
        prop_assert_eq!(effective(&store, "L-LEFT"), sub_qty * left_qty);
        prop_assert_eq!(effective(&store, "L-RIGHT"), sub_qty * right_qty);
    }

    /// 增加損耗只影響該行，增量為 Δ × 祖先有效數量
    #[test]
    fn prop_scrap_additivity(
        sub_qty in arb_quantity(),
        left_qty in arb_quantity(),
        right_qty in arb_quantity(),
        delta in arb_quantity(),
    ) {
        let before = two_level_store(sub_qty, left_qty, right_qty, Decimal::ZERO, Decimal::ONE, Decimal::ONE);
        let after = two_level_store(sub_qty, left_qty, right_qty, delta, Decimal::ONE, Decimal::ONE);

        prop_assert_eq!(
            effective(&after, "L-LEFT") - effective(&before, "L-LEFT"),
            delta * sub_qty
        );
        prop_assert_eq!(effective(&after, "L-RIGHT"), effective(&before, "L-RIGHT"));
        prop_assert_eq!(effective(&after, "L-SUB"), effective(&before, "L-SUB"));
    }

    /// 提高任一葉節點成本，根成本嚴格增加
    #[test]
    fn prop_cost_monotonicity(
        sub_qty in arb_quantity(),
        left_qty in arb_quantity(),
        right_qty in arb_quantity(),
        left_cost in arb_cost(),
        right_cost in arb_cost(),
        increase in 1i64..100_000i64,
    ) {
        let increase = Decimal::new(increase, 2);
        let base = two_level_store(sub_qty, left_qty, right_qty, Decimal::ZERO, left_cost, right_cost);
        let raised = two_level_store(sub_qty, left_qty, right_qty, Decimal::ZERO, left_cost + increase, right_cost);

        let config = EngineConfig::default();
        let base_cost = MethodResolver::new(&base, &base, config.clone())
            .resolve("MM-ROOT")
            .unwrap()
            .root_unit_cost();
        let raised_cost = MethodResolver::new(&raised, &raised, config)
            .resolve("MM-ROOT")
            .unwrap()
            .root_unit_cost();

        prop_assert!(raised_cost > base_cost);
    }

    /// 同一棵樹重複累計，結果完全相同
    #[test]
    fn prop_rollup_idempotence(
        sub_qty in arb_quantity(),
        left_qty in arb_quantity(),
        right_qty in arb_quantity(),
        left_scrap in arb_quantity(),
        left_cost in arb_cost(),
        right_cost in arb_cost(),
    ) {
        let store = two_level_store(sub_qty, left_qty, right_qty, left_scrap, left_cost, right_cost);
        let config = EngineConfig::default().with_scrap_in_cost(true);
        let tree = TreeBuilder::new(&store, &config).build("MM-ROOT").unwrap();
        let rollup = CostRollup::new(&store, &store, &config);

        let first = rollup.rollup(&tree).unwrap();
        let second = rollup.rollup(&tree).unwrap();

        prop_assert_eq!(first, second);
    }

    /// 任意長度的循環鏈都會終止並回報循環
    #[test]
    fn prop_cycle_always_detected(length in 1usize..20) {
        let mut store = MemoryNodeStore::new();
        for i in 0..length {
            store.insert_make_method(MakeMethod::new(format!("MM-{i}"), format!("ITEM-{i}")));
        }
        for i in 0..length {
            let next = (i + 1) % length;
            store.insert_material(
                MaterialLine::new(
                    format!("L-{i}"),
                    format!("MM-{i}"),
                    format!("ITEM-{next}"),
                    MethodType::Make,
                    Decimal::ONE,
                )
                .with_child_method(format!("MM-{next}")),
            );
        }

        let result = TreeBuilder::new(&store, &EngineConfig::default()).build("MM-0");
        match result {
            Err(MethodError::CycleDetected { chain }) => {
                prop_assert_eq!(chain.len(), length + 1);
                prop_assert_eq!(chain.first(), chain.last());
            }
            other => prop_assert!(false, "expected cycle, got {:?}", other),
        }
    }
}
