//! 數量傳播
//!
//! 由根往下計算每個節點「每一單位根產出」所需的數量。

use method_core::{MethodError, Result};
use rust_decimal::Decimal;

use crate::tree::{MaterialIdx, MethodIdx, MethodTree, OperationIdx};

/// 各節點的有效數量（每一單位根產出）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantities {
    methods: Vec<Decimal>,
    materials: Vec<Decimal>,
    operations: Vec<Decimal>,
}

impl Quantities {
    /// 製造方法的有效數量（根為 1）
    pub fn method(&self, idx: MethodIdx) -> Decimal {
        self.methods[idx.index()]
    }

    /// 物料行的有效數量（含損耗）
    pub fn material(&self, idx: MaterialIdx) -> Decimal {
        self.materials[idx.index()]
    }

    /// 工序行回報所屬製造方法的有效數量
    pub fn operation(&self, idx: OperationIdx) -> Decimal {
        self.operations[idx.index()]
    }
}

/// 數量傳播計算器
pub struct QuantityPropagator;

impl QuantityPropagator {
    /// 由上而下傳播數量
    ///
    /// 物料行：有效數量 = Q × (用量 + 損耗) / 父製造方法每批產出，
    /// 其中 Q 為父製造方法的有效數量。損耗為額外消耗的絕對數量。
    /// 連乘超出 Decimal 範圍時回傳 `InvalidQuantity`。
    pub fn propagate(tree: &MethodTree) -> Result<Quantities> {
        let mut quantities = Quantities {
            methods: vec![Decimal::ZERO; tree.method_count()],
            materials: vec![Decimal::ZERO; tree.material_count()],
            operations: vec![Decimal::ZERO; tree.operation_count()],
        };
        quantities.methods[tree.root().index()] = Decimal::ONE;

        // arena 為前序，處理到某製造方法時其有效數量已由父物料行寫入
        for (method_idx, node) in tree.methods() {
            let parent_quantity = quantities.methods[method_idx.index()];
            let batch = node.make_method.production_quantity;

            for &material_idx in &node.materials {
                let material = tree.material(material_idx);
                let effective = parent_quantity
                    .checked_mul(material.line.gross_quantity()?)
                    .and_then(|scaled| scaled.checked_div(batch))
                    .ok_or_else(|| {
                        MethodError::overflow(&material.line.id, "effective_quantity", parent_quantity)
                    })?;

                if effective < Decimal::ZERO {
                    return Err(MethodError::InvalidQuantity {
                        node_id: material.line.id.clone(),
                        field: "effective_quantity",
                        value: effective,
                    });
                }

                quantities.materials[material_idx.index()] = effective;
                if let Some(child) = material.child {
                    quantities.methods[child.index()] = effective;
                }
            }

            for &operation_idx in &node.operations {
                quantities.operations[operation_idx.index()] = parent_quantity;
            }
        }

        tracing::debug!(
            "數量傳播完成: 物料行 {} 個",
            quantities.materials.len()
        );

        Ok(quantities)
    }
}
