//! 方法樹扁平化
//!
//! 產生與方法樹查詢函式相同欄位的資料列，依同層 order 做深度優先走訪。

use method_core::MethodType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::quantity::Quantities;
use crate::rollup::CostBreakdown;
use crate::tree::{MaterialIdx, MethodTree};

/// 走訪順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlattenOrder {
    /// 根優先（前序），用於顯示
    #[default]
    PreOrder,
    /// 葉優先（後序），用於由下而上建立工單
    PostOrder,
}

/// 扁平化資料列（序列化欄位名與方法樹查詢結果一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRow {
    /// 根的擁有者ID（物料 / 工單 / 報價行）
    pub parent_owner_id: String,

    /// 物料行ID
    pub method_material_id: String,

    /// 所屬製造方法ID
    pub make_method_id: String,

    /// 子製造方法ID（僅 Make）
    pub child_make_method_id: Option<String>,

    pub item_id: String,
    pub item_readable_id: String,
    pub item_type: String,

    /// 每單位父件用量
    pub quantity: Decimal,

    /// 每單位根產出的有效數量（已解析時才有）
    pub effective_quantity: Option<Decimal>,

    /// 單位成本（已解析時為累計結果，否則為快取值）
    pub unit_cost: Decimal,

    pub method_type: MethodType,

    /// 擁有此子樹的物料行ID（根製造方法的物料行為 None）
    pub parent_material_id: Option<String>,

    pub order: i32,
    pub depth: usize,
    pub path: Vec<i32>,
    pub is_root: bool,
}

/// 扁平化器
#[derive(Debug, Clone, Copy)]
pub struct Flattener<'a> {
    tree: &'a MethodTree,
    quantities: Option<&'a Quantities>,
    costs: Option<&'a CostBreakdown>,
}

impl<'a> Flattener<'a> {
    /// 只用方法樹本身（成本取快取值）
    pub fn new(tree: &'a MethodTree) -> Self {
        Self {
            tree,
            quantities: None,
            costs: None,
        }
    }

    /// 建構器模式：附帶有效數量
    pub fn with_quantities(mut self, quantities: &'a Quantities) -> Self {
        self.quantities = Some(quantities);
        self
    }

    /// 建構器模式：附帶成本累計結果
    pub fn with_costs(mut self, costs: &'a CostBreakdown) -> Self {
        self.costs = Some(costs);
        self
    }

    /// 產生單次走訪的迭代器
    pub fn rows(self, order: FlattenOrder) -> FlattenIter<'a> {
        let root = self.tree.method(self.tree.root());
        let stack = root
            .materials
            .iter()
            .rev()
            .map(|&idx| (idx, false))
            .collect();

        FlattenIter {
            flattener: self,
            order,
            stack,
        }
    }

    fn row(&self, idx: MaterialIdx) -> FlatRow {
        let material = self.tree.material(idx);
        let owner = self.tree.method(material.owner);
        let line = &material.line;

        let unit_cost = self
            .costs
            .map(|costs| costs.material_unit_cost(idx))
            .unwrap_or(line.unit_cost);

        FlatRow {
            parent_owner_id: self.tree.root_method().owner_id.clone(),
            method_material_id: line.id.clone(),
            make_method_id: owner.make_method.id.clone(),
            child_make_method_id: material
                .child
                .map(|child| self.tree.method(child).make_method.id.clone()),
            item_id: line.item_id.clone(),
            item_readable_id: material.item.readable_id.clone(),
            item_type: material.item.item_type.clone(),
            quantity: line.quantity,
            effective_quantity: self.quantities.map(|q| q.material(idx)),
            unit_cost,
            method_type: line.method_type,
            parent_material_id: owner
                .parent_material
                .map(|parent| self.tree.material(parent).line.id.clone()),
            order: line.order,
            depth: owner.depth,
            path: material.path.clone(),
            is_root: owner.parent_material.is_none(),
        }
    }
}

/// 扁平化迭代器（有限、單次，不可重新開始）
#[derive(Debug)]
pub struct FlattenIter<'a> {
    flattener: Flattener<'a>,
    order: FlattenOrder,
    /// (物料, 子節點是否已展開)
    stack: Vec<(MaterialIdx, bool)>,
}

impl<'a> FlattenIter<'a> {
    fn push_children(&mut self, idx: MaterialIdx) {
        let tree = self.flattener.tree;
        if let Some(child) = tree.material(idx).child {
            self.stack.extend(
                tree.method(child)
                    .materials
                    .iter()
                    .rev()
                    .map(|&child_idx| (child_idx, false)),
            );
        }
    }
}

impl Iterator for FlattenIter<'_> {
    type Item = FlatRow;

    fn next(&mut self) -> Option<FlatRow> {
        loop {
            let (idx, expanded) = self.stack.pop()?;
            match self.order {
                FlattenOrder::PreOrder => {
                    self.push_children(idx);
                    return Some(self.flattener.row(idx));
                }
                FlattenOrder::PostOrder if expanded => {
                    return Some(self.flattener.row(idx));
                }
                FlattenOrder::PostOrder => {
                    self.stack.push((idx, true));
                    self.push_children(idx);
                }
            }
        }
    }
}
