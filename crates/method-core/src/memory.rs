//! 記憶體資料來源
//!
//! 以 HashMap 保存方法樹資料列，實作 [`NodeStore`] 與 [`CostProvider`]。
//! 用於測試，也可供已預先載入快照的呼叫端使用。

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::{
    CostProvider, CostingMethod, Item, MakeMethod, MaterialLine, MethodError, NodeKind,
    NodeStore, OperationLine, Result,
};

/// 記憶體資料來源
#[derive(Debug, Clone, Default)]
pub struct MemoryNodeStore {
    make_methods: HashMap<String, MakeMethod>,
    materials: HashMap<String, Vec<MaterialLine>>,
    operations: HashMap<String, Vec<OperationLine>>,
    items: HashMap<String, Item>,
    item_costs: HashMap<String, Decimal>,
    ledger_costs: HashMap<(String, CostingMethod), Decimal>,
}

impl MemoryNodeStore {
    /// 創建空的資料來源
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增製造方法（同時登記產出物料）
    pub fn insert_make_method(&mut self, make_method: MakeMethod) {
        self.ensure_item(&make_method.item_id, &make_method.item_id);
        self.make_methods.insert(make_method.id.clone(), make_method);
    }

    /// 新增物料行（同時登記物料）
    pub fn insert_material(&mut self, material: MaterialLine) {
        self.ensure_item(&material.item_id, &material.item_readable_id);
        self.materials
            .entry(material.make_method_id.clone())
            .or_default()
            .push(material);
    }

    /// 新增工序行
    pub fn insert_operation(&mut self, operation: OperationLine) {
        self.operations
            .entry(operation.make_method_id.clone())
            .or_default()
            .push(operation);
    }

    /// 新增或覆蓋物料主檔
    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    /// 設置物料成本（適用所有計價方法）
    pub fn set_item_cost(&mut self, item_id: impl Into<String>, unit_cost: Decimal) {
        self.item_costs.insert(item_id.into(), unit_cost);
    }

    /// 設置特定計價方法的成本（優先於 `set_item_cost`）
    pub fn set_ledger_cost(
        &mut self,
        item_id: impl Into<String>,
        costing_method: CostingMethod,
        unit_cost: Decimal,
    ) {
        self.ledger_costs
            .insert((item_id.into(), costing_method), unit_cost);
    }

    /// 批次載入資料列
    pub fn extend(
        &mut self,
        make_methods: impl IntoIterator<Item = MakeMethod>,
        materials: impl IntoIterator<Item = MaterialLine>,
        operations: impl IntoIterator<Item = OperationLine>,
    ) {
        for make_method in make_methods {
            self.insert_make_method(make_method);
        }
        for material in materials {
            self.insert_material(material);
        }
        for operation in operations {
            self.insert_operation(operation);
        }
    }

    /// 製造方法數量
    pub fn make_method_count(&self) -> usize {
        self.make_methods.len()
    }

    fn ensure_item(&mut self, item_id: &str, readable_id: &str) {
        self.items
            .entry(item_id.to_string())
            .or_insert_with(|| Item::new(item_id, readable_id));
    }
}

impl NodeStore for MemoryNodeStore {
    fn get_make_method(&self, id: &str) -> Result<MakeMethod> {
        self.make_methods
            .get(id)
            .cloned()
            .ok_or_else(|| MethodError::not_found(NodeKind::MakeMethod, id))
    }

    fn list_material_lines(&self, make_method_id: &str) -> Result<Vec<MaterialLine>> {
        let mut lines = self
            .materials
            .get(make_method_id)
            .cloned()
            .unwrap_or_default();
        lines.sort_by_key(|line| line.order);
        Ok(lines)
    }

    fn list_operation_lines(&self, make_method_id: &str) -> Result<Vec<OperationLine>> {
        let mut lines = self
            .operations
            .get(make_method_id)
            .cloned()
            .unwrap_or_default();
        lines.sort_by_key(|line| line.order);
        Ok(lines)
    }

    fn get_item_costing_method(&self, item_id: &str) -> Result<CostingMethod> {
        self.get_item(item_id).map(|item| item.costing_method)
    }

    fn get_item(&self, item_id: &str) -> Result<Item> {
        self.items
            .get(item_id)
            .cloned()
            .ok_or_else(|| MethodError::not_found(NodeKind::Item, item_id))
    }
}

impl CostProvider for MemoryNodeStore {
    fn unit_cost(&self, item_id: &str, costing_method: CostingMethod) -> Result<Option<Decimal>> {
        let ledger = self
            .ledger_costs
            .get(&(item_id.to_string(), costing_method))
            .copied();
        Ok(ledger.or_else(|| self.item_costs.get(item_id).copied()))
    }
}
