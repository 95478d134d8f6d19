//! 外部資料來源介面
//!
//! 引擎只透過這兩個 trait 讀取持久化資料。實作端負責提供一致的快照
//! （讀取交易或不可變快照），引擎本身不加鎖。

use rust_decimal::Decimal;

use crate::{CostingMethod, Item, MakeMethod, MaterialLine, OperationLine, Result};

/// 方法節點查詢（唯讀，須可安全地並行讀取）
pub trait NodeStore: Send + Sync {
    /// 取得製造方法；不存在時回傳 `MethodError::NotFound`
    fn get_make_method(&self, id: &str) -> Result<MakeMethod>;

    /// 列出製造方法的物料行（依 `order` 遞增）
    fn list_material_lines(&self, make_method_id: &str) -> Result<Vec<MaterialLine>>;

    /// 列出製造方法的工序行（依 `order` 遞增）
    fn list_operation_lines(&self, make_method_id: &str) -> Result<Vec<OperationLine>>;

    /// 取得物料的計價方法
    fn get_item_costing_method(&self, item_id: &str) -> Result<CostingMethod>;

    /// 取得物料主檔摘要
    fn get_item(&self, item_id: &str) -> Result<Item>;
}

/// 葉節點單位成本來源
///
/// 標準成本直接取固定值；平均/FIFO/LIFO 由成本帳推導，引擎不自行計算。
pub trait CostProvider: Send + Sync {
    /// 回傳 `None` 表示查無成本，引擎會以 `MethodError::MissingCost` 中止計算
    fn unit_cost(&self, item_id: &str, costing_method: CostingMethod) -> Result<Option<Decimal>>;
}

impl<T: NodeStore + ?Sized> NodeStore for &T {
    fn get_make_method(&self, id: &str) -> Result<MakeMethod> {
        (**self).get_make_method(id)
    }

    fn list_material_lines(&self, make_method_id: &str) -> Result<Vec<MaterialLine>> {
        (**self).list_material_lines(make_method_id)
    }

    fn list_operation_lines(&self, make_method_id: &str) -> Result<Vec<OperationLine>> {
        (**self).list_operation_lines(make_method_id)
    }

    fn get_item_costing_method(&self, item_id: &str) -> Result<CostingMethod> {
        (**self).get_item_costing_method(item_id)
    }

    fn get_item(&self, item_id: &str) -> Result<Item> {
        (**self).get_item(item_id)
    }
}

impl<T: CostProvider + ?Sized> CostProvider for &T {
    fn unit_cost(&self, item_id: &str, costing_method: CostingMethod) -> Result<Option<Decimal>> {
        (**self).unit_cost(item_id, costing_method)
    }
}
