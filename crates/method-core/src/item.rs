//! 物料主檔查詢模型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 存貨計價方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CostingMethod {
    /// 標準成本（固定成本）
    #[default]
    Standard,
    /// 移動平均
    Average,
    /// 先進先出
    Fifo,
    /// 後進先出
    Lifo,
}

impl CostingMethod {
    /// 是否需要由成本帳推導（非固定成本）
    pub fn is_ledger_derived(&self) -> bool {
        !matches!(self, Self::Standard)
    }
}

impl FromStr for CostingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "AVERAGE" => Ok(Self::Average),
            "FIFO" => Ok(Self::Fifo),
            "LIFO" => Ok(Self::Lifo),
            _ => Err(format!("未知的計價方法: {s}")),
        }
    }
}

impl fmt::Display for CostingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::Average => write!(f, "Average"),
            Self::Fifo => write!(f, "FIFO"),
            Self::Lifo => write!(f, "LIFO"),
        }
    }
}

/// 物料主檔摘要（方法樹葉節點所引用的外部資料）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// 物料ID
    pub id: String,

    /// 可讀編號
    pub readable_id: String,

    /// 物料類型（Part / Material / Tool / Consumable ...）
    pub item_type: String,

    /// 計價方法
    pub costing_method: CostingMethod,
}

impl Item {
    /// 創建新的物料（預設標準成本）
    pub fn new(id: impl Into<String>, readable_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            readable_id: readable_id.into(),
            item_type: "Part".to_string(),
            costing_method: CostingMethod::Standard,
        }
    }

    /// 建構器模式：設置物料類型
    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    /// 建構器模式：設置計價方法
    pub fn with_costing_method(mut self, costing_method: CostingMethod) -> Self {
        self.costing_method = costing_method;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("standard", CostingMethod::Standard)]
    #[case("Average", CostingMethod::Average)]
    #[case("FIFO", CostingMethod::Fifo)]
    #[case("lifo", CostingMethod::Lifo)]
    fn test_parse_costing_method(#[case] input: &str, #[case] expected: CostingMethod) {
        assert_eq!(input.parse::<CostingMethod>().unwrap(), expected);
    }

    #[test]
    fn test_costing_method_display() {
        assert_eq!(CostingMethod::Fifo.to_string(), "FIFO");
        assert!("HIFO".parse::<CostingMethod>().is_err());
        assert!(CostingMethod::Lifo.is_ledger_derived());
        assert!(!CostingMethod::Standard.is_ledger_derived());
    }

    #[test]
    fn test_item_builder() {
        let item = Item::new("I-1", "STEEL-TUBE")
            .with_item_type("Material")
            .with_costing_method(CostingMethod::Average);

        assert_eq!(item.readable_id, "STEEL-TUBE");
        assert_eq!(item.item_type, "Material");
        assert_eq!(item.costing_method, CostingMethod::Average);
    }
}
