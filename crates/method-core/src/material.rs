//! 物料行模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MethodError, Result};

/// 物料取得方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodType {
    /// 採購
    Buy,
    /// 生產（引用另一個製造方法）
    Make,
    /// 領料（從庫存揀取）
    Pick,
}

impl std::fmt::Display for MethodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Make => write!(f, "Make"),
            Self::Pick => write!(f, "Pick"),
        }
    }
}

/// 驗證後的物料來源（只有 Make 帶子製造方法）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialSource<'a> {
    Buy,
    Pick,
    Make { make_method_id: &'a str },
}

impl MaterialSource<'_> {
    /// 是否為葉節點
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Make { .. })
    }
}

/// 物料行（製造方法中對某物料的消耗）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    /// 物料行ID
    pub id: String,

    /// 所屬製造方法ID
    pub make_method_id: String,

    /// 物料ID
    pub item_id: String,

    /// 物料可讀編號
    pub item_readable_id: String,

    /// 取得方式
    pub method_type: MethodType,

    /// 每單位父件用量
    pub quantity: Decimal,

    /// 損耗數量（額外消耗的絕對數量，不是百分比）
    pub scrap_quantity: Decimal,

    /// 同層排序
    pub order: i32,

    /// 計量單位
    pub unit_of_measure: String,

    /// 快取的單位成本
    pub unit_cost: Decimal,

    /// 子製造方法（僅 Make）
    pub material_make_method_id: Option<String>,

    /// 消耗此物料的工序（弱引用）
    pub method_operation_id: Option<String>,

    /// 自訂欄位（不參與計算）
    pub custom_fields: serde_json::Value,
}

impl MaterialLine {
    /// 創建新的物料行
    pub fn new(
        id: impl Into<String>,
        make_method_id: impl Into<String>,
        item_id: impl Into<String>,
        method_type: MethodType,
        quantity: Decimal,
    ) -> Self {
        let item_id = item_id.into();
        Self {
            id: id.into(),
            make_method_id: make_method_id.into(),
            item_readable_id: item_id.clone(),
            item_id,
            method_type,
            quantity,
            scrap_quantity: Decimal::ZERO,
            order: 0,
            unit_of_measure: "EA".to_string(),
            unit_cost: Decimal::ZERO,
            material_make_method_id: None,
            method_operation_id: None,
            custom_fields: serde_json::Value::Null,
        }
    }

    /// 建構器模式：設置子製造方法
    pub fn with_child_method(mut self, make_method_id: impl Into<String>) -> Self {
        self.material_make_method_id = Some(make_method_id.into());
        self
    }

    /// 建構器模式：設置損耗數量
    pub fn with_scrap(mut self, scrap_quantity: Decimal) -> Self {
        self.scrap_quantity = scrap_quantity;
        self
    }

    /// 建構器模式：設置排序
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 建構器模式：設置可讀編號
    pub fn with_readable_id(mut self, readable_id: impl Into<String>) -> Self {
        self.item_readable_id = readable_id.into();
        self
    }

    /// 建構器模式：設置計量單位
    pub fn with_unit_of_measure(mut self, uom: impl Into<String>) -> Self {
        self.unit_of_measure = uom.into();
        self
    }

    /// 建構器模式：設置快取單位成本
    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    /// 建構器模式：設置消耗工序
    pub fn with_operation(mut self, operation_id: impl Into<String>) -> Self {
        self.method_operation_id = Some(operation_id.into());
        self
    }

    /// 建構器模式：設置自訂欄位
    pub fn with_custom_fields(mut self, custom_fields: serde_json::Value) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    /// 每單位父件總消耗（用量 + 損耗）
    pub fn gross_quantity(&self) -> Result<Decimal> {
        self.quantity
            .checked_add(self.scrap_quantity)
            .ok_or_else(|| MethodError::overflow(&self.id, "scrap_quantity", self.scrap_quantity))
    }

    /// 驗證取得方式與子製造方法的一致性
    pub fn source(&self) -> Result<MaterialSource<'_>> {
        match (self.method_type, self.material_make_method_id.as_deref()) {
            (MethodType::Make, Some(make_method_id)) => Ok(MaterialSource::Make { make_method_id }),
            (MethodType::Make, None) => Err(self.invalid("Make 物料缺少子製造方法")),
            (MethodType::Buy, None) => Ok(MaterialSource::Buy),
            (MethodType::Pick, None) => Ok(MaterialSource::Pick),
            (MethodType::Buy | MethodType::Pick, Some(_)) => {
                Err(self.invalid(&format!("{} 物料不可引用子製造方法", self.method_type)))
            }
        }
    }

    /// 驗證數量非負
    pub fn validate_quantities(&self) -> Result<()> {
        if self.quantity < Decimal::ZERO {
            return Err(MethodError::InvalidQuantity {
                node_id: self.id.clone(),
                field: "quantity",
                value: self.quantity,
            });
        }
        if self.scrap_quantity < Decimal::ZERO {
            return Err(MethodError::InvalidQuantity {
                node_id: self.id.clone(),
                field: "scrap_quantity",
                value: self.scrap_quantity,
            });
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> MethodError {
        MethodError::InvalidMaterialLine {
            material_id: self.id.clone(),
            reason: reason.to_string(),
        }
    }
}
