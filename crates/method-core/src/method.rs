//! 製造方法模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 方法樹所屬的情境
///
/// 三種情境形狀相同但互不引用；工單與報價的方法樹由基礎方法複製而來
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodContext {
    /// 物料的基礎製造方法
    Base,
    /// 工單
    Job,
    /// 報價
    Quote,
}

/// 製造方法（一個物料「如何製造」）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeMethod {
    /// 製造方法ID
    pub id: String,

    /// 產出物料ID
    pub item_id: String,

    /// 公司ID
    pub company_id: String,

    /// 所屬情境
    pub context: MethodContext,

    /// 擁有者ID（基礎：物料ID；工單：工單ID；報價：報價行ID）
    pub owner_id: String,

    /// 每批產出數量（預設 1）
    pub production_quantity: Decimal,

    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl MakeMethod {
    /// 創建新的基礎製造方法
    pub fn new(id: impl Into<String>, item_id: impl Into<String>) -> Self {
        let item_id = item_id.into();
        Self {
            id: id.into(),
            owner_id: item_id.clone(),
            item_id,
            company_id: String::new(),
            context: MethodContext::Base,
            production_quantity: Decimal::ONE,
            created_at: None,
            created_by: None,
            updated_at: None,
            updated_by: None,
        }
    }

    /// 建構器模式：設置公司
    pub fn with_company_id(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = company_id.into();
        self
    }

    /// 建構器模式：設置情境與擁有者
    pub fn with_context(mut self, context: MethodContext, owner_id: impl Into<String>) -> Self {
        self.context = context;
        self.owner_id = owner_id.into();
        self
    }

    /// 建構器模式：設置每批產出數量
    pub fn with_production_quantity(mut self, quantity: Decimal) -> Self {
        self.production_quantity = quantity;
        self
    }

    /// 建構器模式：設置建立稽核欄位
    pub fn with_created(mut self, at: DateTime<Utc>, by: impl Into<String>) -> Self {
        self.created_at = Some(at);
        self.created_by = Some(by.into());
        self
    }
}
