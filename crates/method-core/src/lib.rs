//! # Method Core
//!
//! 製造方法樹的核心資料模型、查詢介面與錯誤類型

pub mod cancel;
pub mod config;
pub mod item;
pub mod material;
pub mod memory;
pub mod method;
pub mod operation;
pub mod store;

// Re-export 主要類型
pub use cancel::CancellationToken;
pub use config::EngineConfig;
pub use item::{CostingMethod, Item};
pub use material::{MaterialLine, MaterialSource, MethodType};
pub use memory::MemoryNodeStore;
pub use method::{MakeMethod, MethodContext};
pub use operation::{OperationLine, OperationOrder, OperationStatus, OperationType, TimeFactor};
pub use store::{CostProvider, NodeStore};

/// 節點種類（用於錯誤診斷）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    MakeMethod,
    Material,
    Operation,
    Item,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MakeMethod => write!(f, "製造方法"),
            Self::Material => write!(f, "物料行"),
            Self::Operation => write!(f, "工序行"),
            Self::Item => write!(f, "物料主檔"),
        }
    }
}

/// 方法解析錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MethodError {
    #[error("找不到{kind}: {id}")]
    NotFound { kind: NodeKind, id: String },

    #[error("偵測到循環引用: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    #[error("製造方法 {make_method_id} 深度 {depth} 超過上限 {max_depth}")]
    MaxDepthExceeded {
        make_method_id: String,
        depth: usize,
        max_depth: usize,
    },

    #[error("無效的數量: {node_id}.{field} = {value}")]
    InvalidQuantity {
        node_id: String,
        field: &'static str,
        value: rust_decimal::Decimal,
    },

    #[error("物料 {item_id} 缺少成本")]
    MissingCost { item_id: String },

    #[error("解析已取消（於製造方法 {make_method_id}）")]
    Cancelled { make_method_id: String },

    #[error("無效的物料行 {material_id}: {reason}")]
    InvalidMaterialLine { material_id: String, reason: String },

    #[error("資料來源錯誤: {0}")]
    Store(String),

    #[error("無效的配置: {0}")]
    InvalidConfig(String),
}

impl MethodError {
    /// 建立 NotFound 錯誤
    pub fn not_found(kind: NodeKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// 數值運算溢位，以 InvalidQuantity 回報溢位前的運算元
    pub fn overflow(
        node_id: impl Into<String>,
        field: &'static str,
        value: rust_decimal::Decimal,
    ) -> Self {
        Self::InvalidQuantity {
            node_id: node_id.into(),
            field,
            value,
        }
    }

    /// 資料完整性錯誤：對本次解析永遠是致命的
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::CycleDetected { .. }
                | Self::MaxDepthExceeded { .. }
                | Self::InvalidQuantity { .. }
                | Self::MissingCost { .. }
                | Self::InvalidMaterialLine { .. }
        )
    }

    /// 資源錯誤：交由呼叫端決定是否重試
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, MethodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let cycle = MethodError::CycleDetected {
            chain: vec!["MM-1".to_string(), "MM-2".to_string(), "MM-1".to_string()],
        };
        assert!(cycle.is_data_integrity());
        assert!(!cycle.is_resource());
        assert_eq!(cycle.to_string(), "偵測到循環引用: MM-1 -> MM-2 -> MM-1");

        let cancelled = MethodError::Cancelled {
            make_method_id: "MM-1".to_string(),
        };
        assert!(cancelled.is_resource());
        assert!(!cancelled.is_data_integrity());
    }

    #[test]
    fn test_not_found_message() {
        let err = MethodError::not_found(NodeKind::MakeMethod, "MM-404");
        assert_eq!(err.to_string(), "找不到製造方法: MM-404");
    }
}
