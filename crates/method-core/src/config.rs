//! 方法解析引擎配置

use serde::{Deserialize, Serialize};

use crate::{MethodError, Result};

/// 預設最大展開深度
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// 預設幣別小數位數
pub const DEFAULT_DECIMAL_PLACES: u32 = 2;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 最大展開深度（防禦異常資料，與真正的循環分開回報）
    pub max_depth: usize,

    /// 公司幣別的小數位數，只在最終報告時四捨五入
    pub decimal_places: u32,

    /// 物料行成本是否包含損耗數量
    /// - false: 行成本 = 單位成本 × 用量（預設）
    /// - true: 行成本 = 單位成本 × (用量 + 損耗)
    pub include_scrap_in_cost: bool,
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            decimal_places: DEFAULT_DECIMAL_PLACES,
            include_scrap_in_cost: false,
        }
    }

    /// 建構器模式：設置最大深度
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 建構器模式：設置小數位數
    pub fn with_decimal_places(mut self, decimal_places: u32) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    /// 建構器模式：設置行成本是否包含損耗
    pub fn with_scrap_in_cost(mut self, include: bool) -> Self {
        self.include_scrap_in_cost = include;
        self
    }

    /// 從 JSON 載入配置（缺少的欄位使用預設值）
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MethodError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 驗證配置
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(MethodError::InvalidConfig("max_depth 必須大於 0".to_string()));
        }
        // rust_decimal 最多支援 28 位小數
        if self.decimal_places > 28 {
            return Err(MethodError::InvalidConfig(format!(
                "decimal_places 超出範圍: {}",
                self.decimal_places
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
