//! 工序行模型（製程路線步驟）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{MethodError, Result};

/// 工序排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperationOrder {
    /// 接續前一工序
    #[default]
    AfterPrevious,
    /// 與前一工序同時開始
    WithPrevious,
}

/// 工序類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperationType {
    /// 廠內加工（依工時與費率計價）
    #[default]
    Inside,
    /// 委外加工（依每件委外單價計價）
    Outside,
}

/// 工序狀態（僅工單/報價情境，不參與計算）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Todo,
    Ready,
    InProgress,
    Paused,
    Done,
    Canceled,
}

/// 工時單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFactor {
    #[serde(rename = "Hours/Piece")]
    HoursPerPiece,
    #[serde(rename = "Hours/100 Pieces")]
    HoursPer100Pieces,
    #[serde(rename = "Hours/1000 Pieces")]
    HoursPer1000Pieces,
    #[default]
    #[serde(rename = "Minutes/Piece")]
    MinutesPerPiece,
    #[serde(rename = "Minutes/100 Pieces")]
    MinutesPer100Pieces,
    #[serde(rename = "Minutes/1000 Pieces")]
    MinutesPer1000Pieces,
    #[serde(rename = "Seconds/Piece")]
    SecondsPerPiece,
    #[serde(rename = "Pieces/Hour")]
    PiecesPerHour,
    #[serde(rename = "Pieces/Minute")]
    PiecesPerMinute,
    #[serde(rename = "Total Hours")]
    TotalHours,
    #[serde(rename = "Total Minutes")]
    TotalMinutes,
}

impl TimeFactor {
    const ALL: [(Self, &'static str); 11] = [
        (Self::HoursPerPiece, "Hours/Piece"),
        (Self::HoursPer100Pieces, "Hours/100 Pieces"),
        (Self::HoursPer1000Pieces, "Hours/1000 Pieces"),
        (Self::MinutesPerPiece, "Minutes/Piece"),
        (Self::MinutesPer100Pieces, "Minutes/100 Pieces"),
        (Self::MinutesPer1000Pieces, "Minutes/1000 Pieces"),
        (Self::SecondsPerPiece, "Seconds/Piece"),
        (Self::PiecesPerHour, "Pieces/Hour"),
        (Self::PiecesPerMinute, "Pieces/Minute"),
        (Self::TotalHours, "Total Hours"),
        (Self::TotalMinutes, "Total Minutes"),
    ];

    /// 整批工時的分子與分母（小時 = 分子 / 分母），溢位時回傳 None
    ///
    /// 先乘後除，讓金額計算在分母整除時保持精確
    fn hours_ratio(self, time: Decimal, batch_quantity: Decimal) -> Option<(Decimal, Decimal)> {
        let per_minute = Decimal::from(60);
        let ratio = match self {
            Self::HoursPerPiece => (time.checked_mul(batch_quantity)?, Decimal::ONE),
            Self::HoursPer100Pieces => (time.checked_mul(batch_quantity)?, Decimal::ONE_HUNDRED),
            Self::HoursPer1000Pieces => (time.checked_mul(batch_quantity)?, Decimal::ONE_THOUSAND),
            Self::MinutesPerPiece => (time.checked_mul(batch_quantity)?, per_minute),
            Self::MinutesPer100Pieces => (time.checked_mul(batch_quantity)?, Decimal::from(6_000)),
            Self::MinutesPer1000Pieces => (time.checked_mul(batch_quantity)?, Decimal::from(60_000)),
            Self::SecondsPerPiece => (time.checked_mul(batch_quantity)?, Decimal::from(3_600)),
            // 產能型單位：速率為 0 視為未設定工時
            Self::PiecesPerHour if time.is_zero() => (Decimal::ZERO, Decimal::ONE),
            Self::PiecesPerHour => (batch_quantity, time),
            Self::PiecesPerMinute if time.is_zero() => (Decimal::ZERO, Decimal::ONE),
            Self::PiecesPerMinute => (batch_quantity, time.checked_mul(per_minute)?),
            Self::TotalHours => (time, Decimal::ONE),
            Self::TotalMinutes => (time, per_minute),
        };
        Some(ratio)
    }

    /// 將工時換算為整批（batch_quantity 件）所需小時數
    ///
    /// 溢位時回傳 `InvalidQuantity`，`operation_id` 為錯誤中的節點ID。
    pub fn batch_hours(
        self,
        operation_id: &str,
        time: Decimal,
        batch_quantity: Decimal,
    ) -> Result<Decimal> {
        self.hours_ratio(time, batch_quantity)
            .and_then(|(numerator, denominator)| numerator.checked_div(denominator))
            .ok_or_else(|| MethodError::overflow(operation_id, "batch_hours", time))
    }

    /// 整批工時乘以每小時費率
    pub fn batch_cost(
        self,
        operation_id: &str,
        time: Decimal,
        batch_quantity: Decimal,
        hourly_rate: Decimal,
    ) -> Result<Decimal> {
        self.hours_ratio(time, batch_quantity)
            .and_then(|(numerator, denominator)| {
                numerator.checked_mul(hourly_rate)?.checked_div(denominator)
            })
            .ok_or_else(|| MethodError::overflow(operation_id, "operation_cost", time))
    }
}

impl FromStr for TimeFactor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(_, label)| label.eq_ignore_ascii_case(s.trim()))
            .map(|(factor, _)| *factor)
            .ok_or_else(|| format!("未知的工時單位: {s}"))
    }
}

impl fmt::Display for TimeFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = Self::ALL
            .iter()
            .find(|(factor, _)| factor == self)
            .map(|(_, label)| *label)
            .unwrap_or_default();
        write!(f, "{label}")
    }
}

/// 工序行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLine {
    /// 工序行ID
    pub id: String,

    /// 所屬製造方法ID
    pub make_method_id: String,

    /// 製程ID
    pub process_id: String,

    /// 工作中心ID
    pub work_center_id: Option<String>,

    /// 同層排序（同一製造方法內唯一）
    pub order: i32,

    /// 排序方式
    pub operation_order: OperationOrder,

    pub operation_type: OperationType,

    pub setup_time: Decimal,
    pub setup_unit: TimeFactor,
    pub labor_time: Decimal,
    pub labor_unit: TimeFactor,
    pub machine_time: Decimal,
    pub machine_unit: TimeFactor,

    /// 人工費率（每小時）
    pub labor_rate: Decimal,

    /// 機台費率（每小時）
    pub machine_rate: Decimal,

    /// 間接費率（每小時，套用於人工與機台工時）
    pub overhead_rate: Decimal,

    /// 委外每件單價
    pub operation_unit_cost: Decimal,

    /// 工序最低成本
    pub operation_minimum_cost: Decimal,

    pub status: Option<OperationStatus>,

    /// 自訂欄位（不參與計算）
    pub custom_fields: serde_json::Value,
}

impl OperationLine {
    /// 創建新的廠內工序
    pub fn new(
        id: impl Into<String>,
        make_method_id: impl Into<String>,
        process_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            make_method_id: make_method_id.into(),
            process_id: process_id.into(),
            work_center_id: None,
            order: 0,
            operation_order: OperationOrder::AfterPrevious,
            operation_type: OperationType::Inside,
            setup_time: Decimal::ZERO,
            setup_unit: TimeFactor::TotalMinutes,
            labor_time: Decimal::ZERO,
            labor_unit: TimeFactor::MinutesPerPiece,
            machine_time: Decimal::ZERO,
            machine_unit: TimeFactor::MinutesPerPiece,
            labor_rate: Decimal::ZERO,
            machine_rate: Decimal::ZERO,
            overhead_rate: Decimal::ZERO,
            operation_unit_cost: Decimal::ZERO,
            operation_minimum_cost: Decimal::ZERO,
            status: None,
            custom_fields: serde_json::Value::Null,
        }
    }

    /// 建構器模式：設置排序
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 建構器模式：設置排序方式
    pub fn with_operation_order(mut self, operation_order: OperationOrder) -> Self {
        self.operation_order = operation_order;
        self
    }

    /// 建構器模式：設置工作中心
    pub fn with_work_center(mut self, work_center_id: impl Into<String>) -> Self {
        self.work_center_id = Some(work_center_id.into());
        self
    }

    /// 建構器模式：設置準備工時
    pub fn with_setup(mut self, time: Decimal, unit: TimeFactor) -> Self {
        self.setup_time = time;
        self.setup_unit = unit;
        self
    }

    /// 建構器模式：設置人工工時與費率
    pub fn with_labor(mut self, time: Decimal, unit: TimeFactor, rate: Decimal) -> Self {
        self.labor_time = time;
        self.labor_unit = unit;
        self.labor_rate = rate;
        self
    }

    /// 建構器模式：設置機台工時與費率
    pub fn with_machine(mut self, time: Decimal, unit: TimeFactor, rate: Decimal) -> Self {
        self.machine_time = time;
        self.machine_unit = unit;
        self.machine_rate = rate;
        self
    }

    /// 建構器模式：設置間接費率
    pub fn with_overhead_rate(mut self, rate: Decimal) -> Self {
        self.overhead_rate = rate;
        self
    }

    /// 建構器模式：設為委外工序
    pub fn outside(mut self, unit_cost: Decimal) -> Self {
        self.operation_type = OperationType::Outside;
        self.operation_unit_cost = unit_cost;
        self
    }

    /// 建構器模式：設置最低成本
    pub fn with_minimum_cost(mut self, minimum_cost: Decimal) -> Self {
        self.operation_minimum_cost = minimum_cost;
        self
    }

    /// 建構器模式：設置狀態
    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// 驗證工時、費率與成本非負
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("setup_time", self.setup_time),
            ("labor_time", self.labor_time),
            ("machine_time", self.machine_time),
            ("labor_rate", self.labor_rate),
            ("machine_rate", self.machine_rate),
            ("overhead_rate", self.overhead_rate),
            ("operation_unit_cost", self.operation_unit_cost),
            ("operation_minimum_cost", self.operation_minimum_cost),
        ];

        match fields.iter().find(|(_, value)| *value < Decimal::ZERO) {
            Some(&(field, value)) => Err(MethodError::InvalidQuantity {
                node_id: self.id.clone(),
                field,
                value,
            }),
            None => Ok(()),
        }
    }
}
