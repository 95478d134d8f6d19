//! # Method Engine
//!
//! 製造方法解析與成本累計引擎
//!
//! - [`method_core`]：資料模型、資料來源介面、配置與錯誤
//! - [`method_calc`]：方法樹建構、數量傳播、成本累計、扁平化與快照
//! - [`method_cache`]：解析結果緩存與增量重算

pub use method_cache;
pub use method_calc;
pub use method_core;

pub use method_cache::{IncrementalResolver, ResolutionCache};
pub use method_calc::{
    CostBreakdown, FlatRow, FlattenOrder, Flattener, MethodResolver, MethodTree, ResolvedMethod,
    TreeBuilder,
};
pub use method_core::{
    CancellationToken, CostProvider, EngineConfig, MemoryNodeStore, MethodError, NodeStore,
};
