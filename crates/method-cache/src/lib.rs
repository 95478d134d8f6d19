//! # Method Cache
//!
//! 解析結果緩存與增量重算

pub mod dirty_tracking;
pub mod incremental;

// Re-export 主要類型
pub use dirty_tracking::DirtyTracker;
pub use incremental::{CacheStats, IncrementalResolver, ResolutionCache};
