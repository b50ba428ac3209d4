//! Processing statistics for the rep counter.

pub mod counters;

// Re-export commonly used types
pub use counters::{
    create_shared_stats, create_shared_stats_with_persistence, SessionStats, SharedSessionStats,
    StatsSnapshot,
};
