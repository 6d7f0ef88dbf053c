pub mod allocation;
pub mod engine;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod shared_math;
pub mod timeline;

pub use allocation::{Allocation, Position};
pub use engine::{compute_metrics, compute_performance_timeline, DEFAULT_RISK_FREE_RATE_PCT};
pub use metrics::{MetricsAggregator, MetricsBreakdown};
pub use models::*;
pub use normalizer::{normalize, NormalizedSeries};
pub use timeline::TimelineReconstructor;
