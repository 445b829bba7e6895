// Fraud Monitor - Real-time transaction alert monitoring
// Consumes the inference service's live feed, classifies transactions,
// and maintains bounded session state for the dashboard.

pub mod core;
pub mod feed;
pub mod monitor;
pub mod pipeline;

// Re-export the main entry points for convenience
pub use crate::core::{ConnectionStatus, MonitorConfig, TransactionEvent, UpstreamNotice};
pub use crate::feed::{FeedConnection, FeedMessage, FeedParser};
pub use crate::monitor::{
    classify, Classification, MonitorSession, NotificationSink, SessionStats, WindowBuffer,
};
pub use crate::pipeline::{MonitorPipeline, PipelineStats};
