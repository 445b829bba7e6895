// Monitor Module - Bounded session state derived from the feed

pub mod classifier;
pub mod notify;
pub mod session;
pub mod stats;
pub mod window;

// Re-export commonly used items
pub use classifier::{classify, Classification};
pub use notify::{BellNotifier, LogNotifier, NotificationError, NotificationSink, NullNotifier};
pub use session::MonitorSession;
pub use stats::SessionStats;
pub use window::WindowBuffer;
