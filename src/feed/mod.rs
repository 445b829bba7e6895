// Feed Module - Transport and wire parsing for the realtime monitor feed

pub mod connection;
pub mod parser;

// Re-export commonly used items
pub use connection::{ConnectionError, FeedConnection, FeedConnectionStats};
pub use parser::{FeedMessage, FeedParser, ParserStats, ProtocolError};
