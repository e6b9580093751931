//! The platform adapter interface: a
//! polymorphic contract over each external content platform, plus a
//! registry that looks adapters up by platform tag.

pub mod adapter;
pub mod error;
pub mod mock;
pub mod registry;

pub use adapter::{AdminCapableAdapter, ChannelInfo, ParsedPostUrl, PlatformAdapter, PostMetrics};
pub use error::PlatformError;
pub use mock::MockPlatformAdapter;
pub use registry::AdapterRegistry;
