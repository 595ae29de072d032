//! Convenience re-exports for common `memoir` types.
//!
//! ```ignore
//! use memoir::prelude::*;
//! ```
//!
//! Mask internals and snapshot wire types are left out; import those from
//! [`mask`](crate::mask) and [`snapshot`](crate::snapshot) when needed.

pub use crate::config::MemoryConfig;
pub use crate::error::MemoryError;
pub use crate::memory::AgentMemory;
pub use crate::observation::{ContentPart, ImageFormat, Media, Observation, ObservationSource};
pub use crate::retention::RetentionPolicy;
pub use crate::snapshot::MemorySnapshot;
pub use crate::{MessagePart, MessageRole, MultiMediaMessage};
