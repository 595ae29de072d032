//! Per-record retention policies.
//!
//! A record without a policy is always visible. Tagged records compete
//! within their kind for a bounded number of visible slots; see
//! [`mask`](crate::mask) for how the bounds are applied.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How and when a record may be hidden from the rendered context.
///
/// Serialized with a `type` tag: `{"type":"thought","limit":20}` or
/// `{"type":"screenshot"}`.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// Keep only the most recent thoughts. A missing `limit` falls back to
    /// the engine's configured thought limit.
    Thought {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    /// Subject to the engine-wide screenshot budget.
    Screenshot,
}

impl RetentionPolicy {
    pub fn thought(limit: usize) -> Self {
        Self::Thought { limit: Some(limit) }
    }

    /// A thought policy that defers to the engine's limit.
    pub fn thought_default() -> Self {
        Self::Thought { limit: None }
    }

    pub fn is_screenshot(&self) -> bool {
        matches!(self, Self::Screenshot)
    }
}
