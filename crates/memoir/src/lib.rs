//! Context memory engine for LLM-driven agents.
//!
//! `memoir` accumulates a growing log of interaction records (thoughts,
//! actions taken, tool results, screenshots) and decides, on every render,
//! which subset of that log the model sees and in what form. The core
//! abstraction is [`AgentMemory`]: append observations as the agent loop
//! produces them, call [`render()`](AgentMemory::render) before every model
//! call, and hand the returned messages to your model client.
//!
//! # Getting started
//!
//! ```
//! use memoir::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), MemoryError> {
//! let config = MemoryConfig::default()
//!     .with_instructions("You are a browser agent.")
//!     .with_prompt_caching(true);
//! let mut memory = AgentMemory::new(config)?;
//!
//! memory.record_observation(Observation::new(
//!     ObservationSource::Task,
//!     MessageRole::User,
//!     [ContentPart::text("Log in and open the billing page.")],
//! ))?;
//! memory.record_thought("Start at the login form.")?;
//!
//! let messages = memory.render().await?;
//! assert_eq!(messages.len(), 2);
//!
//! // Full-fidelity snapshot, independent of what was rendered.
//! let json = memory.export()?.to_json()?;
//! # let _ = json;
//! # Ok(())
//! # }
//! ```
//!
//! # Where to find things
//!
//! - **Records:** [`Observation`] with its [`ObservationSource`] class,
//!   [`ContentPart`]s (text and [`Media`]) and optional [`RetentionPolicy`].
//! - **Visibility:** [`mask`] computes the per-record decision. Thoughts keep
//!   a sliding window; screenshots are budgeted between `minScreenshots` and
//!   `maxScreenshots`, dropped in batches so the rendered prefix stays stable
//!   for provider prompt caching.
//! - **Rendering:** [`render`] projects visible records into
//!   [`MultiMediaMessage`]s. [`AgentMemory::render_flat`] dumps everything for
//!   debugging.
//! - **Persistence:** [`snapshot`] defines the JSON snapshot schema used by
//!   [`AgentMemory::export`] and [`AgentMemory::import`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`observation`] | Observation records, source classes, content parts, media |
//! | [`retention`] | Per-record retention policies |
//! | [`log`] | Append-only observation log |
//! | [`mask`] | Visibility masks, frozen-mask reuse and batch drops |
//! | [`render`] | Model-facing and flat rendering |
//! | [`snapshot`] | Lossless export/import |
//! | [`memory`] | The [`AgentMemory`] engine |
//! | [`config`] | [`MemoryConfig`] options |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod log;
pub mod mask;
pub mod memory;
pub mod observation;
pub mod prelude;
pub mod render;
pub mod retention;
pub mod snapshot;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use config::MemoryConfig;
pub use error::{CodecError, ConfigError, MemoryError};
pub use log::ObservationLog;
pub use mask::{MaskOutcome, MaskState, VisibilityMask};
pub use memory::{AgentMemory, RenderReport};
pub use observation::{
    ContentPart, ImageFormat, Media, Observation, ObservationSource, UnknownSource,
};
pub use retention::RetentionPolicy;
pub use snapshot::MemorySnapshot;

// ── Message types ──────────────────────────────────────────────────

/// Role a record is attributed to when rendered.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// One part of a rendered message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text {
        text: String,
    },
    /// Base64-encoded image.
    Image {
        #[serde(rename = "mimeType")]
        media_type: String,
        data: String,
    },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// A provider-agnostic multi-part message, ready for a model client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MultiMediaMessage {
    pub role: MessageRole,
    pub content: Vec<MessagePart>,
}

impl MultiMediaMessage {
    pub fn new(role: MessageRole, content: Vec<MessagePart>) -> Self {
        Self { role, content }
    }

    /// Text parts concatenated in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(MessagePart::as_text)
            .collect()
    }
}
