//! Engine configuration for [`AgentMemory`](crate::AgentMemory).
//!
//! Set once at construction and immutable for the engine's lifetime. The
//! struct deserializes from the plain options object used by agent hosts,
//! with every key optional:
//!
//! ```json
//! {
//!   "instructions": "You are a browser agent.",
//!   "promptCaching": true,
//!   "thoughtLimit": 20,
//!   "minScreenshots": 3,
//!   "maxScreenshots": 12
//! }
//! ```
//!
//! Or in code, with builder methods:
//!
//! ```
//! use memoir::MemoryConfig;
//!
//! let config = MemoryConfig::default()
//!     .with_instructions("You are a browser agent.")
//!     .with_prompt_caching(true)
//!     .with_screenshot_bounds(2, 8);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of thought records kept visible.
pub const DEFAULT_THOUGHT_LIMIT: usize = 20;

/// Screenshots kept visible after a batch drop.
pub const DEFAULT_MIN_SCREENSHOTS: usize = 3;

/// Visible screenshots that trigger a batch drop once exceeded.
pub const DEFAULT_MAX_SCREENSHOTS: usize = 12;

/// Configuration for the memory engine.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryConfig {
    /// System instructions carried alongside the log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Freeze visibility between renders so the rendered prefix stays
    /// stable for provider-side prompt caching. Default: `false`.
    pub prompt_caching: bool,
    /// Thought records kept visible when a record's policy has no limit.
    /// Default: `20`.
    pub thought_limit: usize,
    /// Screenshots kept visible after a recompute. Default: `3`.
    pub min_screenshots: usize,
    /// Visible screenshots tolerated before a batch drop. Default: `12`.
    pub max_screenshots: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            instructions: None,
            prompt_caching: false,
            thought_limit: DEFAULT_THOUGHT_LIMIT,
            min_screenshots: DEFAULT_MIN_SCREENSHOTS,
            max_screenshots: DEFAULT_MAX_SCREENSHOTS,
        }
    }
}

impl MemoryConfig {
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Enable or disable frozen masks for prompt-cache stability.
    pub fn with_prompt_caching(mut self, enabled: bool) -> Self {
        self.prompt_caching = enabled;
        self
    }

    pub fn with_thought_limit(mut self, limit: usize) -> Self {
        self.thought_limit = limit;
        self
    }

    /// Set the screenshot floor (kept after a drop) and ceiling (drop trigger).
    pub fn with_screenshot_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_screenshots = min;
        self.max_screenshots = max;
        self
    }

    /// Reject configurations the mask evaluator cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_screenshots > self.max_screenshots {
            return Err(ConfigError::ScreenshotBounds {
                min: self.min_screenshots,
                max: self.max_screenshots,
            });
        }
        Ok(())
    }
}
