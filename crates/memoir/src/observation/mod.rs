//! Observation records: the immutable entries of the interaction log.
//!
//! One observation is created per agent-loop event (a thought, an action
//! taken, a tool result, an environment snapshot) and appended to the
//! [`ObservationLog`](crate::log::ObservationLog). Fields are private so a
//! record cannot change after construction.

pub mod content;
pub mod source;

pub use content::{ContentPart, ImageFormat, Media};
pub use source::{ObservationSource, UnknownSource};

use crate::MessageRole;
use crate::retention::RetentionPolicy;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A single immutable record in the interaction log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    source: ObservationSource,
    role: MessageRole,
    timestamp: i64,
    content: Vec<ContentPart>,
    retention: Option<RetentionPolicy>,
}

impl Observation {
    /// Create a record stamped with the current time and no retention policy.
    pub fn new(
        source: ObservationSource,
        role: MessageRole,
        content: impl IntoIterator<Item = ContentPart>,
    ) -> Self {
        Self {
            source,
            role,
            timestamp: now_millis(),
            content: content.into_iter().collect(),
            retention: None,
        }
    }

    /// Attach a retention policy.
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Override the creation timestamp (milliseconds since the Unix epoch).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// A model thought, attributed to the assistant.
    pub fn thought(text: impl Into<String>, retention: RetentionPolicy) -> Self {
        Self::new(
            ObservationSource::Thought,
            MessageRole::Assistant,
            [ContentPart::text(text)],
        )
        .with_retention(retention)
    }

    /// An action the agent took, described as text.
    pub fn action_taken(action: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            ObservationSource::action_taken(action),
            MessageRole::Assistant,
            [ContentPart::text(description)],
        )
    }

    /// The result of an action, reported back to the model.
    pub fn action_result(
        action: impl Into<String>,
        content: impl IntoIterator<Item = ContentPart>,
    ) -> Self {
        Self::new(
            ObservationSource::action_result(action),
            MessageRole::User,
            content,
        )
    }

    /// An environment screenshot from a connector, subject to the
    /// screenshot budget.
    pub fn screenshot(connector: impl Into<String>, media: Media) -> Self {
        Self::new(
            ObservationSource::connector(connector),
            MessageRole::User,
            [ContentPart::Media(media)],
        )
        .with_retention(RetentionPolicy::Screenshot)
    }

    pub fn source(&self) -> &ObservationSource {
        &self.source
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn content(&self) -> &[ContentPart] {
        &self.content
    }

    pub fn retention(&self) -> Option<RetentionPolicy> {
        self.retention
    }

    pub fn is_screenshot(&self) -> bool {
        self.retention.is_some_and(|r| r.is_screenshot())
    }

    /// Text spans joined with newlines. Media items are skipped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
