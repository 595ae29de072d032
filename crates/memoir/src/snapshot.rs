//! Full-fidelity snapshots of the observation log.
//!
//! A snapshot always covers the whole log, regardless of visibility, and
//! round-trips losslessly: media bytes are base64-encoded on export and
//! decoded back to byte-identical form on import. Masks are never part of
//! a snapshot.
//!
//! Wire format:
//!
//! ```json
//! {
//!   "instructions": "optional",
//!   "observations": [
//!     {
//!       "source": "connector:web",
//!       "role": "user",
//!       "timestamp": 1704112496000,
//!       "data": [
//!         {"type": "text", "text": "Current page"},
//!         {"type": "media", "format": "png", "storage": "base64", "base64": "iVBORw0..."}
//!       ],
//!       "options": {"type": "screenshot"}
//!     }
//!   ]
//! }
//! ```

use crate::MessageRole;
use crate::error::{CodecError, MemoryError};
use crate::log::ObservationLog;
use crate::observation::{ContentPart, ImageFormat, Media, Observation, ObservationSource};
use crate::retention::RetentionPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The only media storage scheme snapshots use.
pub const BASE64_STORAGE: &str = "base64";

/// Serializable image of the memory engine.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq, Default)]
pub struct MemorySnapshot {
    /// System instructions, omitted when none are configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Every record of the log, in log order.
    pub observations: Vec<StoredObservation>,
}

/// One serialized observation.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct StoredObservation {
    #[schemars(with = "String")]
    pub source: ObservationSource,
    pub role: MessageRole,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Content parts in order.
    pub data: Vec<StoredPart>,
    /// Retention policy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RetentionPolicy>,
}

/// A serialized content part.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredPart {
    Text {
        text: String,
    },
    Media {
        /// Image format tag (`png`, `jpeg`, `webp`, `gif`).
        format: String,
        /// Always `base64`.
        storage: String,
        base64: String,
    },
}

impl StoredPart {
    fn encode(part: &ContentPart) -> Result<Self, CodecError> {
        match part {
            ContentPart::Text(text) => Ok(Self::Text { text: text.clone() }),
            ContentPart::Media(media) => Ok(Self::Media {
                format: media.format().as_str().to_string(),
                storage: BASE64_STORAGE.to_string(),
                base64: media.to_base64()?,
            }),
        }
    }

    fn decode(&self) -> Result<ContentPart, CodecError> {
        match self {
            Self::Text { text } => Ok(ContentPart::Text(text.clone())),
            Self::Media {
                format,
                storage,
                base64,
            } => {
                if storage != BASE64_STORAGE {
                    return Err(CodecError::UnsupportedStorage(storage.clone()));
                }
                let format = ImageFormat::parse(format)?;
                Ok(ContentPart::Media(Media::from_base64(format, base64)?))
            }
        }
    }
}

impl StoredObservation {
    fn encode(index: usize, obs: &Observation) -> Result<Self, MemoryError> {
        let data = obs
            .content()
            .iter()
            .map(StoredPart::encode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MemoryError::codec(index, e))?;
        Ok(Self {
            source: obs.source().clone(),
            role: obs.role(),
            timestamp: obs.timestamp(),
            data,
            options: obs.retention(),
        })
    }

    fn decode(&self, index: usize) -> Result<Observation, MemoryError> {
        let content = self
            .data
            .iter()
            .map(StoredPart::decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MemoryError::codec(index, e))?;
        if content.is_empty() {
            return Err(MemoryError::EmptyObservation);
        }
        let obs = Observation::new(self.source.clone(), self.role, content)
            .with_timestamp(self.timestamp);
        Ok(match self.options {
            Some(policy) => obs.with_retention(policy),
            None => obs,
        })
    }
}

/// Snapshot every record of `log`. Empty instructions are omitted.
pub fn export(
    instructions: Option<&str>,
    log: &ObservationLog,
) -> Result<MemorySnapshot, MemoryError> {
    let observations = log
        .iter()
        .enumerate()
        .map(|(index, obs)| StoredObservation::encode(index, obs))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MemorySnapshot {
        instructions: instructions
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        observations,
    })
}

/// Rebuild records from a snapshot, in snapshot order. Fails on the first
/// record that cannot be decoded; nothing is partially returned.
pub fn import(snapshot: &MemorySnapshot) -> Result<Vec<Observation>, MemoryError> {
    snapshot
        .observations
        .iter()
        .enumerate()
        .map(|(index, stored)| stored.decode(index))
        .collect()
}

impl MemorySnapshot {
    pub fn to_json(&self) -> Result<String, MemoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, MemoryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file.
    pub fn read_from(path: &Path) -> Result<Self, MemoryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// JSON Schema describing the snapshot format.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(MemorySnapshot);
        serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }
}
