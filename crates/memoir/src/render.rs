//! Projection of the log into model-facing messages.
//!
//! [`render`] walks the visible records in log order and produces one
//! [`MultiMediaMessage`] per record. Records authored by the agent (actions
//! taken, thoughts) get a `[HH:MM:SS]: ` prefix part so the model can place
//! its own history in time; everything else renders unmodified.
//!
//! [`render_flat`] ignores the mask and message boundaries and returns every
//! content part of every record in one flat sequence. It is meant for
//! debugging dumps only: it bypasses both the visibility budget and prompt
//! cache stability.

use crate::error::{CodecError, MemoryError};
use crate::log::ObservationLog;
use crate::mask::VisibilityMask;
use crate::observation::{ContentPart, Observation};
use crate::{MessagePart, MultiMediaMessage};
use chrono::{DateTime, Local, Utc};
use futures::future::try_join_all;

/// Format a millisecond timestamp as the `[HH:MM:SS]: ` prefix, local time.
///
/// Fails for timestamps outside the range chrono can represent.
pub fn time_prefix(timestamp: i64) -> Result<String, CodecError> {
    let utc: DateTime<Utc> = DateTime::from_timestamp_millis(timestamp)
        .ok_or(CodecError::TimestampOutOfRange(timestamp))?;
    Ok(format!("[{}]: ", utc.with_timezone(&Local).format("%H:%M:%S")))
}

/// Encode one content part for the model client.
fn encode_part(index: usize, part: &ContentPart) -> Result<MessagePart, MemoryError> {
    match part {
        ContentPart::Text(text) => Ok(MessagePart::text(text.clone())),
        ContentPart::Media(media) => {
            let data = media
                .to_base64()
                .map_err(|e| MemoryError::codec(index, e))?;
            Ok(MessagePart::Image {
                media_type: media.format().mime_type().to_string(),
                data,
            })
        }
    }
}

/// Content parts of a record, with the time prefix for authored sources.
fn observation_parts(index: usize, obs: &Observation) -> Result<Vec<MessagePart>, MemoryError> {
    let mut parts = Vec::with_capacity(obs.content().len() + 1);
    if obs.source().is_authored() {
        let prefix = time_prefix(obs.timestamp()).map_err(|e| MemoryError::codec(index, e))?;
        parts.push(MessagePart::text(prefix));
    }
    for part in obs.content() {
        parts.push(encode_part(index, part)?);
    }
    Ok(parts)
}

/// Render a single record as a message attributed to its role.
pub async fn render_observation(
    index: usize,
    obs: &Observation,
) -> Result<MultiMediaMessage, MemoryError> {
    Ok(MultiMediaMessage {
        role: obs.role(),
        content: observation_parts(index, obs)?,
    })
}

/// Render the records `mask` leaves visible, in log order.
///
/// The visible set is fixed before any per-record work starts. Per-record
/// futures are joined in input order, so the output order is the log order
/// regardless of which record finishes first. Any codec failure aborts the
/// whole render.
pub async fn render(
    log: &ObservationLog,
    mask: &VisibilityMask,
) -> Result<Vec<MultiMediaMessage>, MemoryError> {
    let decisions = log.decide(mask).ok_or(MemoryError::MaskMismatch {
        mask: mask.len(),
        log: log.len(),
    })?;
    let visible: Vec<(usize, &Observation)> = decisions
        .filter(|(_, _, visible)| *visible)
        .map(|(index, obs, _)| (index, obs))
        .collect();

    try_join_all(
        visible
            .into_iter()
            .map(|(index, obs)| render_observation(index, obs)),
    )
    .await
}

/// Every content part of every record, mask and roles ignored.
pub fn render_flat(log: &ObservationLog) -> Result<Vec<MessagePart>, MemoryError> {
    let mut parts = Vec::new();
    for (index, obs) in log.iter().enumerate() {
        parts.extend(observation_parts(index, obs)?);
    }
    Ok(parts)
}
