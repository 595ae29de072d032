//! Visibility masks: which records of the log the model gets to see.
//!
//! A mask is one boolean per log record, index-aligned with the log. It is
//! derived state: recomputed from `(log, config)` or reused from the previous
//! render, never persisted.
//!
//! Two evaluation paths exist:
//!
//! 1. **Full recompute** ([`recompute`]). Every record starts visible. Thought
//!    records keep only the most recent `limit` visible; screenshot records
//!    keep only the most recent `minScreenshots` visible. A pure function of
//!    the log and configuration.
//!
//! 2. **Frozen reuse** (prompt caching enabled). The previous mask is kept
//!    as-is and padded with `true` for newly appended records, so the
//!    rendered prefix is byte-identical to the previous render and the
//!    provider's prompt cache stays warm. Once the padded mask would show
//!    more than `maxScreenshots` screenshots, the frozen mask is dropped and a
//!    full recompute snaps the screenshot count down to the floor. Dropping
//!    in batches means one cache miss per `max - min` screenshots instead of
//!    one per render.

use crate::config::MemoryConfig;
use crate::log::ObservationLog;
use crate::retention::RetentionPolicy;
use tracing::{debug, trace};

/// One visibility bit per log record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityMask {
    bits: Vec<bool>,
}

impl VisibilityMask {
    /// A mask with every one of `len` records visible.
    pub fn all_visible(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Number of visible records.
    pub fn visible_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Extend to `len` records, marking the new ones visible. Existing bits
    /// are never touched.
    fn pad_to(&mut self, len: usize) {
        if self.bits.len() < len {
            self.bits.resize(len, true);
        }
    }

    fn hide(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = false;
        }
    }
}

impl From<Vec<bool>> for VisibilityMask {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

/// The engine's stored visibility decision between renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MaskState {
    /// No decision yet: fresh engine, freshly imported log, or prompt
    /// caching disabled.
    #[default]
    NoMask,
    /// The decision committed by the last successful render.
    Frozen(VisibilityMask),
}

impl MaskState {
    pub fn previous(&self) -> Option<&VisibilityMask> {
        match self {
            Self::NoMask => None,
            Self::Frozen(mask) => Some(mask),
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen(_))
    }
}

/// How a mask was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskOutcome {
    /// Computed from scratch because there was nothing to reuse.
    Recomputed,
    /// Previous mask reused and padded for new records.
    Reused,
    /// Previous mask discarded because it would show too many screenshots.
    BatchDropped,
}

/// Result of [`evaluate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskEvaluation {
    pub mask: VisibilityMask,
    pub outcome: MaskOutcome,
}

/// Number of screenshot-tagged records the mask leaves visible.
pub fn visible_screenshots(log: &ObservationLog, mask: &VisibilityMask) -> usize {
    log.iter()
        .zip(mask.iter())
        .filter(|(obs, visible)| *visible && obs.is_screenshot())
        .count()
}

/// Compute a mask from scratch.
///
/// Walks the log newest-first, counting records of each retention kind. A
/// thought record stays visible while fewer than its limit of newer thought
/// records exist; a screenshot stays visible while fewer than
/// `min_screenshots` newer screenshots exist.
pub fn recompute(log: &ObservationLog, config: &MemoryConfig) -> VisibilityMask {
    let mut mask = VisibilityMask::all_visible(log.len());
    let mut newer_thoughts = 0usize;
    let mut newer_screenshots = 0usize;
    let mut hidden_thoughts = 0usize;
    let mut hidden_screenshots = 0usize;

    for (index, obs) in log.iter().enumerate().rev() {
        match obs.retention() {
            None => {}
            Some(RetentionPolicy::Thought { limit }) => {
                let limit = limit.unwrap_or(config.thought_limit);
                if newer_thoughts >= limit {
                    mask.hide(index);
                    hidden_thoughts += 1;
                }
                newer_thoughts += 1;
            }
            Some(RetentionPolicy::Screenshot) => {
                if newer_screenshots >= config.min_screenshots {
                    mask.hide(index);
                    hidden_screenshots += 1;
                }
                newer_screenshots += 1;
            }
        }
    }

    debug!(
        "Mask recomputed: {} records, hidden {hidden_thoughts}/{newer_thoughts} thoughts, \
         {hidden_screenshots}/{newer_screenshots} screenshots",
        log.len()
    );
    mask
}

/// Produce the mask for the current render.
///
/// With prompt caching enabled and a previous mask available, the previous
/// mask is padded and reused unless that would leave more than
/// `max_screenshots` screenshots visible. Otherwise, and whenever prompt
/// caching is disabled, the mask is recomputed.
pub fn evaluate(
    log: &ObservationLog,
    previous: Option<&VisibilityMask>,
    config: &MemoryConfig,
) -> MaskEvaluation {
    let Some(previous) = previous.filter(|_| config.prompt_caching) else {
        return MaskEvaluation {
            mask: recompute(log, config),
            outcome: MaskOutcome::Recomputed,
        };
    };

    if previous.len() > log.len() {
        // Mask belongs to a longer log; it cannot describe this one.
        debug!(
            "Discarding stale mask ({} bits for {} records)",
            previous.len(),
            log.len()
        );
        return MaskEvaluation {
            mask: recompute(log, config),
            outcome: MaskOutcome::Recomputed,
        };
    }

    let mut padded = previous.clone();
    padded.pad_to(log.len());
    let screenshots = visible_screenshots(log, &padded);

    if screenshots > config.max_screenshots {
        debug!(
            "Batch drop: {screenshots} visible screenshots exceed max {}, keeping {}",
            config.max_screenshots, config.min_screenshots
        );
        return MaskEvaluation {
            mask: recompute(log, config),
            outcome: MaskOutcome::BatchDropped,
        };
    }

    trace!(
        "Reusing frozen mask: {} -> {} records, {screenshots} screenshots visible",
        previous.len(),
        log.len()
    );
    MaskEvaluation {
        mask: padded,
        outcome: MaskOutcome::Reused,
    }
}
