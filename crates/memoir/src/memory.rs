//! The memory engine: observation log, stored mask, rendering, snapshots.
//!
//! [`AgentMemory`] owns the log and the visibility decision committed by the
//! last render. Its mask state moves through:
//!
//! ```text
//! NoMask ──render──▶ Frozen ──render (padded, ≤ max screenshots)──▶ Frozen
//!                      │
//!                      └──render (padded > max screenshots)──▶ recompute ──▶ Frozen
//! import ──▶ NoMask
//! ```
//!
//! With prompt caching disabled the state stays `NoMask` and every render
//! recomputes from scratch.

use crate::config::MemoryConfig;
use crate::error::MemoryError;
use crate::log::ObservationLog;
use crate::mask::{self, MaskOutcome, MaskState, VisibilityMask};
use crate::observation::Observation;
use crate::render;
use crate::retention::RetentionPolicy;
use crate::snapshot::{self, MemorySnapshot};
use crate::{MessagePart, MultiMediaMessage};
use tracing::{debug, trace};

/// Messages produced by a render, plus the decision behind them.
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// One message per visible record, in log order.
    pub messages: Vec<MultiMediaMessage>,
    /// The mask applied to this render.
    pub mask: VisibilityMask,
    /// Whether the mask was reused, recomputed, or batch-dropped.
    pub outcome: MaskOutcome,
}

/// Context memory for one agent session.
///
/// # Example
///
/// ```
/// use memoir::{AgentMemory, MemoryConfig, Observation};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut memory = AgentMemory::new(MemoryConfig::default().with_prompt_caching(true)).unwrap();
/// memory.record_thought("Open the login page first.").unwrap();
/// memory
///     .record_observation(Observation::action_taken("navigate", "opened /login"))
///     .unwrap();
///
/// let messages = memory.render().await.unwrap();
/// assert_eq!(messages.len(), 2);
/// # }
/// ```
#[derive(Debug)]
pub struct AgentMemory {
    config: MemoryConfig,
    log: ObservationLog,
    mask_state: MaskState,
}

impl AgentMemory {
    /// Create an empty engine. Fails if the configuration is inconsistent.
    pub fn new(config: MemoryConfig) -> Result<Self, MemoryError> {
        config.validate()?;
        Ok(Self {
            config,
            log: ObservationLog::new(),
            mask_state: MaskState::NoMask,
        })
    }

    /// Create an engine and load `snapshot` into it. Instructions stored in
    /// the snapshot are used when the configuration has none.
    pub fn from_snapshot(
        mut config: MemoryConfig,
        snapshot: &MemorySnapshot,
    ) -> Result<Self, MemoryError> {
        if config.instructions.is_none() {
            config.instructions = snapshot.instructions.clone();
        }
        let mut memory = Self::new(config)?;
        memory.import(snapshot)?;
        Ok(memory)
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn instructions(&self) -> Option<&str> {
        self.config.instructions.as_deref()
    }

    pub fn prompt_caching(&self) -> bool {
        self.config.prompt_caching
    }

    pub fn thought_limit(&self) -> usize {
        self.config.thought_limit
    }

    pub fn min_screenshots(&self) -> usize {
        self.config.min_screenshots
    }

    pub fn max_screenshots(&self) -> usize {
        self.config.max_screenshots
    }

    /// Read-only view of the full log.
    pub fn log(&self) -> &ObservationLog {
        &self.log
    }

    /// The visibility decision committed by the last successful render.
    pub fn mask_state(&self) -> &MaskState {
        &self.mask_state
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Append an observation to the log.
    pub fn record_observation(&mut self, observation: Observation) -> Result<(), MemoryError> {
        trace!(
            "Recording observation #{}: source={}",
            self.log.len(),
            observation.source()
        );
        self.log.append(observation)
    }

    /// Append a model thought limited by the configured thought limit.
    pub fn record_thought(&mut self, text: impl Into<String>) -> Result<(), MemoryError> {
        let policy = RetentionPolicy::thought(self.config.thought_limit);
        self.record_observation(Observation::thought(text, policy))
    }

    /// Most recent record matching `predicate`.
    pub fn last_matching<P>(&self, predicate: P) -> Option<&Observation>
    where
        P: Fn(&Observation) -> bool,
    {
        self.log.last_matching(predicate)
    }

    /// Text of the most recent thought, if any.
    pub fn last_thought_text(&self) -> Option<String> {
        self.last_matching(|obs| obs.source().is_thought())
            .map(Observation::text)
    }

    /// Render the visible records as model-facing messages.
    pub async fn render(&mut self) -> Result<Vec<MultiMediaMessage>, MemoryError> {
        Ok(self.render_with_report().await?.messages)
    }

    /// Render and report which mask was applied and how it was obtained.
    ///
    /// With prompt caching enabled the mask is committed as the new frozen
    /// mask only after every record rendered successfully. A failed or
    /// abandoned render leaves the previous decision untouched.
    pub async fn render_with_report(&mut self) -> Result<RenderReport, MemoryError> {
        let evaluation = mask::evaluate(&self.log, self.mask_state.previous(), &self.config);
        let messages = render::render(&self.log, &evaluation.mask).await?;

        if self.config.prompt_caching {
            self.mask_state = MaskState::Frozen(evaluation.mask.clone());
        }

        debug!(
            "Rendered {} of {} observations ({:?})",
            messages.len(),
            self.log.len(),
            evaluation.outcome
        );
        Ok(RenderReport {
            messages,
            mask: evaluation.mask,
            outcome: evaluation.outcome,
        })
    }

    /// Every content part of every record, ignoring the mask and roles.
    /// For debugging dumps; never send this to the model.
    pub fn render_flat(&self) -> Result<Vec<MessagePart>, MemoryError> {
        render::render_flat(&self.log)
    }

    /// Snapshot the full log and instructions.
    pub fn export(&self) -> Result<MemorySnapshot, MemoryError> {
        snapshot::export(self.instructions(), &self.log)
    }

    /// Replace the log with the records of `snapshot` and forget the stored
    /// mask. On failure the engine is left unchanged.
    pub fn import(&mut self, snapshot: &MemorySnapshot) -> Result<(), MemoryError> {
        let records = snapshot::import(snapshot)?;
        debug!("Imported {} observations", records.len());
        self.log.replace(records);
        self.mask_state = MaskState::NoMask;
        Ok(())
    }
}
