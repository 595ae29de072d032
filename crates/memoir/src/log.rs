//! Append-only observation log.
//!
//! Insertion order is the model's turn order. Records are never reordered
//! or mutated; the only bulk operation is [`ObservationLog::replace`], used
//! when a snapshot is imported.

use crate::error::MemoryError;
use crate::mask::VisibilityMask;
use crate::observation::Observation;

/// Ordered sequence of immutable observations.
#[derive(Debug, Default, Clone)]
pub struct ObservationLog {
    records: Vec<Observation>,
}

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the end of the log.
    ///
    /// Rejects records with no content parts: the log must never hold a
    /// record with nothing to render.
    pub fn append(&mut self, observation: Observation) -> Result<(), MemoryError> {
        if observation.content().is_empty() {
            return Err(MemoryError::EmptyObservation);
        }
        self.records.push(observation);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.records.iter()
    }

    /// Most recent record matching `predicate`, scanning from the end.
    pub fn last_matching<P>(&self, predicate: P) -> Option<&Observation>
    where
        P: Fn(&Observation) -> bool,
    {
        self.records.iter().rev().find(|obs| predicate(obs))
    }

    /// Pair every record with its visibility bit.
    ///
    /// Returns `None` if the mask was computed for a log of a different
    /// length, so a stale mask can never be silently applied.
    pub fn decide<'a>(
        &'a self,
        mask: &'a VisibilityMask,
    ) -> Option<impl Iterator<Item = (usize, &'a Observation, bool)> + 'a> {
        if mask.len() != self.records.len() {
            return None;
        }
        Some(
            self.records
                .iter()
                .zip(mask.iter())
                .enumerate()
                .map(|(index, (obs, visible))| (index, obs, visible)),
        )
    }

    /// Replace every record at once, keeping the given order.
    pub(crate) fn replace(&mut self, records: Vec<Observation>) {
        self.records = records;
    }
}

impl<'a> IntoIterator for &'a ObservationLog {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRole;
    use crate::observation::ObservationSource;
    use crate::retention::RetentionPolicy;

    #[test]
    fn append_and_len() {
        let mut log = ObservationLog::new();
        assert!(log.is_empty());
        log.append(Observation::action_taken("click", "clicked"))
            .unwrap();
        assert!(!log.is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn empty_content_rejected() {
        let mut log = ObservationLog::new();
        let empty = Observation::new(ObservationSource::Task, MessageRole::User, []);
        assert!(matches!(
            log.append(empty),
            Err(MemoryError::EmptyObservation)
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn last_matching_scans_from_end() {
        let mut log = ObservationLog::new();
        log.append(Observation::thought("first", RetentionPolicy::thought(5)))
            .unwrap();
        log.append(Observation::action_taken("click", "clicked"))
            .unwrap();
        log.append(Observation::thought("second", RetentionPolicy::thought(5)))
            .unwrap();
        log.append(Observation::action_taken("type", "typed"))
            .unwrap();

        let last = log.last_matching(|o| o.source().is_thought()).unwrap();
        assert_eq!(last.text(), "second");
        assert!(log.last_matching(|o| o.is_screenshot()).is_none());
    }

    #[test]
    fn decide_requires_aligned_mask() {
        let mut log = ObservationLog::new();
        log.append(Observation::action_taken("click", "a")).unwrap();
        log.append(Observation::action_taken("click", "b")).unwrap();

        let short = VisibilityMask::all_visible(1);
        assert!(log.decide(&short).is_none());

        let mask = VisibilityMask::from(vec![false, true]);
        let pairs: Vec<_> = log
            .decide(&mask)
            .unwrap()
            .map(|(i, obs, visible)| (i, obs.text(), visible))
            .collect();
        assert_eq!(pairs, vec![(0, "a".into(), false), (1, "b".into(), true)]);
    }
}
