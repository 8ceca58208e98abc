//! Shared accumulator for match hits.
//!
//! A [`MatchResult`] is handed to every engine taking part in matching one
//! event. Engines append (evaluable, group) hits from many worker threads at
//! once; later phases read per-group counts back to decide whether a hit is
//! worth recording.

use crate::ir::{EvaluableId, GroupId, StoredExpressionPart};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

type GroupCounts = HashMap<GroupId, usize>;

/// Concurrency-safe multiset of (evaluable, group) hits.
#[derive(Debug, Default)]
pub struct MatchResult {
    hits: Mutex<HashMap<EvaluableId, GroupCounts>>,
}

impl MatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EvaluableId, GroupCounts>> {
        // Counters are only ever incremented, so a poisoned map is still consistent.
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one hit for `group_id` of `evaluable_id`.
    pub fn add(&self, evaluable_id: EvaluableId, group_id: GroupId) {
        let mut hits = self.lock();
        *hits
            .entry(evaluable_id)
            .or_default()
            .entry(group_id)
            .or_insert(0) += 1;
    }

    /// Record a hit for every stored part, under a single lock acquisition.
    pub fn add_parts<'a, I>(&self, parts: I)
    where
        I: IntoIterator<Item = &'a StoredExpressionPart>,
    {
        let mut hits = self.lock();
        for part in parts {
            *hits
                .entry(part.evaluable_id)
                .or_default()
                .entry(part.group_id)
                .or_insert(0) += 1;
        }
    }

    /// Number of hits recorded so far for the given group.
    pub fn group_matches(&self, evaluable_id: EvaluableId, group_id: GroupId) -> usize {
        self.lock()
            .get(&evaluable_id)
            .and_then(|groups| groups.get(&group_id))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct evaluables with at least one hit.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, evaluable_id: EvaluableId) -> bool {
        self.lock().contains_key(&evaluable_id)
    }

    pub fn evaluable_ids(&self) -> HashSet<EvaluableId> {
        self.lock().keys().copied().collect()
    }

    /// Per-group hit counts for one evaluable.
    pub fn groups_for(&self, evaluable_id: EvaluableId) -> GroupCounts {
        self.lock().get(&evaluable_id).cloned().unwrap_or_default()
    }

    /// Fold all hits of `other` into this result.
    pub fn merge(&self, other: &MatchResult) {
        let incoming = other.lock().clone();
        let mut hits = self.lock();
        for (evaluable_id, groups) in incoming {
            let entry = hits.entry(evaluable_id).or_default();
            for (group_id, count) in groups {
                *entry.entry(group_id).or_insert(0) += count;
            }
        }
    }

    /// Evaluables with at least one group whose hit count reached its declared size.
    ///
    /// Groups declaring a size of zero count as satisfied by any hit. The set is
    /// still approximate and must be confirmed by exact evaluation.
    pub fn candidates(&self) -> HashSet<EvaluableId> {
        self.lock()
            .iter()
            .filter(|(_, groups)| {
                groups
                    .iter()
                    .any(|(group_id, count)| *count >= usize::from(group_id.size()))
            })
            .map(|(evaluable_id, _)| *evaluable_id)
            .collect()
    }

    pub fn into_inner(self) -> HashMap<EvaluableId, GroupCounts> {
        self.hits.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
