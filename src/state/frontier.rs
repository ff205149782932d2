//! In-memory frontier rebuilt from the account directory
//!
//! The directory is the source of truth. The frontier is reloaded at the top
//! of every seed iteration so that a state drift from a crashed run cannot
//! leak into dedup decisions.

use crate::storage::{AccountDirectory, StorageResult};
use std::collections::{HashSet, VecDeque};

/// Visited and eligible identifiers, keyed by the directory's visited flag
#[derive(Debug, Clone, Default)]
pub struct FrontierState {
    /// Accounts already expanded as seeds
    checked: HashSet<String>,

    /// Discovered accounts awaiting expansion, in directory order
    eligible: VecDeque<String>,

    /// Mirror of `eligible` for membership checks
    eligible_index: HashSet<String>,
}

impl FrontierState {
    /// Reads a fresh frontier from the directory
    pub fn load(directory: &dyn AccountDirectory) -> StorageResult<Self> {
        let checked = directory.list(true)?;
        let eligible = directory.list(false)?;
        Ok(Self::from_lists(checked, eligible))
    }

    /// Builds a frontier from explicit visited and unvisited lists
    pub fn from_lists(checked: Vec<String>, eligible: Vec<String>) -> Self {
        let checked: HashSet<String> = checked.into_iter().collect();
        let eligible_index: HashSet<String> = eligible.iter().cloned().collect();
        Self {
            checked,
            eligible: eligible.into_iter().collect(),
            eligible_index,
        }
    }

    /// Returns true if the identifier is already visited or awaiting expansion
    pub fn contains(&self, id: &str) -> bool {
        self.checked.contains(id) || self.eligible_index.contains(id)
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.contains(id)
    }

    pub fn is_eligible(&self, id: &str) -> bool {
        self.eligible_index.contains(id)
    }

    /// Appends a newly discovered identifier to the eligible queue
    ///
    /// Returns false if the identifier was already known.
    pub fn push_eligible(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.eligible_index.insert(id.to_string());
        self.eligible.push_back(id.to_string());
        true
    }

    /// Removes and returns the head of the eligible queue
    pub fn pop_next(&mut self) -> Option<String> {
        let next = self.eligible.pop_front()?;
        self.eligible_index.remove(&next);
        Some(next)
    }

    /// Moves an identifier into the visited set, dropping it from eligible
    pub fn mark_checked(&mut self, id: &str) {
        if self.eligible_index.remove(id) {
            self.eligible.retain(|queued| queued != id);
        }
        self.checked.insert(id.to_string());
    }

    /// Returns true when visited and eligible share no identifier
    pub fn is_disjoint(&self) -> bool {
        self.checked.is_disjoint(&self.eligible_index)
    }

    pub fn checked_len(&self) -> usize {
        self.checked.len()
    }

    pub fn eligible_len(&self) -> usize {
        self.eligible.len()
    }

    pub fn has_eligible(&self) -> bool {
        !self.eligible.is_empty()
    }
}
