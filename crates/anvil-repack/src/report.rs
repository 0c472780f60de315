//! Counters describing what a repack did

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepackReport {
    /// Reference nodes paired with an existing base node
    pub nodes_matched: usize,
    /// Reference nodes with no base counterpart, created in the result
    pub nodes_created: usize,
    /// Orphaned base nodes stripped down to their structural behavior
    pub nodes_cleared: usize,
    /// Orphaned base nodes deleted outright
    pub nodes_removed: usize,
    pub behaviors_updated: usize,
    pub behaviors_added: usize,
    pub behaviors_destroyed: usize,
    /// Reference fields redirected to a rebased entity
    pub references_rewritten: usize,
    /// Non-null reference fields left pointing where they were
    pub references_preserved: usize,
}

impl RepackReport {
    /// Whether the result differs structurally from the base it was built on
    pub fn changed_structure(&self) -> bool {
        self.nodes_created + self.nodes_cleared + self.nodes_removed
            + self.behaviors_added + self.behaviors_destroyed
            > 0
    }
}
