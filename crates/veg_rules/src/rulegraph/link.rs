//! Directed edges between rule slots.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rulegraph::{RuleIndex, SlotIndex};

/// A directed edge from one rule's output slot to another rule's input slot.
///
/// Links are owned by the [`crate::rulegraph::layer::VegetationLayer`]; the
/// endpoint slots only hold back-references into the layer's link arena.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    /// Rule producing the value.
    pub source_rule: RuleIndex,
    /// Output slot on the source rule.
    pub source_slot: SlotIndex,
    /// Rule consuming the value.
    pub destination_rule: RuleIndex,
    /// Input slot on the destination rule.
    pub destination_slot: SlotIndex,
}

impl Link {
    pub fn new(
        source_rule: RuleIndex,
        source_slot: SlotIndex,
        destination_rule: RuleIndex,
        destination_slot: SlotIndex,
    ) -> Self {
        Self {
            source_rule,
            source_slot,
            destination_rule,
            destination_slot,
        }
    }

    /// Whether the link starts or ends at the given rule.
    pub fn touches(&self, rule: RuleIndex) -> bool {
        self.source_rule == rule || self.destination_rule == rule
    }

    /// Shift stored rule indices after `removed` was deleted from the arena.
    pub(crate) fn shift_removed_rule(&mut self, removed: RuleIndex) {
        if self.source_rule > removed {
            self.source_rule -= 1;
        }
        if self.destination_rule > removed {
            self.destination_rule -= 1;
        }
    }
}
