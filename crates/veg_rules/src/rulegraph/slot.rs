//! Input and output ports on rules.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rulegraph::{Link, LinkIndex, RuleIndex, SlotIndex};

/// A port on a rule, tagged input or output, holding an ordered list of
/// back-references into the owning layer's link arena.
///
/// The list order is insertion order and is the iteration order observed by
/// fan-in aggregators (MultiMath, the Result rule's probability input).
/// A slot never owns a link; the layer's structural API keeps the list
/// consistent with the link arena.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct Slot {
    is_input: bool,
    links: Vec<LinkIndex>,
}

impl Slot {
    pub(crate) fn input() -> Self {
        Self {
            is_input: true,
            links: Vec::new(),
        }
    }

    pub(crate) fn output() -> Self {
        Self {
            is_input: false,
            links: Vec::new(),
        }
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }

    /// Links connected to this slot, in insertion order.
    pub fn links(&self) -> &[LinkIndex] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub(crate) fn add_link(&mut self, link: LinkIndex) {
        self.links.push(link);
    }

    pub(crate) fn remove_link(&mut self, link: LinkIndex) {
        if let Some(pos) = self.links.iter().position(|&l| l == link) {
            self.links.remove(pos);
        }
    }

    /// Shift stored link indices after `removed` was deleted from the arena.
    pub(crate) fn shift_removed_link(&mut self, removed: LinkIndex) {
        for l in &mut self.links {
            if *l > removed {
                *l -= 1;
            }
        }
    }

    /// Find a connected link originating at the given output slot.
    ///
    /// Linear scan; used by editing tools to detect duplicate connections
    /// before insertion.
    pub fn link_with_source(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        links: &[Link],
    ) -> Option<LinkIndex> {
        self.links.iter().copied().find(|&l| {
            links
                .get(l)
                .is_some_and(|link| link.source_rule == rule && link.source_slot == slot)
        })
    }

    pub fn has_link_with_source(&self, rule: RuleIndex, slot: SlotIndex, links: &[Link]) -> bool {
        self.link_with_source(rule, slot, links).is_some()
    }

    /// Find a connected link ending at the given input slot.
    pub fn link_with_destination(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        links: &[Link],
    ) -> Option<LinkIndex> {
        self.links.iter().copied().find(|&l| {
            links
                .get(l)
                .is_some_and(|link| link.destination_rule == rule && link.destination_slot == slot)
        })
    }

    pub fn has_link_with_destination(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        links: &[Link],
    ) -> bool {
        self.link_with_destination(rule, slot, links).is_some()
    }
}
