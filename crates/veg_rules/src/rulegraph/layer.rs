//! Vegetation layers: arena owners of rules, links, and variations.
//!
//! A [`VegetationLayer`] holds the complete rule graph for one terrain
//! sector. All structural mutation goes through its API, which keeps the
//! dense rule and link arenas, the slot back-references, and the acyclicity
//! invariant consistent: [`VegetationLayer::add_link`] is the single choke
//! point that rejects cycles, so no code path can construct a cyclic graph.
//!
//! The layer carries no locking. Structural edits and evaluation passes
//! against the same layer must be serialized by the caller.
use glam::Vec2;

use crate::error::{Error, Result};
use crate::rulegraph::events::{LayerChange, LayerListener};
use crate::rulegraph::variation::Variation;
use crate::rulegraph::{Link, LinkIndex, Rule, RuleIndex, SlotIndex};

/// Owner of one terrain sector's rule graph and variations.
pub struct VegetationLayer {
    name: String,
    rules: Vec<Rule>,
    links: Vec<Link>,
    variations: Vec<Variation>,
    active_rule: Option<RuleIndex>,
    active_variation: Option<usize>,
    listeners: Vec<Box<dyn LayerListener>>,
}

impl VegetationLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            links: Vec::new(),
            variations: Vec::new(),
            active_rule: None,
            active_variation: None,
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Registers an observer for structural changes.
    pub fn add_listener(&mut self, listener: impl LayerListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, change: LayerChange) {
        for listener in &mut self.listeners {
            listener.layer_changed(&change);
        }
    }

    // Rules

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule(&self, index: RuleIndex) -> Result<&Rule> {
        self.rules
            .get(index)
            .ok_or(Error::RuleIndexOutOfRange { index })
    }

    /// Mutable access for parameter edits. Call
    /// [`VegetationLayer::notify_rule_changed`] afterwards so observers see
    /// the edit.
    pub fn rule_mut(&mut self, index: RuleIndex) -> Result<&mut Rule> {
        self.rules
            .get_mut(index)
            .ok_or(Error::RuleIndexOutOfRange { index })
    }

    /// Appends a rule and returns its index.
    pub fn add_rule(&mut self, rule: Rule) -> RuleIndex {
        self.rules.push(rule);
        let index = self.rules.len() - 1;
        self.notify(LayerChange::RuleAdded { index });
        index
    }

    /// Appends a copy of an existing rule and returns the copy's index. The
    /// copy keeps the kind, literal parameters, name, and position but none
    /// of the links.
    pub fn duplicate_rule(&mut self, index: RuleIndex) -> Result<RuleIndex> {
        let copy = self.rule(index)?.duplicate();
        Ok(self.add_rule(copy))
    }

    /// Removes a rule together with every link touching it. Rule indices
    /// above `index` shift down by one; stored indices in links, slots, and
    /// the active-rule selection are rewritten accordingly.
    pub fn remove_rule(&mut self, index: RuleIndex) -> Result<Rule> {
        if index >= self.rules.len() {
            return Err(Error::RuleIndexOutOfRange { index });
        }

        let mut l = self.links.len();
        while l > 0 {
            l -= 1;
            if self.links[l].touches(index) {
                self.unlink(l);
            }
        }

        let rule = self.rules.remove(index);
        for link in &mut self.links {
            link.shift_removed_rule(index);
        }

        self.active_rule = match self.active_rule {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };

        self.notify(LayerChange::RuleRemoved { index });
        Ok(rule)
    }

    /// Reorders a rule within the arena; all stored rule indices follow.
    pub fn move_rule(&mut self, from: RuleIndex, to: RuleIndex) -> Result<()> {
        if from >= self.rules.len() {
            return Err(Error::RuleIndexOutOfRange { index: from });
        }
        if to >= self.rules.len() {
            return Err(Error::RuleIndexOutOfRange { index: to });
        }
        if from == to {
            return Ok(());
        }

        let rule = self.rules.remove(from);
        self.rules.insert(to, rule);

        let remap = |r: RuleIndex| -> RuleIndex {
            if r == from {
                to
            } else if from < to && r > from && r <= to {
                r - 1
            } else if to < from && r >= to && r < from {
                r + 1
            } else {
                r
            }
        };

        for link in &mut self.links {
            link.source_rule = remap(link.source_rule);
            link.destination_rule = remap(link.destination_rule);
        }
        self.active_rule = self.active_rule.map(remap);

        self.notify(LayerChange::RuleMoved { from, to });
        Ok(())
    }

    /// Moves a rule on the editor canvas; cosmetic only.
    pub fn set_rule_position(&mut self, index: RuleIndex, position: Vec2) -> Result<()> {
        self.rule_mut(index)?.set_position(position);
        self.notify(LayerChange::RulePositionChanged { index });
        Ok(())
    }

    /// Announces a parameter edit made through [`VegetationLayer::rule_mut`].
    pub fn notify_rule_changed(&mut self, index: RuleIndex) -> Result<()> {
        self.rule(index)?;
        self.notify(LayerChange::RuleChanged { index });
        Ok(())
    }

    pub fn active_rule(&self) -> Option<RuleIndex> {
        self.active_rule
    }

    /// Selects the active rule; UI convenience, not evaluation-relevant.
    pub fn set_active_rule(&mut self, index: Option<RuleIndex>) -> Result<()> {
        if let Some(i) = index {
            self.rule(i)?;
        }
        if self.active_rule != index {
            self.active_rule = index;
            self.notify(LayerChange::ActiveRuleChanged { index });
        }
        Ok(())
    }

    // Links

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link(&self, index: LinkIndex) -> Result<&Link> {
        self.links
            .get(index)
            .ok_or(Error::LinkIndexOutOfRange { index })
    }

    /// Creates a link from an output slot to an input slot.
    ///
    /// This is the only way links come into existence. It validates both
    /// endpoints, rejects duplicate connections, and rejects any link whose
    /// destination already depends on its source, including the degenerate
    /// source == destination case.
    pub fn add_link(
        &mut self,
        source_rule: RuleIndex,
        source_slot: SlotIndex,
        destination_rule: RuleIndex,
        destination_slot: SlotIndex,
    ) -> Result<LinkIndex> {
        let source = self.rule(source_rule)?;
        if source.slot(source_slot).is_none() {
            return Err(Error::SlotIndexOutOfRange {
                rule: source_rule,
                slot: source_slot,
            });
        }
        if !source.is_output_slot(source_slot) {
            return Err(Error::NotAnOutputSlot {
                rule: source_rule,
                slot: source_slot,
            });
        }

        let destination = self.rule(destination_rule)?;
        let Some(slot) = destination.slot(destination_slot) else {
            return Err(Error::SlotIndexOutOfRange {
                rule: destination_rule,
                slot: destination_slot,
            });
        };
        if !slot.is_input() {
            return Err(Error::NotAnInputSlot {
                rule: destination_rule,
                slot: destination_slot,
            });
        }

        if slot.has_link_with_source(source_rule, source_slot, &self.links) {
            return Err(Error::DuplicateLink {
                source_rule,
                source_slot,
                destination_rule,
                destination_slot,
            });
        }

        if self.depends_on_unchecked(source_rule, destination_rule) {
            return Err(Error::LinkWouldCycle {
                source_rule,
                destination_rule,
            });
        }

        let index = self.links.len();
        self.links.push(Link::new(
            source_rule,
            source_slot,
            destination_rule,
            destination_slot,
        ));
        if let Some(slot) = self.rules[source_rule].slot_mut(source_slot) {
            slot.add_link(index);
        }
        if let Some(slot) = self.rules[destination_rule].slot_mut(destination_slot) {
            slot.add_link(index);
        }

        self.notify(LayerChange::LinkAdded { index });
        Ok(index)
    }

    /// Removes a link, updating both endpoint slots. Link indices above
    /// `index` shift down by one.
    pub fn remove_link(&mut self, index: LinkIndex) -> Result<Link> {
        if index >= self.links.len() {
            return Err(Error::LinkIndexOutOfRange { index });
        }
        let link = self.unlink(index);
        self.notify(LayerChange::LinkRemoved { index });
        Ok(link)
    }

    fn unlink(&mut self, index: LinkIndex) -> Link {
        let link = self.links[index];
        if let Some(slot) = self.rules[link.source_rule].slot_mut(link.source_slot) {
            slot.remove_link(index);
        }
        if let Some(slot) = self.rules[link.destination_rule].slot_mut(link.destination_slot) {
            slot.remove_link(index);
        }
        self.links.remove(index);
        for rule in &mut self.rules {
            rule.shift_removed_link(index);
        }
        link
    }

    /// Whether linking `source_rule` into `destination_rule` would close a
    /// cycle. Exposed for editing tools that want to grey out invalid
    /// connections before attempting them; [`VegetationLayer::add_link`]
    /// performs the same check itself.
    pub fn link_produces_loop(
        &self,
        source_rule: RuleIndex,
        destination_rule: RuleIndex,
    ) -> Result<bool> {
        self.depends_on(source_rule, destination_rule)
    }

    /// Whether `rule` is `candidate` or transitively pulls from it through
    /// its input links.
    pub fn depends_on(&self, rule: RuleIndex, candidate: RuleIndex) -> Result<bool> {
        if rule >= self.rules.len() {
            return Err(Error::RuleIndexOutOfRange { index: rule });
        }
        if candidate >= self.rules.len() {
            return Err(Error::RuleIndexOutOfRange { index: candidate });
        }
        Ok(self.depends_on_unchecked(rule, candidate))
    }

    /// Reachability over input links with an explicit visited set, so shared
    /// sub-expressions (diamond shapes) are walked once.
    fn depends_on_unchecked(&self, rule: RuleIndex, candidate: RuleIndex) -> bool {
        let mut visited = vec![false; self.rules.len()];
        let mut stack = vec![rule];

        while let Some(r) = stack.pop() {
            if r == candidate {
                return true;
            }
            if visited[r] {
                continue;
            }
            visited[r] = true;

            let inputs = self.rules[r].input_slot_count();
            for slot in &self.rules[r].slots()[..inputs] {
                for &l in slot.links() {
                    if let Some(link) = self.links.get(l) {
                        stack.push(link.source_rule);
                    }
                }
            }
        }

        false
    }

    // Variations

    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    pub fn variation_count(&self) -> usize {
        self.variations.len()
    }

    pub fn variation(&self, index: usize) -> Result<&Variation> {
        self.variations
            .get(index)
            .ok_or(Error::VariationIndexOutOfRange { index })
    }

    pub fn variation_mut(&mut self, index: usize) -> Result<&mut Variation> {
        self.variations
            .get_mut(index)
            .ok_or(Error::VariationIndexOutOfRange { index })
    }

    pub fn add_variation(&mut self, variation: Variation) -> usize {
        self.variations.push(variation);
        let index = self.variations.len() - 1;
        self.notify(LayerChange::VariationAdded { index });
        index
    }

    pub fn remove_variation(&mut self, index: usize) -> Result<Variation> {
        if index >= self.variations.len() {
            return Err(Error::VariationIndexOutOfRange { index });
        }
        let variation = self.variations.remove(index);

        self.active_variation = match self.active_variation {
            Some(a) if a == index => None,
            Some(a) if a > index => Some(a - 1),
            other => other,
        };

        self.notify(LayerChange::VariationRemoved { index });
        Ok(variation)
    }

    pub fn active_variation(&self) -> Option<usize> {
        self.active_variation
    }

    /// Selects the active variation; UI convenience, not evaluation-relevant.
    pub fn set_active_variation(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            self.variation(i)?;
        }
        if self.active_variation != index {
            self.active_variation = index;
            self.notify(LayerChange::ActiveVariationChanged { index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::rulegraph::events::CollectingListener;
    use crate::rulegraph::rule::{MathOperator, RuleKind};
    use crate::rulegraph::slots;

    fn math_rule() -> Rule {
        Rule::new(RuleKind::math(MathOperator::Add, 0.0, 0.0))
    }

    fn constant_rule() -> Rule {
        Rule::new(RuleKind::constant(Vec3::ONE))
    }

    #[test]
    fn add_link_updates_both_endpoint_slots() {
        let mut layer = VegetationLayer::new("sector");
        let source = layer.add_rule(constant_rule());
        let destination = layer.add_rule(math_rule());

        let link = layer
            .add_link(source, slots::constant::X, destination, slots::math::VALUE_A)
            .unwrap();

        assert_eq!(layer.link_count(), 1);
        assert_eq!(
            layer.rule(source).unwrap().slot(slots::constant::X).unwrap().links(),
            &[link]
        );
        assert_eq!(
            layer
                .rule(destination)
                .unwrap()
                .slot(slots::math::VALUE_A)
                .unwrap()
                .links(),
            &[link]
        );
    }

    #[test]
    fn add_link_validates_slot_directions() {
        let mut layer = VegetationLayer::new("sector");
        let source = layer.add_rule(constant_rule());
        let destination = layer.add_rule(math_rule());

        // Input used as source.
        assert!(matches!(
            layer.add_link(destination, slots::math::VALUE_A, destination, slots::math::VALUE_B),
            Err(Error::NotAnOutputSlot { .. })
        ));
        // Output used as destination.
        assert!(matches!(
            layer.add_link(source, slots::constant::X, source, slots::constant::Y),
            Err(Error::NotAnInputSlot { .. })
        ));
        // Slot out of range.
        assert!(matches!(
            layer.add_link(source, 9, destination, slots::math::VALUE_A),
            Err(Error::SlotIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn add_link_rejects_duplicates() {
        let mut layer = VegetationLayer::new("sector");
        let source = layer.add_rule(constant_rule());
        let destination = layer.add_rule(math_rule());

        layer
            .add_link(source, slots::constant::X, destination, slots::math::VALUE_A)
            .unwrap();
        assert!(matches!(
            layer.add_link(source, slots::constant::X, destination, slots::math::VALUE_A),
            Err(Error::DuplicateLink { .. })
        ));
        // Same source into the other input slot is fine.
        layer
            .add_link(source, slots::constant::X, destination, slots::math::VALUE_B)
            .unwrap();
    }

    #[test]
    fn add_link_rejects_cycles_and_self_links() {
        let mut layer = VegetationLayer::new("sector");
        let a = layer.add_rule(math_rule());
        let b = layer.add_rule(math_rule());

        assert!(matches!(
            layer.add_link(a, slots::math::RESULT, a, slots::math::VALUE_A),
            Err(Error::LinkWouldCycle { .. })
        ));

        layer
            .add_link(a, slots::math::RESULT, b, slots::math::VALUE_A)
            .unwrap();
        assert!(layer.link_produces_loop(b, a).unwrap());
        assert!(matches!(
            layer.add_link(b, slots::math::RESULT, a, slots::math::VALUE_B),
            Err(Error::LinkWouldCycle { .. })
        ));
    }

    #[test]
    fn link_produces_loop_agrees_with_add_link() {
        let mut layer = VegetationLayer::new("sector");
        let a = layer.add_rule(math_rule());
        let b = layer.add_rule(math_rule());
        let c = layer.add_rule(math_rule());

        layer
            .add_link(a, slots::math::RESULT, b, slots::math::VALUE_A)
            .unwrap();
        layer
            .add_link(b, slots::math::RESULT, c, slots::math::VALUE_A)
            .unwrap();

        // Closing the chain back onto any upstream rule is a loop.
        assert!(layer.link_produces_loop(c, a).unwrap());
        assert!(layer.link_produces_loop(c, b).unwrap());
        assert!(layer.link_produces_loop(b, a).unwrap());
        assert!(layer.link_produces_loop(a, a).unwrap());

        // Diamond fan-in a -> c alongside a -> b -> c is legal, and add_link
        // must agree with the pre-check.
        assert!(!layer.link_produces_loop(a, c).unwrap());
        layer
            .add_link(a, slots::math::RESULT, c, slots::math::VALUE_B)
            .unwrap();
    }

    #[test]
    fn depends_on_is_reflexive_and_transitive() {
        let mut layer = VegetationLayer::new("sector");
        let a = layer.add_rule(constant_rule());
        let b = layer.add_rule(math_rule());
        let c = layer.add_rule(math_rule());
        let lone = layer.add_rule(constant_rule());

        layer
            .add_link(a, slots::constant::X, b, slots::math::VALUE_A)
            .unwrap();
        layer
            .add_link(b, slots::math::RESULT, c, slots::math::VALUE_A)
            .unwrap();
        // Diamond: a feeds c directly as well.
        layer
            .add_link(a, slots::constant::Y, c, slots::math::VALUE_B)
            .unwrap();

        assert!(layer.depends_on(a, a).unwrap());
        assert!(layer.depends_on(c, a).unwrap());
        assert!(layer.depends_on(c, b).unwrap());
        assert!(!layer.depends_on(a, c).unwrap());
        assert!(!layer.depends_on(c, lone).unwrap());
        assert!(matches!(
            layer.depends_on(99, a),
            Err(Error::RuleIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn remove_link_shifts_back_references() {
        let mut layer = VegetationLayer::new("sector");
        let source = layer.add_rule(constant_rule());
        let destination = layer.add_rule(math_rule());

        let first = layer
            .add_link(source, slots::constant::X, destination, slots::math::VALUE_A)
            .unwrap();
        let second = layer
            .add_link(source, slots::constant::Y, destination, slots::math::VALUE_B)
            .unwrap();
        assert_eq!((first, second), (0, 1));

        layer.remove_link(first).unwrap();
        assert_eq!(layer.link_count(), 1);
        // The remaining link moved to index 0; slots must agree.
        assert_eq!(
            layer
                .rule(destination)
                .unwrap()
                .slot(slots::math::VALUE_B)
                .unwrap()
                .links(),
            &[0]
        );
        let link = layer.link(0).unwrap();
        assert_eq!(link.source_slot, slots::constant::Y);
    }

    #[test]
    fn remove_rule_drops_touching_links_and_remaps_indices() {
        let mut layer = VegetationLayer::new("sector");
        let a = layer.add_rule(constant_rule());
        let b = layer.add_rule(math_rule());
        let c = layer.add_rule(math_rule());

        layer
            .add_link(a, slots::constant::X, b, slots::math::VALUE_A)
            .unwrap();
        layer
            .add_link(b, slots::math::RESULT, c, slots::math::VALUE_A)
            .unwrap();
        layer
            .add_link(a, slots::constant::Y, c, slots::math::VALUE_B)
            .unwrap();
        layer.set_active_rule(Some(c)).unwrap();

        layer.remove_rule(b).unwrap();

        assert_eq!(layer.rule_count(), 2);
        assert_eq!(layer.link_count(), 1);
        let link = layer.link(0).unwrap();
        // a stays 0, c shifted from 2 to 1.
        assert_eq!(link.source_rule, 0);
        assert_eq!(link.destination_rule, 1);
        assert_eq!(layer.active_rule(), Some(1));
        assert_eq!(
            layer.rule(1).unwrap().slot(slots::math::VALUE_B).unwrap().links(),
            &[0]
        );
        // The slot that fed from b is empty again.
        assert_eq!(
            layer.rule(1).unwrap().slot(slots::math::VALUE_A).unwrap().link_count(),
            0
        );
    }

    #[test]
    fn duplicate_rule_copies_parameters_but_not_links() {
        let mut layer = VegetationLayer::new("sector");
        let source = layer.add_rule(constant_rule());
        let destination = layer.add_rule(math_rule());
        layer
            .add_link(source, slots::constant::X, destination, slots::math::VALUE_A)
            .unwrap();

        let copy = layer.duplicate_rule(destination).unwrap();
        assert_eq!(layer.rule_count(), 3);
        assert!(matches!(
            layer.rule(copy).unwrap().kind(),
            RuleKind::Math { .. }
        ));
        assert_eq!(
            layer.rule(copy).unwrap().slot(slots::math::VALUE_A).unwrap().link_count(),
            0
        );
    }

    #[test]
    fn remove_rule_clears_active_selection() {
        let mut layer = VegetationLayer::new("sector");
        let a = layer.add_rule(constant_rule());
        layer.set_active_rule(Some(a)).unwrap();
        layer.remove_rule(a).unwrap();
        assert_eq!(layer.active_rule(), None);
    }

    #[test]
    fn move_rule_remaps_links_and_selection() {
        let mut layer = VegetationLayer::new("sector");
        let a = layer.add_rule(constant_rule());
        let b = layer.add_rule(math_rule());
        let c = layer.add_rule(math_rule());

        layer
            .add_link(a, slots::constant::X, b, slots::math::VALUE_A)
            .unwrap();
        layer.set_active_rule(Some(a)).unwrap();

        layer.move_rule(a, c).unwrap();

        // Order is now b, c, a.
        let link = layer.link(0).unwrap();
        assert_eq!(link.source_rule, 2);
        assert_eq!(link.destination_rule, 0);
        assert_eq!(layer.active_rule(), Some(2));
        assert!(matches!(
            layer.rule(2).unwrap().kind(),
            RuleKind::Constant { .. }
        ));
    }

    #[test]
    fn variations_track_active_selection() {
        let mut layer = VegetationLayer::new("sector");
        let first = layer.add_variation(Variation::new("birch"));
        let second = layer.add_variation(Variation::new("pine"));
        layer.set_active_variation(Some(second)).unwrap();

        layer.remove_variation(first).unwrap();
        assert_eq!(layer.variation_count(), 1);
        assert_eq!(layer.active_variation(), Some(0));
        assert_eq!(layer.variation(0).unwrap().name, "pine");
    }

    #[test]
    fn structural_edits_notify_listeners() {
        let changes = CollectingListener::new();
        let mut layer = VegetationLayer::new("sector");
        layer.add_listener(changes.clone());

        let a = layer.add_rule(constant_rule());
        let b = layer.add_rule(math_rule());
        let link = layer
            .add_link(a, slots::constant::X, b, slots::math::VALUE_A)
            .unwrap();
        layer.remove_link(link).unwrap();
        layer.remove_rule(b).unwrap();
        let v = layer.add_variation(Variation::new("fern"));
        layer.set_active_variation(Some(v)).unwrap();

        assert_eq!(
            changes.take(),
            vec![
                LayerChange::RuleAdded { index: a },
                LayerChange::RuleAdded { index: b },
                LayerChange::LinkAdded { index: link },
                LayerChange::LinkRemoved { index: link },
                LayerChange::RuleRemoved { index: b },
                LayerChange::VariationAdded { index: v },
                LayerChange::ActiveVariationChanged { index: Some(v) },
            ]
        );
    }
}
