//! Change notification for structural layer edits.
//!
//! Editing tools, undo stacks, and project-file writers observe a
//! [`crate::rulegraph::layer::VegetationLayer`] by registering a
//! [`LayerListener`]; every structural mutation emits one [`LayerChange`].
//! Cached prop fields derived from the graph should be invalidated on any
//! change.
use std::cell::RefCell;
use std::rc::Rc;

use crate::rulegraph::{LinkIndex, RuleIndex};

/// Describes one structural change to a vegetation layer.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerChange {
    /// A rule was appended to the rule arena.
    RuleAdded { index: RuleIndex },
    /// A rule and all links touching it were removed; indices above
    /// `index` shifted down by one.
    RuleRemoved { index: RuleIndex },
    /// A rule was reordered within the arena.
    RuleMoved { from: RuleIndex, to: RuleIndex },
    /// A rule's parameters were edited.
    RuleChanged { index: RuleIndex },
    /// A rule's editor canvas position changed.
    RulePositionChanged { index: RuleIndex },
    /// A link was created between two slots.
    LinkAdded { index: LinkIndex },
    /// A link was removed; indices above `index` shifted down by one.
    LinkRemoved { index: LinkIndex },
    /// A variation was appended.
    VariationAdded { index: usize },
    /// A variation was removed; indices above `index` shifted down by one.
    VariationRemoved { index: usize },
    /// The active rule selection changed.
    ActiveRuleChanged { index: Option<RuleIndex> },
    /// The active variation selection changed.
    ActiveVariationChanged { index: Option<usize> },
}

/// Observer of structural layer changes.
pub trait LayerListener {
    fn layer_changed(&mut self, change: &LayerChange);
}

/// Adapter wrapping a closure as a [`LayerListener`].
pub struct FnListener<F: FnMut(&LayerChange)>(F);

impl<F: FnMut(&LayerChange)> FnListener<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F: FnMut(&LayerChange)> LayerListener for FnListener<F> {
    fn layer_changed(&mut self, change: &LayerChange) {
        (self.0)(change);
    }
}

/// Listener collecting all changes into a shared vector.
///
/// Clone one handle into the layer and keep the other to inspect the
/// collected changes afterwards.
#[derive(Clone, Default)]
pub struct CollectingListener {
    changes: Rc<RefCell<Vec<LayerChange>>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the changes collected so far.
    pub fn collected(&self) -> Vec<LayerChange> {
        self.changes.borrow().clone()
    }

    /// Removes and returns all collected changes.
    pub fn take(&self) -> Vec<LayerChange> {
        self.changes.take()
    }
}

impl LayerListener for CollectingListener {
    fn layer_changed(&mut self, change: &LayerChange) {
        self.changes.borrow_mut().push(change.clone());
    }
}
