//! Rule graph subsystem: authoring and evaluating vegetation placement rules.
//!
//! This module groups types for building a directed acyclic graph (DAG) of
//! vegetation rules inside a [`layer::VegetationLayer`] and pulling placement
//! probability and variation out of it through an
//! [`environment::EvaluationEnvironment`].
//!
//! The layer owns dense arenas of rules and links; every cross-reference
//! (a slot's back-reference, a link's endpoints) is an index into those
//! arenas, so structural edits can never leave dangling references behind.
pub mod curve;
pub mod environment;
pub mod eval;
pub mod events;
pub mod layer;
pub mod link;
pub mod rule;
pub mod slot;
pub mod variation;

pub use link::Link;
pub use rule::{slots, Rule, RuleKind};
pub use slot::Slot;

/// Index of a rule in its layer's rule arena.
pub type RuleIndex = usize;
/// Index of a link in its layer's link arena.
pub type LinkIndex = usize;
/// Absolute index of a slot in a rule's slot array (inputs precede outputs).
pub type SlotIndex = usize;

/// Tolerance used for value comparisons and degenerate-range tests.
pub(crate) const VALUE_EPSILON: f32 = 1e-5;
