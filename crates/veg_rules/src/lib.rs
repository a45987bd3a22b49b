#![forbid(unsafe_code)]
//! veg_rules: height-terrain vegetation rule graphs.
//!
//! A vegetation layer owns a small, user-authored dataflow graph of typed
//! rules. Evaluating the graph for one candidate placement point yields a
//! placement probability and a variation index, which callers use to scatter
//! procedural vegetation instances over a terrain sector.
//!
//! Modules:
//! - rulegraph: author and evaluate rule graphs (rules, slots, links, layers,
//!   evaluation environments, change notification)
//!
//! Rendering, prop-field storage, and terrain height maps are out of scope;
//! this crate only decides probability and variation for a given evaluation
//! context.
pub mod error;
pub mod rulegraph;

/// Convenient re-exports for common types. Import with `use veg_rules::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::rulegraph::curve::{BezierCurve, CurvePoint};
    pub use crate::rulegraph::environment::{
        EvaluationEnvironment, NearbyObject, NearbyVegetation,
    };
    pub use crate::rulegraph::events::{CollectingListener, FnListener, LayerChange, LayerListener};
    pub use crate::rulegraph::layer::VegetationLayer;
    pub use crate::rulegraph::rule::{
        MathOperator, MultiMathOperator, Rule, RuleKind, VectorMathOperator,
    };
    pub use crate::rulegraph::variation::Variation;
    pub use crate::rulegraph::{slots, Link, LinkIndex, RuleIndex, Slot, SlotIndex};
}
