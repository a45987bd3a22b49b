//! Rule nodes and the closed catalogue of rule kinds.
//!
//! This module defines the data model for the nodes of a vegetation rule
//! graph. Each [`Rule`] carries a [`RuleKind`] payload describing a typed
//! operation plus a fixed slot array sized at construction per kind. Input
//! slots precede output slots in the array; links address slots by absolute
//! index (see [`slots`]).
use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rulegraph::curve::BezierCurve;
use crate::rulegraph::slot::Slot;
use crate::rulegraph::SlotIndex;

/// Binary and unary scalar operators for the Math rule.
///
/// Trigonometric operators work in degrees. Division by zero and the
/// logarithm of a non-positive value yield 0; rounding with a zero step
/// passes the value through unchanged.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Sine,
    Cosine,
    Tangent,
    ArcSine,
    ArcCosine,
    ArcTangent,
    Power,
    Exponential,
    Logarithm,
    Minimum,
    Maximum,
    Round,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
    Average,
}

/// Aggregators for the MultiMath rule's fan-in input.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiMathOperator {
    Add,
    Multiply,
    Minimum,
    Maximum,
    Average,
}

/// Operators for the VectorMath rule.
///
/// Only `Dot` produces a meaningful scalar output; all other operators
/// return 0 on the scalar output slot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorMathOperator {
    Add,
    Subtract,
    Average,
    Normalize,
    Dot,
    Cross,
}

/// Parameters for a constant vector rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ConstantParams {
    /// The stored literal vector.
    pub vector: Vec3,
}

/// Parameters for a scalar math rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct MathParams {
    pub operator: MathOperator,
    /// Literal fallback for the first input slot when unlinked.
    pub value_a: f32,
    /// Literal fallback for the second input slot when unlinked.
    pub value_b: f32,
}

/// Parameters for an n-ary math rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct MultiMathParams {
    pub operator: MultiMathOperator,
}

/// Parameters for a vector math rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct VectorMathParams {
    pub operator: VectorMathOperator,
    /// Literal fallback for the first vector input when unlinked.
    pub vector_a: Vec3,
    /// Literal fallback for the second vector input when unlinked.
    pub vector_b: Vec3,
}

/// Parameters for a combine rule building a vector from three scalars.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct CombineParams {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Parameters for a components rule splitting a vector into scalars.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ComponentsParams {
    /// Literal fallback for the vector input when unlinked.
    pub vector: Vec3,
}

/// Parameters for a linear remapping rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct MappingParams {
    pub lower: f32,
    pub upper: f32,
    /// Literal fallback for the value input when unlinked.
    pub value: f32,
    /// Swap the clamped bounds and invert the remapped range.
    pub inversed: bool,
}

/// Parameters for a curve rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct CurveParams {
    /// User-authored bezier curve evaluated at the input scalar.
    pub curve: BezierCurve,
}

/// Parameters for a closest-prop spatial query rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ClosestPropParams {
    /// Object class to search for in the nearby-object cache.
    pub prop_class: String,
    /// Search radius in world units.
    pub search_radius: f32,
}

/// Parameters for a closest-vegetation spatial query rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ClosestVegetationParams {
    /// Vegetation type to search for in the nearby-vegetation cache.
    pub vegetation_type: String,
    /// Search radius in world units.
    pub search_radius: f32,
}

/// Parameters for a prop-count spatial query rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct PropCountParams {
    /// Object class to count in the nearby-object cache.
    pub prop_class: String,
    /// Search radius in world units.
    pub search_radius: f32,
}

/// Parameters for a result sink rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ResultParams {
    /// Literal probability used when the probability input has no links.
    pub probability: f32,
    /// Literal variation index used when the variation input is unlinked.
    pub variation: usize,
}

/// The closed catalogue of rule kinds.
///
/// Sizing of the slot array per kind is fixed at rule construction;
/// see [`slots`] for the absolute slot indices of every kind.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum RuleKind {
    Constant { params: ConstantParams },
    Math { params: MathParams },
    MultiMath { params: MultiMathParams },
    VectorMath { params: VectorMathParams },
    Combine { params: CombineParams },
    Components { params: ComponentsParams },
    Mapping { params: MappingParams },
    Curve { params: CurveParams },
    Geometry,
    Random,
    ClosestProp { params: ClosestPropParams },
    ClosestVegetation { params: ClosestVegetationParams },
    PropCount { params: PropCountParams },
    Result { params: ResultParams },
}

impl RuleKind {
    /// Number of input slots for this kind.
    pub fn input_slot_count(&self) -> usize {
        match self {
            RuleKind::Constant { .. }
            | RuleKind::Geometry
            | RuleKind::Random
            | RuleKind::ClosestProp { .. }
            | RuleKind::ClosestVegetation { .. }
            | RuleKind::PropCount { .. } => 0,
            RuleKind::Components { .. } | RuleKind::Curve { .. } | RuleKind::MultiMath { .. } => 1,
            RuleKind::Math { .. } | RuleKind::VectorMath { .. } | RuleKind::Result { .. } => 2,
            RuleKind::Combine { .. } | RuleKind::Mapping { .. } => 3,
        }
    }

    /// Number of output slots for this kind.
    pub fn output_slot_count(&self) -> usize {
        match self {
            RuleKind::Result { .. } => 0,
            RuleKind::Math { .. }
            | RuleKind::MultiMath { .. }
            | RuleKind::Combine { .. }
            | RuleKind::Mapping { .. }
            | RuleKind::Curve { .. }
            | RuleKind::Random
            | RuleKind::PropCount { .. } => 1,
            RuleKind::VectorMath { .. }
            | RuleKind::ClosestProp { .. }
            | RuleKind::ClosestVegetation { .. } => 2,
            RuleKind::Components { .. } | RuleKind::Geometry => 3,
            RuleKind::Constant { .. } => 4,
        }
    }

    /// Total slot count (inputs plus outputs).
    pub fn slot_count(&self) -> usize {
        self.input_slot_count() + self.output_slot_count()
    }

    /// Stable lower-case tag for this kind, as used by project files.
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::Constant { .. } => "constant",
            RuleKind::Math { .. } => "math",
            RuleKind::MultiMath { .. } => "multimath",
            RuleKind::VectorMath { .. } => "vectormath",
            RuleKind::Combine { .. } => "combine",
            RuleKind::Components { .. } => "components",
            RuleKind::Mapping { .. } => "mapping",
            RuleKind::Curve { .. } => "curve",
            RuleKind::Geometry => "geometry",
            RuleKind::Random => "random",
            RuleKind::ClosestProp { .. } => "closestProp",
            RuleKind::ClosestVegetation { .. } => "closestVegetation",
            RuleKind::PropCount { .. } => "propCount",
            RuleKind::Result { .. } => "result",
        }
    }

    /// Creates a constant vector rule kind.
    pub fn constant(vector: Vec3) -> Self {
        RuleKind::Constant {
            params: ConstantParams { vector },
        }
    }

    /// Creates a scalar math rule kind with literal fallbacks.
    pub fn math(operator: MathOperator, value_a: f32, value_b: f32) -> Self {
        RuleKind::Math {
            params: MathParams {
                operator,
                value_a,
                value_b,
            },
        }
    }

    /// Creates an n-ary math rule kind.
    pub fn multi_math(operator: MultiMathOperator) -> Self {
        RuleKind::MultiMath {
            params: MultiMathParams { operator },
        }
    }

    /// Creates a vector math rule kind with literal fallbacks.
    pub fn vector_math(operator: VectorMathOperator, vector_a: Vec3, vector_b: Vec3) -> Self {
        RuleKind::VectorMath {
            params: VectorMathParams {
                operator,
                vector_a,
                vector_b,
            },
        }
    }

    /// Creates a combine rule kind with literal fallbacks.
    pub fn combine(x: f32, y: f32, z: f32) -> Self {
        RuleKind::Combine {
            params: CombineParams { x, y, z },
        }
    }

    /// Creates a components rule kind with a literal fallback vector.
    pub fn components(vector: Vec3) -> Self {
        RuleKind::Components {
            params: ComponentsParams { vector },
        }
    }

    /// Creates a linear remapping rule kind.
    pub fn mapping(lower: f32, upper: f32, value: f32, inversed: bool) -> Self {
        RuleKind::Mapping {
            params: MappingParams {
                lower,
                upper,
                value,
                inversed,
            },
        }
    }

    /// Creates a curve rule kind.
    pub fn curve(curve: BezierCurve) -> Self {
        RuleKind::Curve {
            params: CurveParams { curve },
        }
    }

    /// Creates a geometry rule kind reading world-derived quantities.
    pub fn geometry() -> Self {
        RuleKind::Geometry
    }

    /// Creates a random rule kind drawing one value per evaluation pass.
    pub fn random() -> Self {
        RuleKind::Random
    }

    /// Creates a closest-prop query rule kind.
    pub fn closest_prop(prop_class: impl Into<String>, search_radius: f32) -> Self {
        RuleKind::ClosestProp {
            params: ClosestPropParams {
                prop_class: prop_class.into(),
                search_radius,
            },
        }
    }

    /// Creates a closest-vegetation query rule kind.
    pub fn closest_vegetation(vegetation_type: impl Into<String>, search_radius: f32) -> Self {
        RuleKind::ClosestVegetation {
            params: ClosestVegetationParams {
                vegetation_type: vegetation_type.into(),
                search_radius,
            },
        }
    }

    /// Creates a prop-count query rule kind.
    pub fn prop_count(prop_class: impl Into<String>, search_radius: f32) -> Self {
        RuleKind::PropCount {
            params: PropCountParams {
                prop_class: prop_class.into(),
                search_radius,
            },
        }
    }

    /// Creates a result sink rule kind with literal fallbacks.
    pub fn result(probability: f32, variation: usize) -> Self {
        RuleKind::Result {
            params: ResultParams {
                probability,
                variation,
            },
        }
    }
}

/// A node in the rule graph.
///
/// Owned exclusively by its [`crate::rulegraph::layer::VegetationLayer`].
/// The display name and 2-D editor position are cosmetic; the evaluator
/// ignores them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct Rule {
    name: String,
    position: Vec2,
    kind: RuleKind,
    slots: Vec<Slot>,
}

impl Rule {
    /// Creates a rule of the given kind with an empty name and the slot
    /// array the kind prescribes.
    pub fn new(kind: RuleKind) -> Self {
        let inputs = kind.input_slot_count();
        let outputs = kind.output_slot_count();
        let mut slots = Vec::with_capacity(inputs + outputs);
        slots.extend((0..inputs).map(|_| Slot::input()));
        slots.extend((0..outputs).map(|_| Slot::output()));
        Self {
            name: String::new(),
            position: Vec2::ZERO,
            kind,
            slots,
        }
    }

    /// Sets the display name, builder style.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the editor canvas position, builder style.
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Editor canvas position; cosmetic only.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Mutable access to the kind payload for parameter edits.
    ///
    /// The kind itself must not change shape; the slot array is sized once
    /// at construction.
    pub fn kind_mut(&mut self) -> &mut RuleKind {
        &mut self.kind
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: SlotIndex) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: SlotIndex) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Shift the link back-references of every slot after `removed` was
    /// deleted from the layer's link arena.
    pub(crate) fn shift_removed_link(&mut self, removed: crate::rulegraph::LinkIndex) {
        for slot in &mut self.slots {
            slot.shift_removed_link(removed);
        }
    }

    pub fn input_slot_count(&self) -> usize {
        self.kind.input_slot_count()
    }

    pub fn output_slot_count(&self) -> usize {
        self.kind.output_slot_count()
    }

    /// Whether `index` addresses an existing output slot.
    pub fn is_output_slot(&self, index: SlotIndex) -> bool {
        self.slot(index).is_some_and(|s| !s.is_input())
    }

    /// Whether `index` addresses an existing input slot.
    pub fn is_input_slot(&self, index: SlotIndex) -> bool {
        self.slot(index).is_some_and(|s| s.is_input())
    }

    /// Produces a new rule of the same kind with the same literal parameters
    /// but no slot links. Links are graph topology, not node state;
    /// duplicating a node never implicitly rewires it.
    pub fn duplicate(&self) -> Rule {
        Rule::new(self.kind.clone())
            .with_name(self.name.clone())
            .with_position(self.position)
    }
}

/// Absolute slot indices per rule kind.
///
/// Input slots precede output slots in a rule's slot array; links and the
/// pull accessors address slots by these indices.
pub mod slots {
    /// Constant: no inputs; outputs vector, x, y, z.
    pub mod constant {
        pub const VECTOR: usize = 0;
        pub const X: usize = 1;
        pub const Y: usize = 2;
        pub const Z: usize = 3;
    }

    /// Math: inputs value A, value B; output result.
    pub mod math {
        pub const VALUE_A: usize = 0;
        pub const VALUE_B: usize = 1;
        pub const RESULT: usize = 2;
    }

    /// MultiMath: fan-in input values; output result.
    pub mod multi_math {
        pub const VALUES: usize = 0;
        pub const RESULT: usize = 1;
    }

    /// VectorMath: inputs vector A, vector B; outputs value, vector.
    pub mod vector_math {
        pub const VECTOR_A: usize = 0;
        pub const VECTOR_B: usize = 1;
        pub const VALUE: usize = 2;
        pub const VECTOR: usize = 3;
    }

    /// Combine: inputs x, y, z; output vector.
    pub mod combine {
        pub const X: usize = 0;
        pub const Y: usize = 1;
        pub const Z: usize = 2;
        pub const VECTOR: usize = 3;
    }

    /// Components: input vector; outputs x, y, z.
    pub mod components {
        pub const VECTOR: usize = 0;
        pub const X: usize = 1;
        pub const Y: usize = 2;
        pub const Z: usize = 3;
    }

    /// Mapping: inputs lower, upper, value; output result.
    pub mod mapping {
        pub const LOWER: usize = 0;
        pub const UPPER: usize = 1;
        pub const VALUE: usize = 2;
        pub const RESULT: usize = 3;
    }

    /// Curve: input value; output result.
    pub mod curve {
        pub const VALUE: usize = 0;
        pub const RESULT: usize = 1;
    }

    /// Geometry: no inputs; outputs height, normal, terrain type.
    pub mod geometry {
        pub const HEIGHT: usize = 0;
        pub const NORMAL: usize = 1;
        pub const TERRAIN_TYPE: usize = 2;
    }

    /// Random: no inputs; output result.
    pub mod random {
        pub const RESULT: usize = 0;
    }

    /// ClosestProp: no inputs; outputs distance, direction.
    pub mod closest_prop {
        pub const DISTANCE: usize = 0;
        pub const DIRECTION: usize = 1;
    }

    /// ClosestVegetation: no inputs; outputs distance, direction.
    pub mod closest_vegetation {
        pub const DISTANCE: usize = 0;
        pub const DIRECTION: usize = 1;
    }

    /// PropCount: no inputs; output count.
    pub mod prop_count {
        pub const COUNT: usize = 0;
    }

    /// Result: inputs probability (fan-in), variation; no outputs.
    pub mod result {
        pub const PROBABILITY: usize = 0;
        pub const VARIATION: usize = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arrays_put_inputs_before_outputs() {
        let rule = Rule::new(RuleKind::math(MathOperator::Add, 0.0, 0.0));
        assert_eq!(rule.slots().len(), 3);
        assert!(rule.is_input_slot(slots::math::VALUE_A));
        assert!(rule.is_input_slot(slots::math::VALUE_B));
        assert!(rule.is_output_slot(slots::math::RESULT));
        assert!(!rule.is_output_slot(slots::math::VALUE_A));
        assert!(!rule.is_output_slot(99));
    }

    #[test]
    fn slot_counts_match_the_catalogue() {
        let cases: Vec<(RuleKind, usize, usize)> = vec![
            (RuleKind::constant(Vec3::ZERO), 0, 4),
            (RuleKind::math(MathOperator::Add, 0.0, 0.0), 2, 1),
            (RuleKind::multi_math(MultiMathOperator::Add), 1, 1),
            (
                RuleKind::vector_math(VectorMathOperator::Dot, Vec3::ZERO, Vec3::ZERO),
                2,
                2,
            ),
            (RuleKind::combine(0.0, 0.0, 0.0), 3, 1),
            (RuleKind::components(Vec3::ZERO), 1, 3),
            (RuleKind::mapping(0.0, 1.0, 0.0, false), 3, 1),
            (RuleKind::curve(BezierCurve::default()), 1, 1),
            (RuleKind::geometry(), 0, 3),
            (RuleKind::random(), 0, 1),
            (RuleKind::closest_prop("rock", 5.0), 0, 2),
            (RuleKind::closest_vegetation("birch", 5.0), 0, 2),
            (RuleKind::prop_count("rock", 5.0), 0, 1),
            (RuleKind::result(1.0, 0), 2, 0),
        ];

        for (kind, inputs, outputs) in cases {
            let label = kind.label();
            assert_eq!(kind.input_slot_count(), inputs, "{label} inputs");
            assert_eq!(kind.output_slot_count(), outputs, "{label} outputs");
            let rule = Rule::new(kind);
            assert_eq!(rule.slots().len(), inputs + outputs, "{label} slots");
        }
    }

    #[test]
    fn duplicate_copies_parameters_but_not_links() {
        let mut rule = Rule::new(RuleKind::math(MathOperator::Multiply, 2.0, 3.0))
            .with_name("scaler")
            .with_position(Vec2::new(10.0, 20.0));
        rule.slot_mut(slots::math::VALUE_A).unwrap().add_link(0);

        let copy = rule.duplicate();
        assert_eq!(copy.name(), "scaler");
        assert_eq!(copy.position(), Vec2::new(10.0, 20.0));
        assert!(matches!(
            copy.kind(),
            RuleKind::Math { params } if params.operator == MathOperator::Multiply
        ));
        assert_eq!(copy.slot(slots::math::VALUE_A).unwrap().link_count(), 0);
    }
}
