//! Pull-based evaluation of rule graphs.
//!
//! Evaluation is lazy and demand-driven: [`VegetationLayer::evaluate_rules`]
//! walks every Result rule, which transitively pulls whatever subgraph feeds
//! its inputs through [`VegetationLayer::output_value`] and
//! [`VegetationLayer::output_vector`]. Rules not reachable from any Result
//! rule are reset but never pulled. Memoized kinds (Random, ClosestProp,
//! ClosestVegetation, PropCount) compute their result at most once per pass;
//! the per-pass state lives in the [`EvaluationEnvironment`].
//!
//! Numeric edge cases never fail: every degenerate input has a defined
//! fallback, so evaluating a well-formed graph always completes. Structural
//! misuse (pulling a slot outside a kind's output range) is an error.
use glam::Vec3;
use tracing::warn;

use crate::error::{Error, Result};
use crate::rulegraph::environment::{EvaluationEnvironment, RuleMemo};
use crate::rulegraph::layer::VegetationLayer;
use crate::rulegraph::rule::{MathOperator, MultiMathOperator, RuleKind, VectorMathOperator};
use crate::rulegraph::{slots, RuleIndex, SlotIndex, VALUE_EPSILON};

/// A value pulled from an output slot, before the caller decides whether it
/// wants the scalar or the vector view.
///
/// Scalar pulls of a vector-valued slot yield the vector's x component;
/// vector pulls of a scalar-valued slot yield the splatted scalar.
enum Pulled {
    Value(f32),
    Vector(Vec3),
}

impl Pulled {
    fn value(self) -> f32 {
        match self {
            Pulled::Value(v) => v,
            Pulled::Vector(v) => v.x,
        }
    }

    fn vector(self) -> Vec3 {
        match self {
            Pulled::Value(v) => Vec3::splat(v),
            Pulled::Vector(v) => v,
        }
    }
}

impl VegetationLayer {
    /// Starts a fresh evaluation pass: drops all memoized state in the
    /// environment and redraws every Random rule's value.
    pub fn begin_pass(&self, env: &mut EvaluationEnvironment) {
        env.reset_pass(self.rule_count());
        for (index, rule) in self.rules().iter().enumerate() {
            if matches!(rule.kind(), RuleKind::Random) {
                let value = env.rand01();
                env.set_memo(index, RuleMemo::Value(value));
            }
        }
    }

    /// Runs one full evaluation pass for one candidate placement point:
    /// resets every rule, then evaluates every Result rule, which writes
    /// probability and variation into the environment.
    pub fn evaluate_rules(&self, env: &mut EvaluationEnvironment) -> Result<()> {
        self.begin_pass(env);

        let mut result_seen = false;
        for index in 0..self.rule_count() {
            if matches!(self.rules()[index].kind(), RuleKind::Result { .. }) {
                self.evaluate_result(index, env)?;
                result_seen = true;
            }
        }

        if !result_seen {
            warn!(
                "Layer '{}' has no result rule; outputs left unchanged.",
                self.name()
            );
        }
        Ok(())
    }

    /// Pulls the scalar value of an output slot.
    pub fn output_value(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        env: &mut EvaluationEnvironment,
    ) -> Result<f32> {
        self.require_output_slot(rule, slot)?;
        Ok(self.pull_output(rule, slot, env)?.value())
    }

    /// Pulls the vector value of an output slot.
    pub fn output_vector(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        env: &mut EvaluationEnvironment,
    ) -> Result<Vec3> {
        self.require_output_slot(rule, slot)?;
        Ok(self.pull_output(rule, slot, env)?.vector())
    }

    fn require_output_slot(&self, rule: RuleIndex, slot: SlotIndex) -> Result<()> {
        let r = self.rule(rule)?;
        let Some(s) = r.slot(slot) else {
            return Err(Error::SlotIndexOutOfRange { rule, slot });
        };
        if s.is_input() {
            return Err(Error::NotAnOutputSlot { rule, slot });
        }
        Ok(())
    }

    /// Resolves an input slot: the first connected link wins, otherwise the
    /// kind's literal fallback is used.
    fn input_value(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        fallback: f32,
        env: &mut EvaluationEnvironment,
    ) -> Result<f32> {
        let first = self.rules()[rule]
            .slot(slot)
            .and_then(|s| s.links().first().copied());
        match first {
            Some(l) => {
                let link = self.links()[l];
                self.output_value(link.source_rule, link.source_slot, env)
            }
            None => Ok(fallback),
        }
    }

    fn input_vector(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        fallback: Vec3,
        env: &mut EvaluationEnvironment,
    ) -> Result<Vec3> {
        let first = self.rules()[rule]
            .slot(slot)
            .and_then(|s| s.links().first().copied());
        match first {
            Some(l) => {
                let link = self.links()[l];
                self.output_vector(link.source_rule, link.source_slot, env)
            }
            None => Ok(fallback),
        }
    }

    /// Computes the value of a validated output slot. Recursion terminates
    /// because links are guaranteed acyclic at creation time.
    fn pull_output(
        &self,
        rule: RuleIndex,
        slot: SlotIndex,
        env: &mut EvaluationEnvironment,
    ) -> Result<Pulled> {
        let out_of_range = Error::SlotIndexOutOfRange { rule, slot };

        match self.rules()[rule].kind() {
            RuleKind::Constant { params } => match slot {
                slots::constant::VECTOR => Ok(Pulled::Vector(params.vector)),
                slots::constant::X => Ok(Pulled::Value(params.vector.x)),
                slots::constant::Y => Ok(Pulled::Value(params.vector.y)),
                slots::constant::Z => Ok(Pulled::Value(params.vector.z)),
                _ => Err(out_of_range),
            },

            RuleKind::Math { params } => {
                let a = self.input_value(rule, slots::math::VALUE_A, params.value_a, env)?;
                let b = self.input_value(rule, slots::math::VALUE_B, params.value_b, env)?;
                Ok(Pulled::Value(apply_math(params.operator, a, b)))
            }

            RuleKind::MultiMath { params } => {
                let operator = params.operator;
                let links = self.rules()[rule]
                    .slot(slots::multi_math::VALUES)
                    .map(|s| s.links())
                    .unwrap_or(&[]);
                let mut values = Vec::with_capacity(links.len());
                for &l in links {
                    let link = self.links()[l];
                    values.push(self.output_value(link.source_rule, link.source_slot, env)?);
                }
                Ok(Pulled::Value(apply_multi_math(operator, &values)))
            }

            RuleKind::VectorMath { params } => {
                let operator = params.operator;
                let a = self.input_vector(rule, slots::vector_math::VECTOR_A, params.vector_a, env)?;
                let b = self.input_vector(rule, slots::vector_math::VECTOR_B, params.vector_b, env)?;
                match slot {
                    slots::vector_math::VALUE => Ok(Pulled::Value(match operator {
                        VectorMathOperator::Dot => a.dot(b),
                        _ => 0.0,
                    })),
                    slots::vector_math::VECTOR => Ok(Pulled::Vector(match operator {
                        VectorMathOperator::Add => a + b,
                        VectorMathOperator::Subtract => a - b,
                        VectorMathOperator::Average => (a + b) * 0.5,
                        VectorMathOperator::Normalize => a.normalize_or_zero(),
                        VectorMathOperator::Dot => Vec3::splat(a.dot(b)),
                        VectorMathOperator::Cross => a.cross(b),
                    })),
                    _ => Err(out_of_range),
                }
            }

            RuleKind::Combine { params } => {
                let x = self.input_value(rule, slots::combine::X, params.x, env)?;
                let y = self.input_value(rule, slots::combine::Y, params.y, env)?;
                let z = self.input_value(rule, slots::combine::Z, params.z, env)?;
                Ok(Pulled::Vector(Vec3::new(x, y, z)))
            }

            RuleKind::Components { params } => {
                let v = self.input_vector(rule, slots::components::VECTOR, params.vector, env)?;
                match slot {
                    slots::components::X => Ok(Pulled::Value(v.x)),
                    slots::components::Y => Ok(Pulled::Value(v.y)),
                    slots::components::Z => Ok(Pulled::Value(v.z)),
                    _ => Err(out_of_range),
                }
            }

            RuleKind::Mapping { params } => {
                let lower = self.input_value(rule, slots::mapping::LOWER, params.lower, env)?;
                let upper = self.input_value(rule, slots::mapping::UPPER, params.upper, env)?;
                let value = self.input_value(rule, slots::mapping::VALUE, params.value, env)?;
                Ok(Pulled::Value(map_range(lower, upper, value, params.inversed)))
            }

            RuleKind::Curve { params } => {
                let value = self.input_value(rule, slots::curve::VALUE, 0.0, env)?;
                Ok(Pulled::Value(params.curve.evaluate(value)))
            }

            RuleKind::Geometry => match slot {
                slots::geometry::HEIGHT => Ok(Pulled::Value(env.position.y)),
                slots::geometry::NORMAL => Ok(Pulled::Vector(env.normal)),
                slots::geometry::TERRAIN_TYPE => Ok(Pulled::Value(env.terrain_type as f32)),
                _ => Err(out_of_range),
            },

            RuleKind::Random => {
                let value = match env.memo(rule) {
                    Some(RuleMemo::Value(v)) => *v,
                    _ => {
                        let v = env.rand01();
                        env.set_memo(rule, RuleMemo::Value(v));
                        v
                    }
                };
                Ok(Pulled::Value(value))
            }

            RuleKind::ClosestProp { params } => {
                let (distance, direction) = match env.memo(rule) {
                    Some(RuleMemo::Closest {
                        distance,
                        direction,
                    }) => (*distance, *direction),
                    _ => {
                        let hit = closest(
                            env.objects()
                                .iter()
                                .map(|o| (o.class_name.as_str(), o.position)),
                            &params.prop_class,
                            params.search_radius,
                            env.position,
                        );
                        env.set_memo(
                            rule,
                            RuleMemo::Closest {
                                distance: hit.0,
                                direction: hit.1,
                            },
                        );
                        hit
                    }
                };
                match slot {
                    slots::closest_prop::DISTANCE => Ok(Pulled::Value(distance)),
                    slots::closest_prop::DIRECTION => Ok(Pulled::Vector(direction)),
                    _ => Err(out_of_range),
                }
            }

            RuleKind::ClosestVegetation { params } => {
                let (distance, direction) = match env.memo(rule) {
                    Some(RuleMemo::Closest {
                        distance,
                        direction,
                    }) => (*distance, *direction),
                    _ => {
                        let hit = closest(
                            env.vegetation()
                                .iter()
                                .map(|v| (v.vegetation_type.as_str(), v.position)),
                            &params.vegetation_type,
                            params.search_radius,
                            env.position,
                        );
                        env.set_memo(
                            rule,
                            RuleMemo::Closest {
                                distance: hit.0,
                                direction: hit.1,
                            },
                        );
                        hit
                    }
                };
                match slot {
                    slots::closest_vegetation::DISTANCE => Ok(Pulled::Value(distance)),
                    slots::closest_vegetation::DIRECTION => Ok(Pulled::Vector(direction)),
                    _ => Err(out_of_range),
                }
            }

            RuleKind::PropCount { params } => {
                let count = match env.memo(rule) {
                    Some(RuleMemo::Count(c)) => *c,
                    _ => {
                        let origin = env.position;
                        let c = env
                            .objects()
                            .iter()
                            .filter(|o| {
                                o.class_name == params.prop_class
                                    && (o.position - origin).length() <= params.search_radius
                            })
                            .count() as f32;
                        env.set_memo(rule, RuleMemo::Count(c));
                        c
                    }
                };
                Ok(Pulled::Value(count))
            }

            // Result has no output slots; slot validation rejects the pull
            // before reaching here.
            RuleKind::Result { .. } => Err(Error::NotAnOutputSlot { rule, slot }),
        }
    }

    /// Evaluates one Result rule: multiplies every probability fan-in link
    /// (any negative value vetoes the aggregate to exactly 0, but every link
    /// is still pulled), resolves the variation input, and writes both into
    /// the environment.
    fn evaluate_result(&self, rule: RuleIndex, env: &mut EvaluationEnvironment) -> Result<()> {
        let RuleKind::Result { params } = self.rules()[rule].kind() else {
            return Ok(());
        };

        let prob_links = self.rules()[rule]
            .slot(slots::result::PROBABILITY)
            .map(|s| s.links())
            .unwrap_or(&[]);

        let probability = if prob_links.is_empty() {
            params.probability
        } else {
            let mut product = 1.0_f32;
            let mut vetoed = false;
            for &l in prob_links {
                let link = self.links()[l];
                let value = self.output_value(link.source_rule, link.source_slot, env)?;
                if value < 0.0 {
                    vetoed = true;
                }
                product *= value;
            }
            if vetoed {
                0.0
            } else {
                product
            }
        };

        let variation_link = self.rules()[rule]
            .slot(slots::result::VARIATION)
            .and_then(|s| s.links().first().copied());

        let variation = match variation_link {
            Some(l) => {
                let link = self.links()[l];
                let value = self.output_value(link.source_rule, link.source_slot, env)?;
                let count = self.variation_count();
                if count == 0 {
                    0
                } else {
                    (value.round() as i64).clamp(0, count as i64 - 1) as usize
                }
            }
            None => params.variation,
        };

        env.probability = probability;
        env.variation = variation;
        Ok(())
    }
}

fn apply_math(operator: MathOperator, a: f32, b: f32) -> f32 {
    match operator {
        MathOperator::Add => a + b,
        MathOperator::Subtract => a - b,
        MathOperator::Multiply => a * b,
        MathOperator::Divide => {
            if b == 0.0 {
                0.0
            } else {
                a / b
            }
        }
        MathOperator::Sine => a.to_radians().sin(),
        MathOperator::Cosine => a.to_radians().cos(),
        MathOperator::Tangent => a.to_radians().tan(),
        MathOperator::ArcSine => a.clamp(-1.0, 1.0).asin().to_degrees(),
        MathOperator::ArcCosine => a.clamp(-1.0, 1.0).acos().to_degrees(),
        MathOperator::ArcTangent => a.atan().to_degrees(),
        MathOperator::Power => a.powf(b),
        MathOperator::Exponential => a.exp(),
        MathOperator::Logarithm => {
            if a <= 0.0 {
                0.0
            } else {
                a.ln()
            }
        }
        MathOperator::Minimum => a.min(b),
        MathOperator::Maximum => a.max(b),
        // A zero step passes the value through unchanged.
        MathOperator::Round => {
            if b == 0.0 {
                a
            } else {
                (a / b).round() * b
            }
        }
        MathOperator::LessThan => {
            if a < b {
                1.0
            } else {
                0.0
            }
        }
        MathOperator::GreaterThan => {
            if a > b {
                1.0
            } else {
                0.0
            }
        }
        MathOperator::Equal => {
            if (a - b).abs() < VALUE_EPSILON {
                1.0
            } else {
                0.0
            }
        }
        MathOperator::NotEqual => {
            if (a - b).abs() < VALUE_EPSILON {
                0.0
            } else {
                1.0
            }
        }
        MathOperator::Average => (a + b) * 0.5,
    }
}

/// Aggregates the fan-in values. With no connected links the aggregate is
/// the operator's identity where one exists: 1 for multiply, 0 otherwise.
fn apply_multi_math(operator: MultiMathOperator, values: &[f32]) -> f32 {
    if values.is_empty() {
        return match operator {
            MultiMathOperator::Multiply => 1.0,
            _ => 0.0,
        };
    }

    match operator {
        MultiMathOperator::Add => values.iter().sum(),
        MultiMathOperator::Multiply => values.iter().product(),
        MultiMathOperator::Minimum => values.iter().copied().fold(f32::INFINITY, f32::min),
        MultiMathOperator::Maximum => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        MultiMathOperator::Average => values.iter().sum::<f32>() / values.len() as f32,
    }
}

/// Linear remap of `value` from `[lower, upper]` to `[0, 1]`, clamped, with
/// optional inversion. A degenerate range yields 0 regardless of the value.
fn map_range(lower: f32, upper: f32, value: f32, inversed: bool) -> f32 {
    if upper - lower < VALUE_EPSILON {
        return 0.0;
    }
    let t = ((value - lower) / (upper - lower)).clamp(0.0, 1.0);
    if inversed {
        1.0 - t
    } else {
        t
    }
}

/// Nearest entry of the requested class within the search radius. With no
/// hit the distance falls back to the search radius and the direction to the
/// zero vector.
fn closest<'a>(
    entries: impl Iterator<Item = (&'a str, Vec3)>,
    class: &str,
    radius: f32,
    origin: Vec3,
) -> (f32, Vec3) {
    let mut best: Option<(f32, Vec3)> = None;

    for (name, position) in entries {
        if name != class {
            continue;
        }
        let offset = position - origin;
        let distance = offset.length();
        if distance > radius {
            continue;
        }
        if best.is_none_or(|(d, _)| distance < d) {
            let direction = if distance > 0.0 {
                offset / distance
            } else {
                Vec3::ZERO
            };
            best = Some((distance, direction));
        }
    }

    best.unwrap_or((radius, Vec3::ZERO))
}
