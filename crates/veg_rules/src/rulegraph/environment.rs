//! Per-candidate evaluation context.
//!
//! An [`EvaluationEnvironment`] is created by the caller immediately before
//! evaluating one candidate placement point and discarded right after. It
//! carries the world-derived inputs the Geometry rule reads, the
//! nearby-object and nearby-vegetation caches the spatial query rules scan,
//! the RNG the Random rule draws from, and the two evaluation outputs.
//!
//! It also owns the per-pass memo table for the memoized rule kinds. Keeping
//! that state here instead of inside the rules means evaluating independent
//! environments against one unmodified layer needs only `&VegetationLayer`.
use glam::{Vec2, Vec3};
use mint::Vector3;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::rulegraph::RuleIndex;

/// One entry of the nearby-object cache: an object class and its world
/// position. The sole data source for the ClosestProp and PropCount rules.
#[derive(Clone, Debug)]
pub struct NearbyObject {
    pub class_name: String,
    pub position: Vec3,
}

impl NearbyObject {
    pub fn new(class_name: impl Into<String>, position: impl Into<Vector3<f32>>) -> Self {
        Self {
            class_name: class_name.into(),
            position: Vec3::from(position.into()),
        }
    }
}

/// One entry of the nearby-vegetation cache: a vegetation type and its world
/// position. The sole data source for the ClosestVegetation rule.
#[derive(Clone, Debug)]
pub struct NearbyVegetation {
    pub vegetation_type: String,
    pub position: Vec3,
}

impl NearbyVegetation {
    pub fn new(vegetation_type: impl Into<String>, position: impl Into<Vector3<f32>>) -> Self {
        Self {
            vegetation_type: vegetation_type.into(),
            position: Vec3::from(position.into()),
        }
    }
}

/// Per-pass cache entry for a memoized rule.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) enum RuleMemo {
    #[default]
    None,
    /// Random rule: the value drawn for this pass.
    Value(f32),
    /// ClosestProp / ClosestVegetation: the resolved query result.
    Closest { distance: f32, direction: Vec3 },
    /// PropCount: the resolved count.
    Count(f32),
}

/// Transient context for evaluating one candidate placement point.
pub struct EvaluationEnvironment {
    /// Candidate position in world space.
    pub position: Vec3,
    /// Terrain surface normal at the candidate position.
    pub normal: Vec3,
    /// Candidate position in terrain sector coordinates.
    pub terrain_coordinates: Vec2,
    /// Type number of the dominant terrain texture under the candidate.
    pub terrain_type: i32,
    /// Opaque prop-field handle carried for the caller's bookkeeping.
    pub prop_field: Option<u32>,
    /// Opaque occupation-mask handle carried for the caller's bookkeeping.
    pub occupation_mask: Option<u32>,
    /// Placement probability written by the Result rule.
    pub probability: f32,
    /// Variation index written by the Result rule.
    pub variation: usize,
    objects: Vec<NearbyObject>,
    vegetation: Vec<NearbyVegetation>,
    rng: Box<dyn RngCore>,
    memo: Vec<RuleMemo>,
}

impl EvaluationEnvironment {
    /// Creates an environment for a candidate position and surface normal,
    /// seeded from OS entropy.
    pub fn new(position: impl Into<Vector3<f32>>, normal: impl Into<Vector3<f32>>) -> Self {
        Self {
            position: Vec3::from(position.into()),
            normal: Vec3::from(normal.into()),
            terrain_coordinates: Vec2::ZERO,
            terrain_type: 0,
            prop_field: None,
            occupation_mask: None,
            probability: 0.0,
            variation: 0,
            objects: Vec::new(),
            vegetation: Vec::new(),
            rng: Box::new(StdRng::from_os_rng()),
            memo: Vec::new(),
        }
    }

    /// Replaces the RNG, e.g. with a seeded one for reproducible passes.
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_terrain_coordinates(mut self, coordinates: Vec2) -> Self {
        self.terrain_coordinates = coordinates;
        self
    }

    pub fn with_terrain_type(mut self, terrain_type: i32) -> Self {
        self.terrain_type = terrain_type;
        self
    }

    /// Fills the nearby-object cache, replacing any previous content.
    pub fn populate_with_objects(&mut self, objects: impl IntoIterator<Item = NearbyObject>) {
        self.objects.clear();
        self.objects.extend(objects);
    }

    pub fn add_object(&mut self, object: NearbyObject) {
        self.objects.push(object);
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
    }

    pub fn objects(&self) -> &[NearbyObject] {
        &self.objects
    }

    /// Fills the nearby-vegetation cache, replacing any previous content.
    pub fn populate_with_vegetation(
        &mut self,
        vegetation: impl IntoIterator<Item = NearbyVegetation>,
    ) {
        self.vegetation.clear();
        self.vegetation.extend(vegetation);
    }

    pub fn add_vegetation(&mut self, vegetation: NearbyVegetation) {
        self.vegetation.push(vegetation);
    }

    pub fn clear_vegetation(&mut self) {
        self.vegetation.clear();
    }

    pub fn vegetation(&self) -> &[NearbyVegetation] {
        &self.vegetation
    }

    /// Drops all memoized per-pass state for a layer with `rule_count` rules.
    pub(crate) fn reset_pass(&mut self, rule_count: usize) {
        self.memo.clear();
        self.memo.resize_with(rule_count, RuleMemo::default);
    }

    pub(crate) fn memo(&self, rule: RuleIndex) -> Option<&RuleMemo> {
        self.memo.get(rule)
    }

    pub(crate) fn set_memo(&mut self, rule: RuleIndex, memo: RuleMemo) {
        if self.memo.len() <= rule {
            self.memo.resize_with(rule + 1, RuleMemo::default);
        }
        self.memo[rule] = memo;
    }

    /// Draws a uniform value in [0, 1].
    pub(crate) fn rand01(&mut self) -> f32 {
        (self.rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_replaces_previous_cache_content() {
        let mut env = EvaluationEnvironment::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        env.add_object(NearbyObject::new("rock", [1.0, 0.0, 0.0]));
        env.populate_with_objects([
            NearbyObject::new("tree", [2.0, 0.0, 0.0]),
            NearbyObject::new("tree", [3.0, 0.0, 0.0]),
        ]);

        assert_eq!(env.objects().len(), 2);
        assert!(env.objects().iter().all(|o| o.class_name == "tree"));
    }

    #[test]
    fn rand01_stays_in_unit_range() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut env = EvaluationEnvironment::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
            .with_rng(StdRng::seed_from_u64(9));
        for _ in 0..64 {
            let v = env.rand01();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn set_memo_grows_the_table_on_demand() {
        let mut env = EvaluationEnvironment::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        env.set_memo(3, RuleMemo::Value(0.5));
        assert!(matches!(env.memo(3), Some(RuleMemo::Value(v)) if *v == 0.5));
        assert!(matches!(env.memo(1), Some(RuleMemo::None)));
        assert!(env.memo(7).is_none());
    }
}
