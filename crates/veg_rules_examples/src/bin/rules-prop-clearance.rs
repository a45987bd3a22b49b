use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use veg_rules::prelude::*;
use veg_rules::rulegraph::slots;
use veg_rules_examples::{init_tracing, DemoTerrain};

/// Bush placement driven by the spatial query rules: keep clear of rocks,
/// back off where bushes already crowd, and stay close to existing trees.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut layer = VegetationLayer::new("bushes");
    layer.add_variation(Variation::new("bush").with_model("models/bush.demodel"));

    // Rock clearance: probability ramps from 0 at the rock up to 1 at 8m.
    let rock = layer.add_rule(Rule::new(RuleKind::closest_prop("rock", 20.0)).with_name("rocks"));
    let clearance =
        layer.add_rule(Rule::new(RuleKind::mapping(1.0, 8.0, 0.0, false)).with_name("clearance"));
    layer.add_link(
        rock,
        slots::closest_prop::DISTANCE,
        clearance,
        slots::mapping::VALUE,
    )?;

    // Crowding: more than 6 bushes within 10m suppresses new ones.
    let crowd = layer.add_rule(Rule::new(RuleKind::prop_count("bush", 10.0)).with_name("crowding"));
    let sparse =
        layer.add_rule(Rule::new(RuleKind::mapping(2.0, 6.0, 0.0, true)).with_name("sparseness"));
    layer.add_link(crowd, slots::prop_count::COUNT, sparse, slots::mapping::VALUE)?;

    // Tree affinity: bushes favor the shade of nearby trees.
    let tree =
        layer.add_rule(Rule::new(RuleKind::closest_vegetation("tree", 30.0)).with_name("trees"));
    let shade =
        layer.add_rule(Rule::new(RuleKind::mapping(5.0, 25.0, 0.0, true)).with_name("shade"));
    layer.add_link(
        tree,
        slots::closest_vegetation::DISTANCE,
        shade,
        slots::mapping::VALUE,
    )?;

    let result = layer.add_rule(Rule::new(RuleKind::result(1.0, 0)).with_name("bush result"));
    for rule in [clearance, sparse, shade] {
        layer.add_link(rule, slots::mapping::RESULT, result, slots::result::PROBABILITY)?;
    }

    let terrain = DemoTerrain::new(100.0);

    // Static scene content the queries run against.
    let rocks = [
        Vec3::new(20.0, 0.0, 20.0),
        Vec3::new(55.0, 0.0, 40.0),
        Vec3::new(80.0, 0.0, 75.0),
    ];
    let trees = [
        Vec3::new(25.0, 0.0, 30.0),
        Vec3::new(50.0, 0.0, 50.0),
        Vec3::new(70.0, 0.0, 20.0),
    ];

    let mut placed = Vec::new();
    let candidates = 50;

    for j in 0..candidates {
        for i in 0..candidates {
            let x = (i as f32 + 0.5) / candidates as f32 * terrain.extent;
            let z = (j as f32 + 0.5) / candidates as f32 * terrain.extent;
            let position = terrain.candidate(x, z);

            let mut env = EvaluationEnvironment::new(position, terrain.normal(x, z))
                .with_rng(StdRng::seed_from_u64((j * candidates + i) as u64));
            env.populate_with_objects(
                rocks
                    .iter()
                    .map(|&p| NearbyObject::new("rock", terrain.candidate(p.x, p.z))),
            );
            for &b in &placed {
                env.add_object(NearbyObject::new("bush", b));
            }
            env.populate_with_vegetation(
                trees
                    .iter()
                    .map(|&p| NearbyVegetation::new("tree", terrain.candidate(p.x, p.z))),
            );

            layer.evaluate_rules(&mut env)?;
            if env.probability > 0.4 {
                placed.push(position);
            }
        }
    }

    info!(
        "Placed {} bushes out of {} candidates.",
        placed.len(),
        candidates * candidates
    );
    Ok(())
}
