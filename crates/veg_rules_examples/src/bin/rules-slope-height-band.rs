use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use veg_rules::prelude::*;
use veg_rules::rulegraph::slots;
use veg_rules_examples::{init_tracing, DemoTerrain};

/// Grass placement driven by slope and height: flat ground in a low height
/// band gets dense grass, steep or high ground gets none. A random rule
/// picks between two grass variations.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut layer = VegetationLayer::new("grass");
    layer.add_variation(Variation::new("grass_short").with_model("models/grass_short.demodel"));
    layer.add_variation(Variation::new("grass_tall").with_model("models/grass_tall.demodel"));

    let geometry = layer.add_rule(Rule::new(RuleKind::geometry()).with_name("terrain"));

    // Slope factor: the y component of the surface normal, remapped so that
    // anything flatter than ~25 degrees scores 1 and steeper fades to 0.
    let normal = layer.add_rule(Rule::new(RuleKind::components(Vec3::Y)).with_name("normal"));
    layer.add_link(
        geometry,
        slots::geometry::NORMAL,
        normal,
        slots::components::VECTOR,
    )?;
    let slope = layer.add_rule(Rule::new(RuleKind::mapping(0.7, 0.9, 0.0, false)).with_name("slope"));
    layer.add_link(normal, slots::components::Y, slope, slots::mapping::VALUE)?;

    // Height band: full probability near sea level, fading out above 6m.
    let band =
        layer.add_rule(Rule::new(RuleKind::mapping(2.0, 6.0, 0.0, true)).with_name("height band"));
    layer.add_link(geometry, slots::geometry::HEIGHT, band, slots::mapping::VALUE)?;

    // Random thinning so the grass does not carpet every eligible cell.
    let random = layer.add_rule(Rule::new(RuleKind::random()).with_name("thinning"));

    let result = layer.add_rule(Rule::new(RuleKind::result(1.0, 0)).with_name("grass result"));
    for (rule, slot) in [
        (slope, slots::mapping::RESULT),
        (band, slots::mapping::RESULT),
        (random, slots::random::RESULT),
    ] {
        layer.add_link(rule, slot, result, slots::result::PROBABILITY)?;
    }

    // Variation selection: tall grass on the flattest ground.
    let tall = layer.add_rule(
        Rule::new(RuleKind::math(MathOperator::GreaterThan, 0.0, 0.95)).with_name("tall pick"),
    );
    layer.add_link(normal, slots::components::Y, tall, slots::math::VALUE_A)?;
    layer.add_link(tall, slots::math::RESULT, result, slots::result::VARIATION)?;

    let terrain = DemoTerrain::new(100.0);
    let mut placed = 0usize;
    let mut tall_count = 0usize;
    let candidates = 40;

    for j in 0..candidates {
        for i in 0..candidates {
            let x = (i as f32 + 0.5) / candidates as f32 * terrain.extent;
            let z = (j as f32 + 0.5) / candidates as f32 * terrain.extent;

            let mut env =
                EvaluationEnvironment::new(terrain.candidate(x, z), terrain.normal(x, z))
                    .with_rng(StdRng::seed_from_u64((j * candidates + i) as u64));
            layer.evaluate_rules(&mut env)?;

            if env.probability > 0.5 {
                placed += 1;
                if env.variation == 1 {
                    tall_count += 1;
                }
            }
        }
    }

    info!(
        "Placed {placed} of {} candidates ({tall_count} tall grass).",
        candidates * candidates
    );
    Ok(())
}
