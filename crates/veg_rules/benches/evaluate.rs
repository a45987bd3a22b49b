use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use veg_rules::prelude::{
    EvaluationEnvironment, MathOperator, MultiMathOperator, NearbyObject, Rule, RuleKind,
    VegetationLayer,
};
use veg_rules::rulegraph::slots;

const CHAIN_LENGTHS: [usize; 4] = [4, 16, 64, 256];

fn configured_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(30)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3))
}

/// A layer whose probability is fed by a chain of math rules of the given
/// length, rooted in the candidate height.
fn make_chain_layer(length: usize) -> VegetationLayer {
    let mut layer = VegetationLayer::new(format!("chain_{length}"));

    let geometry = layer.add_rule(Rule::new(RuleKind::geometry()));
    let mut previous = (geometry, slots::geometry::HEIGHT);
    for i in 0..length {
        let operator = match i % 4 {
            0 => MathOperator::Add,
            1 => MathOperator::Multiply,
            2 => MathOperator::Minimum,
            _ => MathOperator::Average,
        };
        let math = layer.add_rule(Rule::new(RuleKind::math(operator, 0.0, 0.5)));
        layer
            .add_link(previous.0, previous.1, math, slots::math::VALUE_A)
            .expect("link ok");
        previous = (math, slots::math::RESULT);
    }

    let gather = layer.add_rule(Rule::new(RuleKind::multi_math(MultiMathOperator::Average)));
    layer
        .add_link(previous.0, previous.1, gather, slots::multi_math::VALUES)
        .expect("link ok");

    let result = layer.add_rule(Rule::new(RuleKind::result(1.0, 0)));
    layer
        .add_link(
            gather,
            slots::multi_math::RESULT,
            result,
            slots::result::PROBABILITY,
        )
        .expect("link ok");

    layer
}

/// A layer dominated by the memoized spatial query rules.
fn make_spatial_layer() -> VegetationLayer {
    let mut layer = VegetationLayer::new("spatial");

    let closest = layer.add_rule(Rule::new(RuleKind::closest_prop("rock", 50.0)));
    let count = layer.add_rule(Rule::new(RuleKind::prop_count("rock", 50.0)));
    let mix = layer.add_rule(Rule::new(RuleKind::math(MathOperator::Multiply, 0.0, 0.0)));
    layer
        .add_link(closest, slots::closest_prop::DISTANCE, mix, slots::math::VALUE_A)
        .expect("link ok");
    layer
        .add_link(count, slots::prop_count::COUNT, mix, slots::math::VALUE_B)
        .expect("link ok");

    let result = layer.add_rule(Rule::new(RuleKind::result(1.0, 0)));
    layer
        .add_link(mix, slots::math::RESULT, result, slots::result::PROBABILITY)
        .expect("link ok");

    layer
}

fn make_environment(seed: u64) -> EvaluationEnvironment {
    EvaluationEnvironment::new([12.0, 4.5, -7.0], [0.0, 1.0, 0.0])
        .with_rng(StdRng::seed_from_u64(seed))
}

fn evaluate_chain_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("layer/evaluate_chain");

    for &length in &CHAIN_LENGTHS {
        let layer = make_chain_layer(length);
        group.throughput(Throughput::Elements(length as u64));

        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter_batched(
                || make_environment(7),
                |mut env| {
                    layer.evaluate_rules(&mut env).expect("evaluate ok");
                    black_box(env.probability);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn evaluate_spatial_benches(c: &mut Criterion) {
    let layer = make_spatial_layer();
    let object_counts = [16usize, 256, 4096];

    let mut group = c.benchmark_group("layer/evaluate_spatial");
    for &object_count in &object_counts {
        group.throughput(Throughput::Elements(object_count as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(object_count),
            &object_count,
            |b, _| {
                b.iter_batched(
                    || {
                        let mut env = make_environment(7);
                        env.populate_with_objects((0..object_count).map(|i| {
                            let angle = i as f32 * 0.37;
                            NearbyObject::new(
                                if i % 3 == 0 { "rock" } else { "tree" },
                                Vec3::new(angle.cos(), 0.0, angle.sin()) * (i % 60) as f32,
                            )
                        }));
                        env
                    },
                    |mut env| {
                        layer.evaluate_rules(&mut env).expect("evaluate ok");
                        black_box(env.probability);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = configured_criterion();
    targets = evaluate_chain_benches, evaluate_spatial_benches
}
criterion_main!(benches);
