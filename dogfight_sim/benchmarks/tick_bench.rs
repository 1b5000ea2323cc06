use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use dogfight_sim::{
    build_scenario_app, run_tick, MapKind, PilotAgent, ScenarioConfig, ScriptedPilot,
    SimulationConfig,
};

fn scripted(_slot: usize) -> Box<dyn PilotAgent> {
    Box::new(ScriptedPilot::holding_course())
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for pilots in [10usize, 50, 200] {
        for map in [MapKind::OpenSky, MapKind::DistantPlanet] {
            let id = BenchmarkId::new(format!("{map:?}"), pilots);
            group.bench_with_input(id, &pilots, |b, &pilots| {
                b.iter_batched(
                    || {
                        let scenario = ScenarioConfig {
                            map,
                            seed: Some(11),
                            continue_after_outcome: true,
                            pilot_count: Some(pilots),
                            ..ScenarioConfig::default()
                        };
                        build_scenario_app(SimulationConfig::builtin(), &scenario, &mut scripted)
                            .expect("benchmark scenario should build")
                    },
                    |mut app| {
                        for _ in 0..10 {
                            run_tick(&mut app);
                        }
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

criterion_group!(tick_benches, bench_tick);
criterion_main!(tick_benches);
