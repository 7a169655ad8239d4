//! Single-fitting pipeline and stacking penalty timings.
//!
//! Run with: `cargo bench --bench fitting`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eva_fitting::data::{ActivityRegistry, StaticDataSnapshot};
use eva_fitting::dogma::stacking::{calculate_stacking_penalties, StackableModule};
use eva_fitting::dogma::{DogmaEngine, FittingRequest, ModuleFit, SkillSet, SlotType};
use eva_fitting::FittingEffectivenessCalculator;

fn fixture() -> StaticDataSnapshot {
    let path = format!("{}/tests/fixtures/static_data.json", env!("CARGO_MANIFEST_DIR"));
    StaticDataSnapshot::load(path).expect("fixture static data")
}

fn rifter() -> FittingRequest {
    let mut modules: Vec<ModuleFit> = (0..3)
        .map(|_| ModuleFit::online(2881, SlotType::High).with_charge(185))
        .collect();
    modules.extend((0..2).map(|_| ModuleFit::online(519, SlotType::Low)));
    modules.push(ModuleFit::online(3841, SlotType::Mid));
    modules.push(ModuleFit::active(439, SlotType::Mid));
    modules.push(ModuleFit::online(31718, SlotType::Rig));
    FittingRequest::new(587, modules, SkillSet::new().with_level(3329, 4))
}

fn bench_stacking(c: &mut Criterion) {
    let rows: Vec<StackableModule> = (0..64)
        .map(|i| StackableModule {
            module_type_id: 500 + (i % 7),
            effect_id: 1000 + (i % 3),
            attribute_id: 64,
            stacking_group_id: (i % 4) as i32,
            bonus_amount: 5.0 + f64::from(i % 11),
        })
        .collect();

    c.bench_function("stacking_penalties_64_rows", |b| {
        b.iter(|| black_box(calculate_stacking_penalties(black_box(&rows))));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let engine = DogmaEngine::new(Arc::new(fixture()));
    let request = rifter();
    let calculator = FittingEffectivenessCalculator::new(
        engine.clone(),
        Arc::new(ActivityRegistry::builtin().expect("builtin profiles")),
    );

    let mut group = c.benchmark_group("fitting");
    group.bench_function("calculate_fitting", |b| {
        b.iter(|| black_box(engine.calculate_fitting(black_box(&request))));
    });
    group.bench_function("effectiveness_small_gang", |b| {
        b.iter(|| {
            black_box(calculator.evaluate_request(black_box(&request), "small_gang_pvp", None))
        });
    });
    group.bench_function("compare_all_activities", |b| {
        b.iter(|| {
            black_box(calculator.compare_all_activities(
                request.ship_type_id,
                &request.modules,
                &request.skills,
            ))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_stacking, bench_pipeline);
criterion_main!(benches);
