use criterion::{black_box, criterion_group, criterion_main, Criterion};

use geopoint_auth::evaluator;
use geopoint_auth::Role;

fn bench_role_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_parse");

    group.bench_function("canonical_tag", |b| {
        b.iter(|| Role::parse(black_box("supervisor")))
    });
    group.bench_function("synonym_mixed_case", |b| {
        b.iter(|| Role::parse(black_box("  ADMINISTRADOR ")))
    });
    group.bench_function("unknown_tag", |b| b.iter(|| Role::parse(black_box("operador"))));

    group.finish();
}

fn bench_permission_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("permission_evaluation");

    group.bench_function("change_password", |b| {
        b.iter(|| {
            evaluator::change_password(
                black_box(Some(Role::Supervisor)),
                black_box(Some(Role::Usuario)),
                black_box(false),
            )
        })
    });

    group.bench_function("update_user", |b| {
        b.iter(|| {
            evaluator::update_user(
                black_box(Some(Role::Supervisor)),
                black_box(Some(Role::Usuario)),
                black_box(Role::Zonal),
            )
        })
    });

    group.bench_function("batch_delete_64_targets", |b| {
        let targets: Vec<Option<Role>> = (0..64)
            .map(|i| match i % 3 {
                0 => Some(Role::Usuario),
                1 => Some(Role::Zonal),
                _ => None,
            })
            .collect();
        b.iter(|| evaluator::delete_users(black_box(Some(Role::Supervisor)), black_box(&targets)))
    });

    group.finish();
}

criterion_group!(benches, bench_role_parse, bench_permission_evaluation);
criterion_main!(benches);
