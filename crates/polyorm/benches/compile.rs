use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use polyorm::{
    DialectKind, Expr, FieldDefinition, FieldType, ModelDefinition, SqlExpression, col, fields,
};
use std::sync::Arc;

/// Model with `n` integer columns `C0..Cn` plus an `Id` key.
fn wide_model(n: usize) -> Arc<ModelDefinition> {
    let mut builder = ModelDefinition::builder("Wide")
        .field(FieldDefinition::new("Id", FieldType::Int64).auto_increment());
    for i in 0..n {
        builder = builder.field(FieldDefinition::new(format!("C{i}"), FieldType::Int32).nullable());
    }
    Arc::new(builder.build().unwrap())
}

/// `C0 > 0 AND C1 > 1 AND ...`
fn conjunction(n: usize) -> Expr {
    let mut predicate = col("C0").gt(0);
    for i in 1..n {
        predicate = predicate.and(col(format!("C{i}")).gt(i as i64));
    }
    predicate
}

fn bench_compile_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/filter");

    for n in [1, 5, 10, 50] {
        let model = wide_model(n);
        let predicate = conjunction(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &predicate, |b, predicate| {
            b.iter(|| {
                let mut q = SqlExpression::new(DialectKind::Sqlite.create(None), model.clone());
                q.filter(predicate).unwrap();
                black_box(q.to_select_statement());
            });
        });
    }

    group.finish();
}

fn bench_parameterized_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/parameterized_filter");
    let base = DialectKind::Postgres.create(None);
    let dialect = base.with_config(base.config().clone().with_parameterized(true));

    for n in [1, 10, 50] {
        let model = wide_model(n);
        let predicate = conjunction(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &predicate, |b, predicate| {
            b.iter(|| {
                let mut q = SqlExpression::new(dialect.clone(), model.clone());
                q.filter(predicate).unwrap();
                black_box(q.params().len());
            });
        });
    }

    group.finish();
}

fn bench_select_with_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/select_ordered_paged");

    for kind in DialectKind::ALL {
        let model = wide_model(10);
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, kind| {
            b.iter(|| {
                let mut q = SqlExpression::new(kind.create(None), model.clone());
                q.filter(col("C0").is_null()).unwrap();
                q.order_by(fields(["C1", "C2"])).unwrap();
                q.limit(10, 100);
                black_box(q.to_select_statement());
            });
        });
    }

    group.finish();
}

fn bench_create_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("dialect/create_table");

    for n in [5, 50] {
        let model = wide_model(n);
        for kind in [DialectKind::Firebird, DialectKind::SqlServer] {
            let dialect = kind.create(None);
            group.bench_with_input(
                BenchmarkId::new(kind.name(), n),
                &model,
                |b, model| {
                    b.iter(|| black_box(dialect.create_table_statement(model).unwrap()));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile_filter,
    bench_parameterized_filter,
    bench_select_with_ordering,
    bench_create_table
);
criterion_main!(benches);
