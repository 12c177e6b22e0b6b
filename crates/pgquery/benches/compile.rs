use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgquery::{ConditionFactory, Predicate, QueryBuilder};

/// A query with `n` ANDed conditions, each an OR of an equality and an IN list:
/// SELECT * FROM t WHERE (col0 = $1 OR col0 IN ($2, $3)) AND ...
fn build_query(n: usize) -> QueryBuilder {
    let c = ConditionFactory::new("t");
    let mut q = QueryBuilder::new("t");
    for i in 0..n {
        let field = format!("col{i}");
        let eq = c.eq(&field, i as i64).unwrap();
        let list = c.in_list(&field, [i as i64, i as i64 + 1]).unwrap();
        q.and_where(c.or([eq, list]));
    }
    q.order_by_desc("col0").limit(50);
    q
}

/// `depth` CTEs, each wrapping the previous one.
fn build_nested(depth: usize) -> QueryBuilder {
    let c = ConditionFactory::new("t");
    let mut inner = QueryBuilder::new("t");
    inner.and_where(c.eq("id", 0).unwrap());
    for level in 1..=depth {
        let mut outer = QueryBuilder::new(format!("q{level}"));
        outer
            .with(&format!("q{level}"), &inner)
            .unwrap()
            .and_where(c.gt("id", level as i64).unwrap());
        inner = outer;
    }
    inner
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/flat");

    for n in [1, 5, 10, 50, 100] {
        let q = build_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.compile()));
        });
    }

    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/nested_ctes");

    for depth in [1, 4, 16] {
        let q = build_nested(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &q, |b, q| {
            b.iter(|| black_box(q.compile()));
        });
    }

    group.finish();
}

fn bench_deep_predicate(c: &mut Criterion) {
    let f = ConditionFactory::new("t");
    let mut tree: Predicate = f.eq("a", 1).unwrap();
    for i in 0..64 {
        tree = if i % 2 == 0 {
            f.and([tree, f.gt("b", i).unwrap()])
        } else {
            f.not(f.or([tree, f.is_null("c").unwrap()]))
        };
    }

    c.bench_function("compile/deep_predicate", |b| {
        b.iter(|| black_box(pgquery::compile_predicate(&tree)));
    });
}

criterion_group!(benches, bench_compile, bench_nested, bench_deep_predicate);
criterion_main!(benches);
