//! Benchmarks for the attribute and event hot paths.
//!
//! - `get` with and without a getter
//! - `set` that changes the value and notifies listeners
//! - `trigger` with a growing number of listeners

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use weft_base::{AttrSpec, Class, ClassDef, Config, Func, Instance, Value, arr, obj};

fn widget() -> Instance {
    Class::base()
        .extend(
            ClassDef::new("Widget")
                .attr("x", 0)
                .attr("y", 0)
                .attr("size", obj! { "width": 100, "height": 100 })
                .attr_spec(
                    "xy",
                    AttrSpec::new().getter(|this| arr![this.get("x"), this.get("y")]),
                ),
        )
        .create(Config::new())
        .expect("widget")
}

fn bench_get(c: &mut Criterion) {
    let w = widget();
    let mut group = c.benchmark_group("attrs/get");

    group.bench_function("stored", |b| b.iter(|| black_box(w.get(black_box("x")))));
    group.bench_function("getter", |b| b.iter(|| black_box(w.get(black_box("xy")))));

    group.finish();
}

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("attrs/set");

    for listeners in [0, 1, 10] {
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, &count| {
                let w = widget();
                for _ in 0..count {
                    w.on("change:x", Func::noop());
                }
                let mut n = 0.0;
                b.iter(|| {
                    n += 1.0;
                    w.set("x", black_box(n));
                });
            },
        );
    }

    group.finish();
}

fn bench_trigger(c: &mut Criterion) {
    let mut group = c.benchmark_group("events/trigger");

    for listeners in [1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            &listeners,
            |b, &count| {
                let w = widget();
                for _ in 0..count {
                    w.on("show", Func::noop());
                }
                let args = [Value::from(1), Value::from("payload")];
                b.iter(|| {
                    w.trigger(black_box("show"), &args);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_get, bench_set, bench_trigger);
criterion_main!(benches);
