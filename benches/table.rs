use criterion::{criterion_group, criterion_main, Criterion};
use tier_table::{Key, Table};

fn table_get(c: &mut Criterion) {
    let table = Table::with_capacity(1_024).expect("table should allocate");

    for i in 0..100_000u64 {
        table.insert(Key::from_u64(i), i).expect("keys are distinct");
    }

    c.bench_function("get hit", |b| {
        b.iter(|| {
            assert_eq!(Some(500), table.get(&Key::from_u64(500)));
        });
    });

    c.bench_function("get miss", |b| {
        b.iter(|| {
            assert_eq!(None, table.get(&Key::from_u64(u64::MAX)));
        });
    });
}

fn table_insert_remove(c: &mut Criterion) {
    let table = Table::with_capacity(1_024).expect("table should allocate");

    for i in 0..10_000u64 {
        table.insert(Key::from_u64(i), i).expect("keys are distinct");
    }

    c.bench_function("insert + remove", |b| {
        b.iter(|| {
            let key = Key::from_u64(u64::MAX);
            table.insert(key, 0).expect("key was removed");
            assert_eq!(Some(0), table.remove(&key));
        });
    });
}

fn table_stats(c: &mut Criterion) {
    let table = Table::with_capacity(1_024).expect("table should allocate");

    for i in 0..10_000u64 {
        table.insert(Key::from_u64(i), i).expect("keys are distinct");
    }

    c.bench_function("stats", |b| {
        b.iter(|| {
            let stats = table.stats();
            assert_eq!(10_000, stats.count);
        });
    });
}

fn key_construction(c: &mut Criterion) {
    c.bench_function("key from u64", |b| {
        b.iter(|| Key::from_u64(0xDEAD_BEEF));
    });

    c.bench_function("key from words", |b| {
        let words = [1u32, 2, 3, 4, 5, 6, 7, 8];
        b.iter(|| Key::from_words(&words));
    });
}

criterion_group!(
    benches,
    table_get,
    table_insert_remove,
    table_stats,
    key_construction
);
criterion_main!(benches);
