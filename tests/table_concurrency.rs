use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::thread;
use test_log::test;
use tier_table::{Key, Table};

#[test]
fn readers_never_block_on_unrelated_writes() -> tier_table::Result<()> {
    let table = Table::with_capacity(1_024)?;

    let stable = Key::from_u64(u64::MAX);
    table.insert(stable, 4242u64)?;

    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !stop.load(Relaxed) {
                    // The stable key is never touched by the writer, so a
                    // reader must observe it on every single lookup
                    assert_eq!(Some(4242), table.get(&stable));
                }
            });
        }

        s.spawn(|| {
            for round in 0..200u64 {
                for i in 0..250 {
                    let key = Key::from_u64(round * 1_000 + i);
                    table.insert(key, i).expect("keys are distinct");
                }

                for i in 0..250 {
                    let key = Key::from_u64(round * 1_000 + i);
                    assert_eq!(Some(i), table.remove(&key));
                }
            }

            stop.store(true, Relaxed);
        });
    });

    assert_eq!(Some(4242), table.get(&stable));
    assert_eq!(1, table.len());

    Ok(())
}

#[test]
fn readers_survive_removal_of_the_looked_up_key() -> tier_table::Result<()> {
    let table = Table::with_capacity(16)?;

    let key = Key::from_u64(123);
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !stop.load(Relaxed) {
                    // Whether the lookup races the insert or the remove, it
                    // sees the full value or nothing
                    if let Some(value) = table.get(&key) {
                        assert_eq!(7, value);
                    }
                }
            });
        }

        s.spawn(|| {
            for _ in 0..20_000 {
                table.insert(key, 7u64).expect("key was removed");
                assert_eq!(Some(7), table.remove(&key));
            }

            stop.store(true, Relaxed);
        });
    });

    assert!(table.is_empty());

    Ok(())
}

#[test]
fn stats_tolerate_a_concurrent_writer() -> tier_table::Result<()> {
    let table = Table::with_capacity(16)?;

    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            while !stop.load(Relaxed) {
                let stats = table.stats();

                // Point-in-time snapshot: individual samples may be stale,
                // but the geometry is fixed
                assert_eq!(16, stats.bucket_count);
                assert_eq!(16, stats.histogram.iter().sum::<u32>());
            }
        });

        s.spawn(|| {
            for i in 0..10_000u64 {
                table.insert(Key::from_u64(i % 64), i).ok();
                table.remove(&Key::from_u64((i + 32) % 64));
            }

            stop.store(true, Relaxed);
        });
    });

    Ok(())
}
