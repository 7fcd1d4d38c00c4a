use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use test_log::test;
use tier_table::{Error, Key, Table};

#[test]
fn churn_agrees_with_a_model() -> tier_table::Result<()> {
    let table = Table::with_capacity(1_024)?;
    let mut model = HashMap::new();

    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50_000 {
        let raw: u64 = rng.random_range(0..500);
        let key = Key::from_u64(raw);

        if rng.random_bool(0.5) {
            match table.insert(key, raw) {
                Ok(()) => {
                    assert_eq!(None, model.insert(raw, raw));
                }
                Err(Error::KeyExists) => {
                    assert!(model.contains_key(&raw));
                }
                Err(e) => return Err(e),
            }
        } else {
            assert_eq!(model.remove(&raw), table.remove(&key));
        }
    }

    assert_eq!(model.len(), table.len());

    for (&raw, &value) in &model {
        assert_eq!(Some(value), table.get(&Key::from_u64(raw)));
    }

    // Spot check some keys that were never inserted
    for raw in 1_000..1_100u64 {
        assert_eq!(None, table.get(&Key::from_u64(raw)));
    }

    let stats = table.stats();
    assert_eq!(model.len() as u32, stats.count);
    assert_eq!(1_024, stats.bucket_count);

    // Per-bucket occupancy adds back up to the entry count as long as no
    // bucket saturated the top histogram cell
    if (stats.max as usize) < tier_table::HISTOGRAM_LEN - 1 {
        let weighted: u64 = stats
            .histogram
            .iter()
            .enumerate()
            .map(|(value, &freq)| value as u64 * u64::from(freq))
            .sum();

        assert_eq!(model.len() as u64, weighted);
    }

    Ok(())
}

#[test]
fn churn_clear_resets_everything() -> tier_table::Result<()> {
    let table = Table::with_capacity(16)?;

    for i in 0..200u64 {
        table.insert(Key::from_u64(i), i)?;
    }

    table.clear();

    assert_eq!(0, table.len());

    let stats = table.stats();
    assert_eq!(0, stats.count);
    assert_eq!(0, stats.max);
    assert_eq!(16, stats.min_count);

    // A cleared table keeps working
    for i in 0..200u64 {
        table.insert(Key::from_u64(i), i)?;
    }

    assert_eq!(200, table.len());

    Ok(())
}
