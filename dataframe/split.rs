use crate::Record;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
	#[error("test fraction must be in (0, 1), got {0}")]
	InvalidFraction(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
	pub train: Vec<Record>,
	pub test: Vec<Record>,
}

pub fn validate_test_fraction(test_fraction: f32) -> Result<(), SplitError> {
	if test_fraction > 0.0 && test_fraction < 1.0 {
		Ok(())
	} else {
		Err(SplitError::InvalidFraction(test_fraction))
	}
}

/**
Partition `records` into a train and a test set.

Each record independently draws a number in [0, 1) from a generator seeded with `seed` and goes to the test set if the draw is below `test_fraction`. The size of the test set therefore only approximates `test_fraction * records.len()`. Records keep their relative order on both sides, and the same records with the same seed always produce the same partition.
*/
pub fn split(records: Vec<Record>, test_fraction: f32, seed: u64) -> Result<Split, SplitError> {
	validate_test_fraction(test_fraction)?;
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let mut train = Vec::with_capacity(records.len());
	let mut test = Vec::new();
	for record in records {
		if rng.gen::<f32>() < test_fraction {
			test.push(record);
		} else {
			train.push(record);
		}
	}
	Ok(Split { train, test })
}

#[cfg(test)]
fn records(n: i64) -> Vec<Record> {
	(0..n)
		.map(|i| Record {
			place_id: format!("p{}", i % 7),
			date_bucket: format!("d{}", i % 3),
			hour: i % 24,
			visit_rate: i as f32,
		})
		.collect()
}

#[test]
fn test_split_is_reproducible() {
	let a = split(records(100), 0.2, 7985).unwrap();
	let b = split(records(100), 0.2, 7985).unwrap();
	assert_eq!(a, b);
}

#[test]
fn test_split_partitions_records() {
	let Split { train, test } = split(records(200), 0.2, 42).unwrap();
	assert_eq!(train.len() + test.len(), 200);
	assert!(!test.is_empty());
	assert!(test.len() < train.len());
	// Both sides keep the original order, and together they hold every record exactly once.
	let mut seen = train
		.iter()
		.chain(test.iter())
		.map(|record| record.visit_rate as i64)
		.collect::<Vec<_>>();
	assert!(train.windows(2).all(|w| w[0].visit_rate < w[1].visit_rate));
	assert!(test.windows(2).all(|w| w[0].visit_rate < w[1].visit_rate));
	seen.sort_unstable();
	assert_eq!(seen, (0..200).collect::<Vec<_>>());
}

#[test]
fn test_split_depends_on_seed() {
	let a = split(records(100), 0.2, 1).unwrap();
	let b = split(records(100), 0.2, 2).unwrap();
	assert_ne!(a.test, b.test);
}

#[test]
fn test_split_invalid_fraction() {
	for test_fraction in &[1.5, 0.0, 1.0, -0.1, f32::NAN] {
		assert!(matches!(
			split(records(10), *test_fraction, 0),
			Err(SplitError::InvalidFraction(_))
		));
	}
}
