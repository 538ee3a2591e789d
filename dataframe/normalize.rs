use crate::Record;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
	#[error("cannot normalize an empty dataset")]
	Empty,
	#[error("every visit rate is {value}, so the range is degenerate and cannot be normalized")]
	DegenerateRange { value: f32 },
}

/// These are the minimum and maximum raw visit rates the records were normalized with.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizationStats {
	pub min: f32,
	pub max: f32,
}

impl NormalizationStats {
	pub fn normalize(&self, value: f32) -> f32 {
		(value - self.min) / (self.max - self.min)
	}

	/// Map a normalized value, such as a prediction, back to raw visit rate units.
	pub fn denormalize(&self, value: f32) -> f32 {
		value * (self.max - self.min) + self.min
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
	/// The records in their original order, with each `visit_rate` in [0, 1].
	pub records: Vec<Record>,
	pub stats: NormalizationStats,
}

/**
Rescale the visit rates of `records` into [0, 1] with min-max scaling.

`visit_rate = (visit_rate - min) / (max - min)`

| raw visit rate | normalized visit rate |
|----------------|-----------------------|
| 5.0            | 0.5                   |
| 10.0           | 1.0                   |
| 0.0            | 0.0                   |
*/
pub fn normalize(mut records: Vec<Record>) -> Result<NormalizedDataset, NormalizeError> {
	let first = records.first().ok_or(NormalizeError::Empty)?.visit_rate;
	let (min, max) = records
		.iter()
		.fold((first, first), |(min, max), record| {
			(min.min(record.visit_rate), max.max(record.visit_rate))
		});
	if max == min {
		return Err(NormalizeError::DegenerateRange { value: min });
	}
	let stats = NormalizationStats { min, max };
	for record in records.iter_mut() {
		record.visit_rate = stats.normalize(record.visit_rate);
	}
	Ok(NormalizedDataset { records, stats })
}

#[cfg(test)]
fn record(place_id: &str, date_bucket: &str, hour: i64, visit_rate: f32) -> Record {
	Record {
		place_id: place_id.to_owned(),
		date_bucket: date_bucket.to_owned(),
		hour,
		visit_rate,
	}
}

#[test]
fn test_normalize() {
	let records = vec![
		record("p1", "Mon", 10, 5.0),
		record("p1", "Mon", 12, 10.0),
		record("p2", "Tue", 10, 0.0),
	];
	let normalized = normalize(records).unwrap();
	let visit_rates: Vec<f32> = normalized.records.iter().map(|r| r.visit_rate).collect();
	insta::assert_debug_snapshot!(visit_rates, @r###"
	[
	    0.5,
	    1.0,
	    0.0,
	]
	"###);
	assert_eq!(normalized.stats, NormalizationStats { min: 0.0, max: 10.0 });
	assert_eq!(normalized.records[0].hour, 10);
	assert_eq!(normalized.records[2].place_id, "p2");
}

#[test]
fn test_normalize_bounds() {
	let records = (0..50)
		.map(|i| record("p", "d", i, 3.0 + ((i * 37) % 11) as f32 * 1.7))
		.collect::<Vec<_>>();
	let raw_min = records
		.iter()
		.map(|r| r.visit_rate)
		.fold(f32::INFINITY, f32::min);
	let raw_max = records
		.iter()
		.map(|r| r.visit_rate)
		.fold(f32::NEG_INFINITY, f32::max);
	let normalized = normalize(records.clone()).unwrap();
	for (raw, normalized) in records.iter().zip(normalized.records.iter()) {
		assert!(normalized.visit_rate >= 0.0 && normalized.visit_rate <= 1.0);
		if raw.visit_rate == raw_min {
			assert_eq!(normalized.visit_rate, 0.0);
		}
		if raw.visit_rate == raw_max {
			assert_eq!(normalized.visit_rate, 1.0);
		}
	}
}

#[test]
fn test_denormalize() {
	let stats = NormalizationStats { min: 2.0, max: 6.0 };
	assert_eq!(stats.normalize(4.0), 0.5);
	assert_eq!(stats.denormalize(0.5), 4.0);
	assert_eq!(stats.denormalize(stats.normalize(6.0)), 6.0);
}

#[test]
fn test_normalize_degenerate_range() {
	let records = vec![record("p1", "Mon", 1, 4.0), record("p2", "Tue", 2, 4.0)];
	assert_eq!(
		normalize(records),
		Err(NormalizeError::DegenerateRange { value: 4.0 })
	);
	assert_eq!(normalize(Vec::new()), Err(NormalizeError::Empty));
}
