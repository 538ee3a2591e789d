/*!
This crate turns records into the numeric feature vectors the linear model is trained on. An [`EncodingScheme`](struct.EncodingScheme.html) is fit once on the training records and then used unchanged to compute features for the training set, the test set, and every prediction.
*/

#![allow(clippy::tabs_in_doc_comments)]

use fnv::FnvBuildHasher;
use footfall_dataframe::{Column, Example};
use itertools::izip;
use ndarray::{prelude::*, s};
use std::collections::HashMap;

/// This struct describes how to transform one column of an example into one or more features.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGroup {
	Identity(IdentityFeatureGroup),
	OneHotEncoded(OneHotEncodedFeatureGroup),
}

/**
An `IdentityFeatureGroup` passes a single number column to the output features untouched. The hour of a record is encoded this way.

| hour | feature value |
|------|---------------|
| 0    | 0.0           |
| 9    | 9.0           |
| 21   | 21.0          |
*/
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFeatureGroup {
	pub source_column: Column,
}

/**
A `OneHotEncodedFeatureGroup` creates one feature for each option seen in a text column during fitting. For each example, all of the features will have the value 0.0, except the feature corresponding to the column's value, which will have the value 1.0. Values that were not seen during fitting produce all zeros.

# Example

Fitting on the values "b279", "a113", "b279" produces the options `["b279", "a113"]`, in the order they were first seen.

| value     | feature values |
|-----------|----------------|
| "b279"    | [1, 0]         |
| "a113"    | [0, 1]         |
| "UNSEEN"  | [0, 0]         |
*/
#[derive(Debug, Clone)]
pub struct OneHotEncodedFeatureGroup {
	pub source_column: Column,
	/// The options in index order. The feature at index `i` is 1.0 for examples whose value is `options[i]`.
	pub options: Vec<String>,
	options_map: HashMap<String, usize, FnvBuildHasher>,
}

impl PartialEq for OneHotEncodedFeatureGroup {
	fn eq(&self, other: &Self) -> bool {
		self.source_column == other.source_column && self.options == other.options
	}
}

impl OneHotEncodedFeatureGroup {
	/// Create a feature group from options in index order. If an option is repeated, its first index is used.
	pub fn new(source_column: Column, options: Vec<String>) -> Self {
		let mut options_map: HashMap<String, usize, FnvBuildHasher> = HashMap::default();
		for (index, option) in options.iter().enumerate() {
			options_map.entry(option.clone()).or_insert(index);
		}
		Self {
			source_column,
			options,
			options_map,
		}
	}

	/// Assign each distinct value of `source_column` in `examples` an index, in the order the values are first seen.
	pub fn fit<E>(source_column: Column, examples: &[E]) -> Self
	where
		E: Example,
	{
		let mut options = Vec::new();
		let mut options_map: HashMap<String, usize, FnvBuildHasher> = HashMap::default();
		for example in examples.iter() {
			if let Some(value) = example.value(source_column).as_text() {
				if !options_map.contains_key(value) {
					options_map.insert(value.to_owned(), options.len());
					options.push(value.to_owned());
				}
			}
		}
		Self {
			source_column,
			options,
			options_map,
		}
	}

	pub fn option_index(&self, value: &str) -> Option<usize> {
		self.options_map.get(value).copied()
	}

	pub fn has_duplicate_options(&self) -> bool {
		self.options_map.len() != self.options.len()
	}

	fn compute_array_f32<E>(&self, mut features: ArrayViewMut2<f32>, examples: &[E])
	where
		E: Example,
	{
		// Fill the features with zeros.
		features.fill(0.0);
		// For each example, set the feature corresponding to its value to one.
		for (mut features, example) in izip!(features.axis_iter_mut(Axis(0)), examples.iter()) {
			let feature_index = example
				.value(self.source_column)
				.as_text()
				.and_then(|value| self.option_index(value));
			if let Some(feature_index) = feature_index {
				features[feature_index] = 1.0;
			}
		}
	}
}

impl IdentityFeatureGroup {
	fn compute_array_f32<E>(&self, mut features: ArrayViewMut2<f32>, examples: &[E])
	where
		E: Example,
	{
		for (feature, example) in izip!(features.column_mut(0), examples.iter()) {
			*feature = example
				.value(self.source_column)
				.as_number()
				.unwrap_or(0.0);
		}
	}
}

impl FeatureGroup {
	/// Return the number of features this feature group will produce.
	pub fn n_features(&self) -> usize {
		match self {
			FeatureGroup::Identity(_) => 1,
			FeatureGroup::OneHotEncoded(feature_group) => feature_group.options.len(),
		}
	}

	pub fn source_column(&self) -> Column {
		match self {
			FeatureGroup::Identity(feature_group) => feature_group.source_column,
			FeatureGroup::OneHotEncoded(feature_group) => feature_group.source_column,
		}
	}
}

/**
An `EncodingScheme` is the ordered list of feature groups fit on the training records. The feature vector for an example is the concatenation of one-hot(place_id), one-hot(date), and the hour, so its length is the number of distinct place ids plus the number of distinct date buckets in the training set plus one.

An `EncodingScheme` is never modified after it is fit. Computing features with it is a pure function of the scheme and the example.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingScheme {
	pub feature_groups: Vec<FeatureGroup>,
}

impl EncodingScheme {
	pub fn fit<E>(examples: &[E]) -> Self
	where
		E: Example,
	{
		let feature_groups = vec![
			FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup::fit(Column::PlaceId, examples)),
			FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup::fit(
				Column::DateBucket,
				examples,
			)),
			FeatureGroup::Identity(IdentityFeatureGroup {
				source_column: Column::Hour,
			}),
		];
		Self { feature_groups }
	}

	pub fn n_features(&self) -> usize {
		self.feature_groups
			.iter()
			.map(|feature_group| feature_group.n_features())
			.sum()
	}

	/// Compute a features matrix with one row per example.
	pub fn compute_features_array_f32<E>(&self, examples: &[E]) -> Array2<f32>
	where
		E: Example,
	{
		let mut features = Array2::zeros((examples.len(), self.n_features()));
		self.write_features_array_f32(examples, features.view_mut());
		features
	}

	/// Compute the feature vector for a single example.
	pub fn compute_features_row<E>(&self, example: &E) -> Array1<f32>
	where
		E: Example,
	{
		let mut features = Array1::zeros(self.n_features());
		self.write_features_array_f32(
			std::slice::from_ref(example),
			features.view_mut().insert_axis(Axis(0)),
		);
		features
	}

	/// Write features for `examples` into `features`, which must have shape `(examples.len(), self.n_features())`.
	pub fn write_features_array_f32<E>(&self, examples: &[E], mut features: ArrayViewMut2<f32>)
	where
		E: Example,
	{
		let mut feature_index = 0;
		for feature_group in self.feature_groups.iter() {
			let n_features_in_group = feature_group.n_features();
			let slice = s![.., feature_index..feature_index + n_features_in_group];
			let features = features.slice_mut(slice);
			match feature_group {
				FeatureGroup::Identity(feature_group) => {
					feature_group.compute_array_f32(features, examples)
				}
				FeatureGroup::OneHotEncoded(feature_group) => {
					feature_group.compute_array_f32(features, examples)
				}
			}
			feature_index += n_features_in_group;
		}
	}

	/// Return the categorical values of `example` that were not seen when this scheme was fit. These values are encoded as all zeros.
	pub fn unseen_values<'a, E>(&self, example: &'a E) -> Vec<(Column, &'a str)>
	where
		E: Example,
	{
		self.feature_groups
			.iter()
			.filter_map(|feature_group| match feature_group {
				FeatureGroup::OneHotEncoded(feature_group) => {
					let value = example.value(feature_group.source_column).as_text()?;
					match feature_group.option_index(value) {
						Some(_) => None,
						None => Some((feature_group.source_column, value)),
					}
				}
				FeatureGroup::Identity(_) => None,
			})
			.collect()
	}
}

#[cfg(test)]
fn record(place_id: &str, date_bucket: &str, hour: i64) -> footfall_dataframe::Record {
	footfall_dataframe::Record {
		place_id: place_id.to_owned(),
		date_bucket: date_bucket.to_owned(),
		hour,
		visit_rate: 0.0,
	}
}

#[test]
fn test_fit_assigns_indices_in_first_seen_order() {
	let records = vec![
		record("b279", "Friday - March", 21),
		record("a113", "Monday - May", 9),
		record("b279", "Monday - May", 10),
	];
	let scheme = EncodingScheme::fit(&records);
	let options = scheme
		.feature_groups
		.iter()
		.map(|feature_group| match feature_group {
			FeatureGroup::OneHotEncoded(feature_group) => feature_group.options.clone(),
			FeatureGroup::Identity(_) => Vec::new(),
		})
		.collect::<Vec<_>>();
	insta::assert_debug_snapshot!(options, @r###"
	[
	    [
	        "b279",
	        "a113",
	    ],
	    [
	        "Friday - March",
	        "Monday - May",
	    ],
	    [],
	]
	"###);
	assert_eq!(scheme.n_features(), 5);
}

#[test]
fn test_transform_training_records() {
	let records = vec![
		record("p1", "Mon", 10),
		record("p2", "Tue", 12),
		record("p3", "Mon", 8),
	];
	let scheme = EncodingScheme::fit(&records);
	let features = scheme.compute_features_array_f32(&records);
	assert_eq!(features.shape(), &[3, 3 + 2 + 1]);
	for row in features.axis_iter(Axis(0)) {
		assert_eq!(row.slice(s![0..3]).sum(), 1.0);
		assert_eq!(row.slice(s![3..5]).sum(), 1.0);
	}
	assert_eq!(
		features.row(1).to_vec(),
		vec![0.0, 1.0, 0.0, 0.0, 1.0, 12.0]
	);
	assert_eq!(features.row(2).to_vec(), scheme.compute_features_row(&records[2]).to_vec());
}

#[test]
fn test_unseen_values_encode_to_zero() {
	let train = vec![record("p1", "Mon", 10), record("p2", "Tue", 12)];
	let scheme = EncodingScheme::fit(&train);
	let unseen = record("p9", "Tue", 7);
	let features = scheme.compute_features_row(&unseen);
	assert_eq!(features.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 7.0]);
	assert_eq!(scheme.unseen_values(&unseen), vec![(Column::PlaceId, "p9")]);
	assert!(scheme.unseen_values(&train[0]).is_empty());
	// Computing features never changes the scheme.
	assert_eq!(scheme, EncodingScheme::fit(&train));
}

#[test]
fn test_new_matches_fit() {
	let records = vec![record("p1", "Mon", 10), record("p2", "Mon", 12)];
	let fitted = OneHotEncodedFeatureGroup::fit(Column::PlaceId, &records);
	let rebuilt = OneHotEncodedFeatureGroup::new(Column::PlaceId, fitted.options.clone());
	assert_eq!(fitted, rebuilt);
	assert_eq!(rebuilt.option_index("p2"), Some(1));
	assert!(!rebuilt.has_duplicate_options());
	let duplicated =
		OneHotEncodedFeatureGroup::new(Column::PlaceId, vec!["p1".to_owned(), "p1".to_owned()]);
	assert!(duplicated.has_duplicate_options());
}
