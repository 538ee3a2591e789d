/*!
This module defines the fitted [`Model`](struct.Model.html) and how it is written to and read from disk.

A model file starts with a single byte holding the major version of the format, followed by the model encoded with MessagePack. The encoded model holds every one-hot vocabulary in index order, so a model loaded in a new process computes exactly the same features as the one that was trained.
*/

use footfall_dataframe::{Column, NormalizationStats};
use footfall_features::{
	EncodingScheme, FeatureGroup, IdentityFeatureGroup, OneHotEncodedFeatureGroup,
};
use footfall_linear::{Regressor, TrainOptions};
use footfall_metrics::RegressionMetricsOutput;
use ndarray::prelude::*;
use std::{
	io::{Read, Write},
	path::Path,
};
use thiserror::Error;

const MAJOR_VERSION: u8 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
	pub encoding_scheme: EncodingScheme,
	pub regressor: Regressor,
	/// These are the stats the training records were normalized with, which can be used to map predictions back to raw visit rates.
	pub normalization: Option<NormalizationStats>,
	pub training: Option<TrainingSummary>,
}

/// A record of how a model was trained and how well it did on the test set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
	pub train_options: TrainOptions,
	pub test_fraction: f32,
	pub seed: u64,
	pub n_epochs: usize,
	pub converged: bool,
	pub test_metrics: RegressionMetricsOutput,
}

#[derive(Debug, Error)]
pub enum LoadModelError {
	#[error("failed to read the model")]
	Io(#[from] std::io::Error),
	#[error("failed to decode the model")]
	Decode(#[from] rmp_serde::decode::Error),
	#[error("unknown major version {0}")]
	UnknownVersion(u8),
	#[error("the model is corrupt: {0}")]
	Corrupt(String),
}

#[derive(Debug, Error)]
pub enum SaveModelError {
	#[error("failed to write the model")]
	Io(#[from] std::io::Error),
	#[error("failed to encode the model")]
	Encode(#[from] rmp_serde::encode::Error),
}

impl Model {
	/// Deserialize a `Model` from a slice.
	pub fn from_slice(slice: &[u8]) -> Result<Self, LoadModelError> {
		let (major_version, slice) = slice
			.split_first()
			.ok_or_else(|| LoadModelError::Corrupt("the model is empty".to_owned()))?;
		if *major_version != MAJOR_VERSION {
			return Err(LoadModelError::UnknownVersion(*major_version));
		}
		let model: ModelData = rmp_serde::from_slice(slice)?;
		model.into_model()
	}

	/// Deserialize a `Model` by reading the file at `path`.
	pub fn from_path(path: &Path) -> Result<Self, LoadModelError> {
		let file = std::fs::File::open(path)?;
		let mut reader = std::io::BufReader::new(file);
		let mut major_version = [0u8; 1];
		reader.read_exact(&mut major_version).map_err(|error| {
			if error.kind() == std::io::ErrorKind::UnexpectedEof {
				LoadModelError::Corrupt("the model is empty".to_owned())
			} else {
				LoadModelError::Io(error)
			}
		})?;
		let major_version = major_version[0];
		if major_version != MAJOR_VERSION {
			return Err(LoadModelError::UnknownVersion(major_version));
		}
		let model: ModelData = rmp_serde::from_read(&mut reader)?;
		model.into_model()
	}

	/// Serialize this model to bytes, including the leading major version byte.
	pub fn to_bytes(&self) -> Result<Vec<u8>, SaveModelError> {
		let mut bytes = vec![MAJOR_VERSION];
		rmp_serde::encode::write_named(&mut bytes, &ModelData::from(self))?;
		Ok(bytes)
	}

	/// Write this model to the file at `path`.
	pub fn to_path(&self, path: &Path) -> Result<(), SaveModelError> {
		let file = std::fs::File::create(path)?;
		let mut writer = std::io::BufWriter::new(file);
		writer.write_all(&[MAJOR_VERSION])?;
		rmp_serde::encode::write_named(&mut writer, &ModelData::from(self))?;
		writer.flush()?;
		Ok(())
	}
}

/// This is the serialized form of a `Model`.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct ModelData {
	feature_groups: Vec<FeatureGroupData>,
	weights: Vec<f32>,
	bias: f32,
	normalization: Option<NormalizationStats>,
	training: Option<TrainingSummaryData>,
}

/// A one-hot encoded feature group has `options`, in index order. An identity feature group has none.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct FeatureGroupData {
	source_column: String,
	options: Option<Vec<String>>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct TrainingSummaryData {
	l2_regularization: f32,
	convergence_tolerance: f32,
	max_epochs: u64,
	bias_learning_rate: f32,
	test_fraction: f32,
	seed: u64,
	n_epochs: u64,
	converged: bool,
	test_metrics: RegressionMetricsOutput,
}

impl From<&Model> for ModelData {
	fn from(model: &Model) -> Self {
		let feature_groups = model
			.encoding_scheme
			.feature_groups
			.iter()
			.map(|feature_group| match feature_group {
				FeatureGroup::Identity(feature_group) => FeatureGroupData {
					source_column: feature_group.source_column.name().to_owned(),
					options: None,
				},
				FeatureGroup::OneHotEncoded(feature_group) => FeatureGroupData {
					source_column: feature_group.source_column.name().to_owned(),
					options: Some(feature_group.options.clone()),
				},
			})
			.collect();
		let training = model.training.as_ref().map(|training| TrainingSummaryData {
			l2_regularization: training.train_options.l2_regularization,
			convergence_tolerance: training.train_options.convergence_tolerance,
			max_epochs: training.train_options.max_epochs as u64,
			bias_learning_rate: training.train_options.bias_learning_rate,
			test_fraction: training.test_fraction,
			seed: training.seed,
			n_epochs: training.n_epochs as u64,
			converged: training.converged,
			test_metrics: training.test_metrics.clone(),
		});
		Self {
			feature_groups,
			weights: model.regressor.weights.to_vec(),
			bias: model.regressor.bias,
			normalization: model.normalization,
			training,
		}
	}
}

impl ModelData {
	fn into_model(self) -> Result<Model, LoadModelError> {
		let feature_groups = self
			.feature_groups
			.into_iter()
			.map(|feature_group| {
				let source_column: Column = feature_group
					.source_column
					.parse()
					.map_err(|error| LoadModelError::Corrupt(format!("{}", error)))?;
				let feature_group = match feature_group.options {
					Some(options) => {
						let feature_group = OneHotEncodedFeatureGroup::new(source_column, options);
						if feature_group.has_duplicate_options() {
							return Err(LoadModelError::Corrupt(format!(
								"the vocabulary for column \"{}\" has duplicate values",
								source_column
							)));
						}
						FeatureGroup::OneHotEncoded(feature_group)
					}
					None => FeatureGroup::Identity(IdentityFeatureGroup { source_column }),
				};
				Ok(feature_group)
			})
			.collect::<Result<Vec<_>, LoadModelError>>()?;
		check_layout(&feature_groups)?;
		let encoding_scheme = EncodingScheme { feature_groups };
		let n_features = encoding_scheme.n_features();
		if n_features != self.weights.len() {
			return Err(LoadModelError::Corrupt(format!(
				"the encoding scheme produces {} features but there are {} weights",
				n_features,
				self.weights.len()
			)));
		}
		let training = self.training.map(|training| TrainingSummary {
			train_options: TrainOptions {
				l2_regularization: training.l2_regularization,
				convergence_tolerance: training.convergence_tolerance,
				max_epochs: training.max_epochs as usize,
				bias_learning_rate: training.bias_learning_rate,
			},
			test_fraction: training.test_fraction,
			seed: training.seed,
			n_epochs: training.n_epochs as usize,
			converged: training.converged,
			test_metrics: training.test_metrics,
		});
		Ok(Model {
			encoding_scheme,
			regressor: Regressor {
				bias: self.bias,
				weights: Array1::from(self.weights),
				losses: vec![],
			},
			normalization: self.normalization,
			training,
		})
	}
}

/// Features are always laid out as one-hot(place_id), one-hot(date), identity(time). Any other layout would encode prediction inputs differently from the training records.
fn check_layout(feature_groups: &[FeatureGroup]) -> Result<(), LoadModelError> {
	let layout_is_valid = matches!(
		feature_groups,
		[
			FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup {
				source_column: Column::PlaceId,
				..
			}),
			FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup {
				source_column: Column::DateBucket,
				..
			}),
			FeatureGroup::Identity(IdentityFeatureGroup {
				source_column: Column::Hour,
			}),
		]
	);
	if layout_is_valid {
		Ok(())
	} else {
		let layout = feature_groups
			.iter()
			.map(|feature_group| match feature_group {
				FeatureGroup::Identity(feature_group) => {
					format!("identity({})", feature_group.source_column)
				}
				FeatureGroup::OneHotEncoded(feature_group) => {
					format!("one_hot({})", feature_group.source_column)
				}
			})
			.collect::<Vec<_>>()
			.join(", ");
		Err(LoadModelError::Corrupt(format!(
			"unexpected feature layout [{}]",
			layout
		)))
	}
}

#[cfg(test)]
pub(crate) fn test_model() -> Model {
	use footfall_dataframe::Record;
	let records = ["b279", "a113", "b279", "c042"]
		.iter()
		.zip(["Friday - March", "Monday - May", "Monday - May", "Friday - March"].iter())
		.enumerate()
		.map(|(index, (place_id, date_bucket))| Record {
			place_id: (*place_id).to_owned(),
			date_bucket: (*date_bucket).to_owned(),
			hour: 8 + index as i64,
			visit_rate: 0.0,
		})
		.collect::<Vec<_>>();
	let encoding_scheme = EncodingScheme::fit(&records);
	Model {
		encoding_scheme,
		regressor: Regressor {
			bias: 0.125,
			weights: arr1(&[0.5, -0.25, 0.75, 0.1, -0.1, 0.01]),
			losses: vec![],
		},
		normalization: Some(NormalizationStats { min: 0.0, max: 40.0 }),
		training: None,
	}
}

#[test]
fn test_round_trip() {
	use crate::predict::{predict, PredictInput, PredictOptions};
	let model = test_model();
	let bytes = model.to_bytes().unwrap();
	let loaded = Model::from_slice(&bytes).unwrap();
	assert_eq!(loaded, model);
	let options = PredictOptions::default();
	let inputs = [
		("b279", "Monday - May", 9),
		("c042", "Friday - March", 21),
		("zzzz", "Friday - March", 3),
		("a113", "Sunday - June", 0),
	];
	for (place_id, date_bucket, hour) in inputs.iter() {
		let input = PredictInput {
			place_id: (*place_id).to_owned(),
			date_bucket: (*date_bucket).to_owned(),
			hour: *hour,
		};
		let expected = predict(&model, &input, &options);
		let actual = predict(&loaded, &input, &options);
		assert!((expected - actual).abs() < 1e-6);
	}
}

#[test]
fn test_round_trip_file() {
	let model = test_model();
	let path = std::env::temp_dir().join(format!("footfall_model_round_trip_{}.footfall", std::process::id()));
	model.to_path(&path).unwrap();
	let loaded = Model::from_path(&path);
	std::fs::remove_file(&path).unwrap();
	assert_eq!(loaded.unwrap(), model);
}

#[test]
fn test_weight_count_mismatch_is_corrupt() {
	let mut model = test_model();
	model.regressor.weights = arr1(&[0.5, -0.25]);
	let bytes = model.to_bytes().unwrap();
	assert!(matches!(
		Model::from_slice(&bytes),
		Err(LoadModelError::Corrupt(_))
	));
}

#[test]
fn test_unknown_version() {
	let mut bytes = test_model().to_bytes().unwrap();
	bytes[0] = 7;
	assert!(matches!(
		Model::from_slice(&bytes),
		Err(LoadModelError::UnknownVersion(7))
	));
	assert!(matches!(
		Model::from_slice(&[]),
		Err(LoadModelError::Corrupt(_))
	));
}

#[test]
fn test_permuted_layout_is_corrupt() {
	// Swapping the two one-hot groups keeps the feature count but changes what each weight means.
	let mut model = test_model();
	model.encoding_scheme.feature_groups.swap(0, 1);
	let bytes = model.to_bytes().unwrap();
	assert!(matches!(
		Model::from_slice(&bytes),
		Err(LoadModelError::Corrupt(message)) if message.contains("layout")
	));
	// An identity group on a text column would encode every place as 0.0.
	let mut model = test_model();
	model.encoding_scheme.feature_groups[0] = FeatureGroup::Identity(IdentityFeatureGroup {
		source_column: Column::PlaceId,
	});
	model.regressor.weights = Array1::zeros(model.encoding_scheme.n_features());
	let bytes = model.to_bytes().unwrap();
	assert!(matches!(
		Model::from_slice(&bytes),
		Err(LoadModelError::Corrupt(_))
	));
}

#[test]
fn test_empty_file_is_corrupt() {
	let path = std::env::temp_dir().join(format!("footfall_model_empty_{}.footfall", std::process::id()));
	std::fs::write(&path, b"").unwrap();
	let loaded = Model::from_path(&path);
	std::fs::remove_file(&path).unwrap();
	assert!(matches!(loaded, Err(LoadModelError::Corrupt(_))));
}
