/*!
This module composes the training pipeline. Each stage is a separate function from the crates this one depends on, and they run strictly in order: load the records, normalize the visit rates, split the records into train and test sets, fit the encoding scheme on the train set, compute features, train the regressor, and evaluate it on the test set. A failure in any stage stops the pipeline, and the error names the stage that failed.
*/

use crate::{
	config::{load_config, Config},
	model::{Model, TrainingSummary},
	plot::{compute_plot_data, PlotData},
	progress::Progress,
	test,
};
use anyhow::{format_err, Context, Result};
use footfall_dataframe::{
	normalize, records_from_path, records_from_url, split, NormalizedDataset, Record, Split,
};
use footfall_features::EncodingScheme;
use footfall_linear::Regressor;
use footfall_metrics::{MeanVariance, Metric};
use ndarray::prelude::*;
use std::path::Path;

/// This is where the training records come from.
#[derive(Debug, Clone, Copy)]
pub enum DataSource<'a> {
	Url(&'a str),
	Path(&'a Path),
}

#[derive(Debug)]
pub struct TrainOutput {
	pub model: Model,
	pub plot_data: PlotData,
}

/// Train a model on the records from `source`. If `source` is `None`, records are fetched from the configured source url.
pub fn train(
	source: Option<DataSource>,
	config_path: Option<&Path>,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<TrainOutput> {
	// The config is validated before any records are loaded.
	let config = load_config(config_path)?;

	update_progress(Progress::Loading);
	let source = source.unwrap_or_else(|| DataSource::Url(config.source_url()));
	let records = load_records(source).context("failed to ingest records")?;

	train_records(records, &config, update_progress)
}

fn load_records(source: DataSource) -> Result<Vec<Record>> {
	let records = match source {
		DataSource::Url(url) => records_from_url(url)?,
		DataSource::Path(path) => records_from_path(path)?,
	};
	Ok(records)
}

/// Run every stage of the pipeline after loading on `records`.
pub fn train_records(
	records: Vec<Record>,
	config: &Config,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<TrainOutput> {
	let test_fraction = config.test_fraction();
	let seed = config.seed();
	let train_options = config.train_options();

	// Rescale the visit rates into [0, 1].
	update_progress(Progress::Normalizing);
	let NormalizedDataset {
		records,
		stats: normalization,
	} = normalize(records).context("failed to normalize records")?;
	log::info!(
		"normalized {} records with visit rates from {} to {}",
		records.len(),
		normalization.min,
		normalization.max,
	);

	update_progress(Progress::Splitting);
	let Split { train, test } =
		split(records, test_fraction, seed).context("failed to split records")?;
	log::info!(
		"split records into {} for training and {} for testing",
		train.len(),
		test.len(),
	);
	if train.is_empty() {
		return Err(format_err!("the training set is empty"));
	}

	// Fit the encoding scheme on the training records only, then use it for both sets.
	update_progress(Progress::Encoding);
	let encoding_scheme = EncodingScheme::fit(&train);
	log::info!(
		"encoded {} features per record",
		encoding_scheme.n_features()
	);
	let features_train = encoding_scheme.compute_features_array_f32(&train);
	let labels_train = labels(&train);
	if let Some(label_stats) = MeanVariance::compute(labels_train.as_slice()) {
		log::info!(
			"training labels have mean {} and variance {}",
			label_stats.mean,
			label_stats.variance,
		);
	}
	let labels_train = Array1::from(labels_train);

	let output = Regressor::train(
		features_train.view(),
		labels_train.view(),
		&train_options,
		&mut |progress| update_progress(Progress::Training(progress)),
	);
	if output.converged {
		log::info!("training converged after {} epochs", output.n_epochs);
	}
	if let Some(mse) = output
		.model
		.compute_mse(features_train.view(), labels_train.view())
	{
		log::info!("training mean squared error is {}", mse);
	}

	update_progress(Progress::Testing);
	let features_test = encoding_scheme.compute_features_array_f32(&test);
	let labels_test = Array1::from(labels(&test));
	let test_metrics = test::evaluate(&output.model, features_test.view(), labels_test.view())
		.context("failed to evaluate the model")?;
	log::info!(
		"r2 is {:.2} and rmse is {:.2} on the test set",
		test_metrics.r2,
		test_metrics.rmse,
	);

	let model = Model {
		encoding_scheme,
		regressor: output.model,
		normalization: Some(normalization),
		training: Some(TrainingSummary {
			train_options,
			test_fraction,
			seed,
			n_epochs: output.n_epochs,
			converged: output.converged,
			test_metrics,
		}),
	};
	let plot_data = compute_plot_data(&model, &train, &test);
	Ok(TrainOutput { model, plot_data })
}

fn labels(records: &[Record]) -> Vec<f32> {
	records.iter().map(|record| record.visit_rate).collect()
}

#[cfg(test)]
fn records_json() -> String {
	let places = ["b279", "a113", "c042", "d777"];
	let dates = ["Friday - March", "Monday - May", "Sunday - June"];
	let mut records = Vec::new();
	for (place_index, place_id) in places.iter().enumerate() {
		for (date_index, date) in dates.iter().enumerate() {
			for hour in 8..20 {
				let visits_num =
					10.0 * place_index as f64 + 4.0 * date_index as f64 + 0.5 * hour as f64;
				records.push(serde_json::json!({
					"place_id": place_id,
					"date": date,
					"time": hour,
					"visits_num": visits_num,
				}));
			}
		}
	}
	serde_json::Value::Array(records).to_string()
}

#[test]
fn test_train_save_load_predict() {
	use crate::predict::{predict, PredictInput, PredictOptions};
	let pid = std::process::id();
	let data_path = std::env::temp_dir().join(format!("footfall_records_{}.json", pid));
	let config_path = std::env::temp_dir().join(format!("footfall_config_{}.yaml", pid));
	let model_path = std::env::temp_dir().join(format!("footfall_model_pipeline_{}.footfall", pid));
	std::fs::write(&data_path, records_json()).unwrap();
	std::fs::write(
		&config_path,
		"test_fraction: 0.2\nseed: 7985\nlinear:\n  l2_regularization: 0.01\n  convergence_tolerance: 0.01\n  max_epochs: 5000\n",
	)
	.unwrap();
	let mut stages = Vec::new();
	let output = train(
		Some(DataSource::Path(&data_path)),
		Some(config_path.as_path()),
		&mut |progress| stages.push(format!("{:?}", progress).split('(').next().unwrap().to_owned()),
	);
	std::fs::remove_file(&data_path).unwrap();
	std::fs::remove_file(&config_path).unwrap();
	let TrainOutput { model, plot_data } = output.unwrap();
	stages.dedup();
	assert_eq!(
		stages,
		vec!["Loading", "Normalizing", "Splitting", "Encoding", "Training", "Testing"]
	);

	let training = model.training.as_ref().unwrap();
	assert_eq!(training.seed, 7985);
	assert!(training.test_metrics.r2 > 0.8);
	assert_eq!(model.encoding_scheme.n_features(), 4 + 3 + 1);
	assert_eq!(
		plot_data.desired_per_hour.x.len(),
		plot_data.predicted_per_hour.y.len()
	);
	assert_eq!(
		plot_data.visits_per_hour.x.len() + plot_data.desired_per_hour.x.len(),
		4 * 3 * 12
	);

	model.to_path(&model_path).unwrap();
	let loaded = Model::from_path(&model_path);
	std::fs::remove_file(&model_path).unwrap();
	let loaded = loaded.unwrap();
	let options = PredictOptions::default();
	let input = PredictInput {
		place_id: "c042".to_owned(),
		date_bucket: "Sunday - June".to_owned(),
		hour: 19,
	};
	let prediction = predict(&model, &input, &options);
	assert_eq!(prediction, predict(&loaded, &input, &options));
	// The largest raw visit count in the data belongs to d777, so c042 must be below the maximum.
	assert!(prediction < 1.0);
}

#[test]
fn test_constant_visit_rates_fail_to_normalize() {
	let records = (0..10)
		.map(|hour| Record {
			place_id: "p1".to_owned(),
			date_bucket: "Mon".to_owned(),
			hour,
			visit_rate: 3.0,
		})
		.collect();
	let error = train_records(records, &Config::default(), &mut |_| {}).unwrap_err();
	assert_eq!(error.to_string(), "failed to normalize records");
	assert!(error
		.downcast_ref::<footfall_dataframe::NormalizeError>()
		.is_some());
}
