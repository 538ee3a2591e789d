use footfall_linear::Regressor;
use footfall_metrics::{RegressionMetrics, RegressionMetricsInput, RegressionMetricsOutput, StreamingMetric};
use ndarray::prelude::*;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EvaluateError {
	#[error("cannot compute metrics on an empty test set")]
	EmptyTestSet,
	#[error("there are {n_rows} rows of features but {n_labels} labels")]
	LengthMismatch { n_rows: usize, n_labels: usize },
}

/// Score the predictions of `regressor` on the test set.
pub fn evaluate(
	regressor: &Regressor,
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
) -> Result<RegressionMetricsOutput, EvaluateError> {
	if features.nrows() == 0 {
		return Err(EvaluateError::EmptyTestSet);
	}
	if labels.len() != features.nrows() {
		return Err(EvaluateError::LengthMismatch {
			n_rows: features.nrows(),
			n_labels: labels.len(),
		});
	}
	let mut predictions = Array1::<f32>::zeros(features.nrows());
	regressor.predict(features, predictions.view_mut());
	let mut metrics = RegressionMetrics::default();
	metrics.update(RegressionMetricsInput {
		predictions: predictions.view(),
		labels: labels.view(),
	});
	Ok(metrics.finalize())
}

#[test]
fn test_empty_test_set() {
	let regressor = Regressor {
		bias: 0.0,
		weights: arr1(&[1.0, 1.0]),
		losses: vec![],
	};
	let features = Array2::<f32>::zeros((0, 2));
	let labels = Array1::<f32>::zeros(0);
	assert_eq!(
		evaluate(&regressor, features.view(), labels.view()).unwrap_err(),
		EvaluateError::EmptyTestSet
	);
}

#[test]
fn test_evaluate() {
	// This model predicts the second feature exactly.
	let perfect = Regressor {
		bias: 0.0,
		weights: arr1(&[0.0, 1.0]),
		losses: vec![],
	};
	let features = arr2(&[[1.0, 0.25], [0.0, 0.5], [1.0, 1.0], [0.0, 0.0]]);
	let labels = arr1(&[0.25, 0.5, 1.0, 0.0]);
	let metrics = evaluate(&perfect, features.view(), labels.view()).unwrap();
	assert!((metrics.r2 - 1.0).abs() < 1e-6);
	assert_eq!(metrics.rmse, 0.0);
	// This model always predicts the mean label.
	let baseline = Regressor {
		bias: 0.4375,
		weights: arr1(&[0.0, 0.0]),
		losses: vec![],
	};
	let metrics = evaluate(&baseline, features.view(), labels.view()).unwrap();
	assert!(metrics.r2.abs() < 1e-6);
	assert!((metrics.rmse - metrics.baseline_rmse).abs() < 1e-6);
}

#[test]
fn test_label_count_must_match_rows() {
	let regressor = Regressor {
		bias: 0.0,
		weights: arr1(&[1.0]),
		losses: vec![],
	};
	let features = arr2(&[[0.5], [1.0], [0.0]]);
	let labels = arr1(&[0.5, 1.0]);
	assert_eq!(
		evaluate(&regressor, features.view(), labels.view()).unwrap_err(),
		EvaluateError::LengthMismatch {
			n_rows: 3,
			n_labels: 2
		}
	);
}
