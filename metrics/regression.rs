use super::{mean_variance::merge_mean_m2, StreamingMetric};
use ndarray::prelude::*;
use num_traits::ToPrimitive;

/// `RegressionMetrics` computes metrics used to evaluate regressors.
#[derive(Debug, Default)]
pub struct RegressionMetrics {
	mean_variance: Option<MeanVariance>,
	absolute_error: f64,
	squared_error: f64,
}

#[derive(Debug)]
struct MeanVariance {
	n: u64,
	m2: f64,
	mean: f64,
}

/// The input to [`RegressionMetrics`](struct.RegressionMetrics.html).
pub struct RegressionMetricsInput<'a> {
	pub predictions: ArrayView1<'a, f32>,
	pub labels: ArrayView1<'a, f32>,
}

/// The output from [`RegressionMetrics`](struct.RegressionMetrics.html).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegressionMetricsOutput {
	/// The mean squared error is equal to the mean of the squared differences between the prediction and the label.
	pub mse: f32,
	/// The root mean squared error is equal to the square root of the mean squared error.
	pub rmse: f32,
	/// The mean of the absolute value of the difference between the prediction and the label.
	pub mae: f32,
	/// The coefficient of determination, `1 - SS_res / SS_tot`. 1.0 is a perfect fit and 0.0 is no better than always predicting the mean label.
	pub r2: f32,
	/// The mean squared error of a model that always predicts the mean label, which is the variance of the labels.
	pub baseline_mse: f32,
	pub baseline_rmse: f32,
}

impl<'a> StreamingMetric<'a> for RegressionMetrics {
	type Input = RegressionMetricsInput<'a>;
	type Output = RegressionMetricsOutput;

	fn update(&mut self, input: Self::Input) {
		let RegressionMetricsInput {
			predictions,
			labels,
		} = input;
		for (prediction, label) in predictions.iter().zip(labels.iter()) {
			let label = *label as f64;
			match &mut self.mean_variance {
				Some(mean_variance) => {
					let (mean, m2) = merge_mean_m2(
						mean_variance.n,
						mean_variance.mean,
						mean_variance.m2,
						1,
						label,
						0.0,
					);
					mean_variance.n += 1;
					mean_variance.mean = mean;
					mean_variance.m2 = m2;
				}
				None => {
					self.mean_variance = Some(MeanVariance {
						n: 1,
						mean: label,
						m2: 0.0,
					})
				}
			}
			let error = *prediction as f64 - label;
			self.absolute_error += error.abs();
			self.squared_error += error * error;
		}
	}

	fn merge(&mut self, other: Self) {
		match &mut self.mean_variance {
			Some(mean_variance) => {
				if let Some(other) = other.mean_variance {
					let (mean, m2) = merge_mean_m2(
						mean_variance.n,
						mean_variance.mean,
						mean_variance.m2,
						other.n,
						other.mean,
						other.m2,
					);
					mean_variance.mean = mean;
					mean_variance.m2 = m2;
					mean_variance.n += other.n;
				}
			}
			None => {
				self.mean_variance = other.mean_variance;
			}
		}
		self.absolute_error += other.absolute_error;
		self.squared_error += other.squared_error;
	}

	fn finalize(self) -> Self::Output {
		let (n, m2) = match self.mean_variance {
			Some(m) => (m.n.to_f64().unwrap(), m.m2),
			None => (0.0, f64::NAN),
		};
		let variance = m2 / n;
		let mae = self.absolute_error / n;
		let mse = self.squared_error / n;
		let rmse = mse.sqrt();
		let r2 = 1.0 - self.squared_error / m2;
		let baseline_mse = variance;
		let baseline_rmse = baseline_mse.sqrt();
		RegressionMetricsOutput {
			mae: mae as f32,
			mse: mse as f32,
			r2: r2 as f32,
			rmse: rmse as f32,
			baseline_mse: baseline_mse as f32,
			baseline_rmse: baseline_rmse as f32,
		}
	}
}

#[cfg(test)]
fn compute(predictions: &[f32], labels: &[f32]) -> RegressionMetricsOutput {
	let mut metrics = RegressionMetrics::default();
	metrics.update(RegressionMetricsInput {
		predictions: ArrayView1::from(predictions),
		labels: ArrayView1::from(labels),
	});
	metrics.finalize()
}

#[test]
fn test_perfect_predictions() {
	let labels = [0.1, 0.4, 0.35, 0.9, 1.0, 0.0];
	let metrics = compute(&labels, &labels);
	assert_eq!(metrics.r2, 1.0);
	assert_eq!(metrics.rmse, 0.0);
	assert_eq!(metrics.mae, 0.0);
}

#[test]
fn test_mean_predictions() {
	let labels = [0.1, 0.4, 0.7, 1.0];
	let mean = labels.iter().sum::<f32>() / labels.len() as f32;
	let predictions = [mean; 4];
	let metrics = compute(&predictions, &labels);
	assert!(metrics.r2.abs() < 1e-5);
	assert!((metrics.mse - metrics.baseline_mse).abs() < 1e-6);
}

#[test]
fn test_regression_metrics() {
	let metrics = compute(&[1.0, 2.0, 5.0, 4.0], &[1.0, 3.0, 3.0, 5.0]);
	insta::assert_debug_snapshot!(metrics, @r###"
	RegressionMetricsOutput {
	    mse: 1.5,
	    rmse: 1.2247449,
	    mae: 1.0,
	    r2: 0.25,
	    baseline_mse: 2.0,
	    baseline_rmse: 1.4142135,
	}
	"###);
}

#[test]
fn test_merge() {
	let mut a = RegressionMetrics::default();
	a.update(RegressionMetricsInput {
		predictions: ArrayView1::from(&[1.0, 2.0][..]),
		labels: ArrayView1::from(&[1.0, 3.0][..]),
	});
	let mut b = RegressionMetrics::default();
	b.update(RegressionMetricsInput {
		predictions: ArrayView1::from(&[5.0, 4.0][..]),
		labels: ArrayView1::from(&[3.0, 5.0][..]),
	});
	a.merge(b);
	let merged = a.finalize();
	let whole = compute(&[1.0, 2.0, 5.0, 4.0], &[1.0, 3.0, 3.0, 5.0]);
	assert_eq!(merged.mse, whole.mse);
	assert_eq!(merged.r2, whole.r2);
}
