use super::{TrainOptions, TrainProgress};
use footfall_metrics::{MeanSquaredError, StreamingMetric};
use footfall_util::progress_counter::ProgressCounter;
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rayon::prelude::*;

/// The number of examples each task evaluates when computing the objectives in parallel.
const OBJECTIVE_CHUNK_SIZE: usize = 1024;

/// This struct describes a linear regressor model. You can train one by calling `Regressor::train`.
#[derive(Debug, Clone, PartialEq)]
pub struct Regressor {
	pub bias: f32,
	pub weights: Array1<f32>,
	/// These are the primal objective values after each epoch.
	pub losses: Vec<f32>,
}

#[derive(Debug)]
pub struct TrainOutput {
	pub model: Regressor,
	/// This is false if training reached `max_epochs` before the duality gap fell within `convergence_tolerance`. The model still holds the best weights found.
	pub converged: bool,
	pub n_epochs: usize,
}

struct Objective {
	primal: f64,
	dual: f64,
}

impl Objective {
	fn duality_gap(&self) -> f64 {
		self.primal - self.dual
	}
}

impl Regressor {
	/// Train a linear regressor.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> TrainOutput {
		let n_examples = features.nrows();
		let n_features = features.ncols();
		let mut model = Self {
			bias: 0.0,
			weights: Array1::<f32>::zeros(n_features),
			losses: vec![],
		};
		let epoch_counter = ProgressCounter::new(options.max_epochs.to_u64().unwrap());
		update_progress(TrainProgress(epoch_counter.clone()));
		if n_examples == 0 {
			log::warn!("there are no training examples, the model will always predict 0");
			return TrainOutput {
				model,
				converged: true,
				n_epochs: 0,
			};
		}
		// The weights are kept equal to `scale * sum(alpha_i * x_i)`, where alpha is the vector of dual variables.
		let scale = 1.0
			/ (options.l2_regularization.to_f64().unwrap() * n_examples.to_f64().unwrap());
		let scale = scale as f32;
		let mut alphas = Array1::<f32>::zeros(n_examples);
		// The bias behaves like an extra feature whose squared norm is the bias learning rate.
		let squared_norms: Vec<f32> = features
			.axis_iter(Axis(0))
			.map(|example| example.dot(&example) + options.bias_learning_rate)
			.collect();
		let mut best: Option<(f64, Array1<f32>, f32)> = None;
		let mut converged = false;
		let mut n_epochs = 0;
		for _ in 0..options.max_epochs {
			epoch_counter.inc(1);
			n_epochs += 1;
			model.train_epoch(features, labels, alphas.view_mut(), &squared_norms, scale, options);
			let objective = model.compute_objective(features, labels, alphas.view(), options);
			model.losses.push(objective.primal as f32);
			if objective.duality_gap()
				<= options.convergence_tolerance.to_f64().unwrap() * objective.primal
			{
				converged = true;
				break;
			}
			let improved = best
				.as_ref()
				.map(|(primal, _, _)| objective.primal < *primal)
				.unwrap_or(true);
			if improved {
				best = Some((objective.primal, model.weights.clone(), model.bias));
			}
		}
		if !converged {
			log::warn!(
				"training stopped after {} epochs without reaching the convergence tolerance {}",
				n_epochs,
				options.convergence_tolerance,
			);
			if let Some((_, weights, bias)) = best {
				model.weights = weights;
				model.bias = bias;
			}
		}
		TrainOutput {
			model,
			converged,
			n_epochs,
		}
	}

	/// Make one pass over the examples in order, updating each example's dual variable to maximize the dual objective.
	fn train_epoch(
		&mut self,
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		mut alphas: ArrayViewMut1<f32>,
		squared_norms: &[f32],
		scale: f32,
		options: &TrainOptions,
	) {
		for (example, label, alpha, squared_norm) in izip!(
			features.axis_iter(Axis(0)),
			labels.iter(),
			alphas.iter_mut(),
			squared_norms.iter(),
		) {
			let prediction = example.dot(&self.weights) + self.bias;
			let delta = (label - prediction - *alpha) / (1.0 + squared_norm * scale);
			*alpha += delta;
			self.weights.scaled_add(delta * scale, &example);
			self.bias += options.bias_learning_rate * delta * scale;
		}
	}

	fn compute_objective(
		&self,
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		alphas: ArrayView1<f32>,
		options: &TrainOptions,
	) -> Objective {
		let n_examples = features.nrows();
		let n_chunks = (n_examples + OBJECTIVE_CHUNK_SIZE - 1) / OBJECTIVE_CHUNK_SIZE;
		let partial_sums: Vec<(f64, f64)> = (0..n_chunks)
			.into_par_iter()
			.map(|chunk_index| {
				let start = chunk_index * OBJECTIVE_CHUNK_SIZE;
				let end = usize::min(start + OBJECTIVE_CHUNK_SIZE, n_examples);
				let mut loss = 0.0;
				let mut dual = 0.0;
				for index in start..end {
					let prediction = features.row(index).dot(&self.weights) + self.bias;
					let label = labels[index] as f64;
					let alpha = alphas[index] as f64;
					let residual = prediction as f64 - label;
					loss += 0.5 * residual * residual;
					dual += alpha * label - 0.5 * alpha * alpha;
				}
				(loss, dual)
			})
			.collect();
		// Reduce in chunk order so the result does not depend on how the work was scheduled.
		let (loss, dual) = partial_sums
			.iter()
			.fold((0.0, 0.0), |(loss, dual), (chunk_loss, chunk_dual)| {
				(loss + chunk_loss, dual + chunk_dual)
			});
		let squared_weights: f64 = self
			.weights
			.iter()
			.map(|weight| (*weight as f64).powi(2))
			.sum();
		let squared_bias = if options.bias_learning_rate > 0.0 {
			(self.bias as f64).powi(2) / options.bias_learning_rate as f64
		} else {
			0.0
		};
		let regularization =
			0.5 * options.l2_regularization as f64 * (squared_weights + squared_bias);
		let n_examples = n_examples.to_f64().unwrap();
		Objective {
			primal: loss / n_examples + regularization,
			dual: dual / n_examples - regularization,
		}
	}

	/// Write predictions into `predictions` for the input `features`.
	pub fn predict(&self, features: ArrayView2<f32>, mut predictions: ArrayViewMut1<f32>) {
		predictions.fill(self.bias);
		ndarray::linalg::general_mat_vec_mul(1.0, &features, &self.weights, 1.0, &mut predictions);
	}

	/// Compute the prediction for the feature vector of a single example.
	pub fn predict_one(&self, features: ArrayView1<f32>) -> f32 {
		features.dot(&self.weights) + self.bias
	}

	/// Compute the mean squared error of this model's predictions on `features`. Returns `None` if there are no examples.
	pub fn compute_mse(&self, features: ArrayView2<f32>, labels: ArrayView1<f32>) -> Option<f32> {
		let mut predictions = Array1::<f32>::zeros(features.nrows());
		self.predict(features, predictions.view_mut());
		let mut metric = MeanSquaredError::default();
		for (prediction, label) in predictions.iter().zip(labels.iter()) {
			metric.update((*prediction, *label));
		}
		metric.finalize()
	}
}

#[cfg(test)]
fn two_cluster_dataset() -> (Array2<f32>, Array1<f32>) {
	let mut features = Array2::zeros((20, 2));
	let mut labels = Array1::zeros(20);
	for index in 0..20 {
		if index % 2 == 0 {
			features[(index, 0)] = 1.0;
			labels[index] = 0.7;
		} else {
			features[(index, 1)] = 1.0;
			labels[index] = 0.2;
		}
	}
	(features, labels)
}

#[test]
fn test_fits_two_clusters() {
	let (features, labels) = two_cluster_dataset();
	let options = TrainOptions {
		l2_regularization: 1e-3,
		convergence_tolerance: 1e-4,
		max_epochs: 10_000,
		bias_learning_rate: 1.0,
	};
	let output = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
	let model = output.model;
	assert!((model.predict_one(features.row(0)) - 0.7).abs() < 0.02);
	assert!((model.predict_one(features.row(1)) - 0.2).abs() < 0.02);
	assert!(model.compute_mse(features.view(), labels.view()).unwrap() < 1e-3);
	assert_eq!(model.losses.len(), output.n_epochs);
}

#[test]
fn test_training_is_deterministic() {
	let (features, labels) = two_cluster_dataset();
	let options = TrainOptions {
		max_epochs: 50,
		..Default::default()
	};
	let a = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
	let b = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
	assert_eq!(a.model, b.model);
	assert_eq!(a.n_epochs, b.n_epochs);
}

#[test]
fn test_loose_tolerance_converges() {
	let (features, labels) = two_cluster_dataset();
	let options = TrainOptions {
		max_epochs: 1000,
		..Default::default()
	};
	let mut progress = None;
	let output = Regressor::train(features.view(), labels.view(), &options, &mut |p| {
		progress = Some(p)
	});
	assert!(output.converged);
	assert!(output.n_epochs < 1000);
	let TrainProgress(epoch_counter) = progress.unwrap();
	assert_eq!(epoch_counter.get(), output.n_epochs as u64);
	assert_eq!(epoch_counter.total(), 1000);
}

#[test]
fn test_iteration_cap_reports_no_convergence() {
	let (features, labels) = two_cluster_dataset();
	let options = TrainOptions {
		convergence_tolerance: 0.0,
		max_epochs: 1,
		..Default::default()
	};
	let output = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
	assert!(!output.converged);
	assert_eq!(output.n_epochs, 1);
	// The weights found in the single epoch are still returned.
	assert!(output.model.weights.iter().any(|weight| *weight != 0.0));
}

#[test]
fn test_predict() {
	let model = Regressor {
		bias: 0.5,
		weights: arr1(&[1.0, -2.0]),
		losses: vec![],
	};
	let features = arr2(&[[1.0, 0.0], [0.0, 1.0], [2.0, 1.0]]);
	let mut predictions = Array1::zeros(3);
	model.predict(features.view(), predictions.view_mut());
	assert_eq!(predictions, arr1(&[1.5, -1.5, 0.5]));
	assert_eq!(model.predict_one(features.row(2)), 0.5);
}

#[test]
fn test_weights_do_not_depend_on_thread_count() {
	// Enough examples that the objectives are summed over several chunks.
	let n_examples = 3 * OBJECTIVE_CHUNK_SIZE;
	let mut features = Array2::<f32>::zeros((n_examples, 3));
	let mut labels = Array1::<f32>::zeros(n_examples);
	for index in 0..n_examples {
		let x = [
			(index % 7) as f32 / 7.0,
			(index % 11) as f32 / 11.0,
			(index % 13) as f32 / 13.0,
		];
		features.row_mut(index).assign(&arr1(&x));
		labels[index] = 0.3 * x[0] - 0.2 * x[1] + 0.5 * x[2] + 0.1;
	}
	let options = TrainOptions {
		convergence_tolerance: 0.0,
		max_epochs: 30,
		..Default::default()
	};
	let train_with_threads = |n_threads: usize| {
		rayon::ThreadPoolBuilder::new()
			.num_threads(n_threads)
			.build()
			.unwrap()
			.install(|| Regressor::train(features.view(), labels.view(), &options, &mut |_| {}))
	};
	let single = train_with_threads(1);
	let many = train_with_threads(8);
	assert_eq!(single.model, many.model);
	assert_eq!(single.n_epochs, many.n_epochs);
}
