/*!
This crate implements the linear regression model footfall trains. The [`Regressor`](struct.Regressor.html) is fit with stochastic dual coordinate ascent (SDCA), which solves L2 regularized least squares by repeatedly passing over the training examples in a fixed order and exactly maximizing the dual objective for one example at a time.

After each epoch the primal and dual objectives are evaluated. Their difference, the duality gap, bounds how far the current weights are from optimal, and training stops once the gap is at most `convergence_tolerance` times the primal objective. The objectives are evaluated across threads with rayon, but the partial sums are always reduced in the same order, so training produces bit for bit identical weights regardless of the number of threads.
*/

#![allow(clippy::tabs_in_doc_comments)]

use footfall_util::progress_counter::ProgressCounter;

mod regressor;

pub use regressor::{Regressor, TrainOutput};

/// These are the options passed to `Regressor::train`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
	/// This is the L2 regularization value applied to the weights.
	pub l2_regularization: f32,
	/// Training stops once the duality gap is at most this fraction of the primal objective. A looser tolerance stops after fewer epochs with a looser fit.
	pub convergence_tolerance: f32,
	/// This is the maximum number of passes over the training examples.
	pub max_epochs: usize,
	/// This scales the step taken for the bias on each update. With a value of 0.0 the bias stays at 0.0.
	pub bias_learning_rate: f32,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			l2_regularization: 1e-4,
			convergence_tolerance: 0.5,
			max_epochs: 100_000,
			bias_learning_rate: 0.7,
		}
	}
}

/// This is the training progress, which tracks the current epoch.
#[derive(Clone, Debug)]
pub struct TrainProgress(pub ProgressCounter);
