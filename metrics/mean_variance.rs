//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Parallel_algorithm

use super::Metric;
use num_traits::ToPrimitive;

/// The mean and population variance of a slice of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanVariance {
	pub n: u64,
	pub mean: f32,
	pub variance: f32,
}

impl<'a> Metric<'a> for MeanVariance {
	type Input = &'a [f32];
	type Output = Option<MeanVariance>;

	fn compute(input: &'a [f32]) -> Self::Output {
		if input.is_empty() {
			return None;
		}
		let (n, mean, m2) = input
			.iter()
			.fold((0u64, 0.0f64, 0.0f64), |(n, mean, m2), value| {
				let (mean, m2) = merge_mean_m2(n, mean, m2, 1, *value as f64, 0.0);
				(n + 1, mean, m2)
			});
		Some(MeanVariance {
			n,
			mean: mean as f32,
			variance: m2_to_variance(m2, n),
		})
	}
}

/// Combine two separately computed means and sums of squared deviations into a single mean and sum of squared deviations.
pub fn merge_mean_m2(
	n_a: u64,
	mean_a: f64,
	m2_a: f64,
	n_b: u64,
	mean_b: f64,
	m2_b: f64,
) -> (f64, f64) {
	let n_a = n_a.to_f64().unwrap();
	let n_b = n_b.to_f64().unwrap();
	(
		(((n_a * mean_a) + (n_b * mean_b)) / (n_a + n_b)),
		m2_a + m2_b + (mean_b - mean_a) * (mean_b - mean_a) * (n_a * n_b / (n_a + n_b)),
	)
}

pub fn m2_to_variance(m2: f64, n: u64) -> f32 {
	(m2 / n.to_f64().unwrap()) as f32
}

#[test]
fn test_mean_variance() {
	let mean_variance = MeanVariance::compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
	assert_eq!(mean_variance.n, 4);
	assert_eq!(mean_variance.mean, 2.5);
	assert_eq!(mean_variance.variance, 1.25);
	assert_eq!(MeanVariance::compute(&[]), None);
}
