use super::StreamingMetric;
use num_traits::ToPrimitive;

/// The arithmetic mean of a stream of values. `finalize` returns `None` if no values were seen.
#[derive(Debug, Default)]
pub struct Mean {
	n: u64,
	mean: f64,
}

impl StreamingMetric<'_> for Mean {
	type Input = f32;
	type Output = Option<f32>;

	fn update(&mut self, value: f32) {
		self.n += 1;
		let n = self.n.to_f64().unwrap();
		self.mean += (value as f64 - self.mean) / n;
	}

	fn merge(&mut self, other: Self) {
		let n = self.n + other.n;
		if n == 0 {
			return;
		}
		let n_self = self.n.to_f64().unwrap();
		let n_other = other.n.to_f64().unwrap();
		self.mean = (n_self * self.mean + n_other * other.mean) / n.to_f64().unwrap();
		self.n = n;
	}

	fn finalize(self) -> Self::Output {
		match self.n {
			0 => None,
			_ => Some(self.mean as f32),
		}
	}
}

#[test]
fn test_mean() {
	let mut a = Mean::default();
	a.update(1.0);
	a.update(2.0);
	let mut b = Mean::default();
	b.update(6.0);
	a.merge(b);
	a.merge(Mean::default());
	assert_eq!(a.finalize(), Some(3.0));
	assert_eq!(Mean::default().finalize(), None);
}
