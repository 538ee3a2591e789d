use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/**
A `ProgressCounter` tracks how far along a long running task is. Clones share the same underlying counter, so the training loop can increment it while the caller reads it to report progress.

```
use footfall_util::progress_counter::ProgressCounter;

let epochs = ProgressCounter::new(10);
let observer = epochs.clone();
epochs.inc(3);
assert_eq!(observer.get(), 3);
assert_eq!(observer.total(), 10);
```
*/
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	/// Create a new `ProgressCounter` that counts from 0 up to `total`.
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}
	pub fn total(&self) -> u64 {
		self.total
	}
	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}
	pub fn set(&self, value: u64) {
		self.current.store(value, Ordering::Relaxed);
	}
	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}
	/// Returns the fraction of the total that has been reached, in [0, 1].
	pub fn fraction(&self) -> f32 {
		if self.total == 0 {
			return 1.0;
		}
		(self.get().min(self.total) as f64 / self.total as f64) as f32
	}
}

#[test]
fn test_fraction() {
	let counter = ProgressCounter::new(4);
	assert_eq!(counter.fraction(), 0.0);
	counter.inc(1);
	assert_eq!(counter.fraction(), 0.25);
	counter.set(10);
	assert_eq!(counter.fraction(), 1.0);
	assert_eq!(ProgressCounter::new(0).fraction(), 1.0);
}
