use num_traits::Float;
use thiserror::Error;

/// A floating point value that is known to be neither NaN nor infinite.
#[derive(Clone, Copy, Debug)]
pub struct Finite<T>(T)
where
	T: Float;

#[derive(Debug, Error)]
#[error("not finite")]
pub struct NotFiniteError;

impl<T> Finite<T>
where
	T: Float,
{
	pub fn new(value: T) -> Result<Self, NotFiniteError> {
		if value.is_finite() {
			Ok(Self(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

impl<T> std::ops::Deref for Finite<T>
where
	T: Float,
{
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Use this trait to convert a floating point number to its `Finite` counterpart.
pub trait ToFinite<T>
where
	T: Float,
{
	fn to_finite(self) -> Result<Finite<T>, NotFiniteError>;
}

impl<T> ToFinite<T> for T
where
	T: Float,
{
	fn to_finite(self) -> Result<Finite<T>, NotFiniteError> {
		Finite::new(self)
	}
}

#[test]
fn test_finite() {
	assert!(f32::NAN.to_finite().is_err());
	assert!(f32::INFINITY.to_finite().is_err());
	assert!(f64::NEG_INFINITY.to_finite().is_err());
	let value = 1.5f32.to_finite().unwrap();
	assert_eq!(*value, 1.5);
	assert_eq!(value.get(), 1.5);
}
