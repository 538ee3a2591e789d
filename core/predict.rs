use crate::model::Model;
use footfall_dataframe::{Column, Example, Value};

/// The input for a single prediction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PredictInput {
	pub place_id: String,
	pub date_bucket: String,
	pub hour: i64,
}

impl Example for PredictInput {
	fn value(&self, column: Column) -> Value<'_> {
		match column {
			Column::PlaceId => Value::Text(&self.place_id),
			Column::DateBucket => Value::Text(&self.date_bucket),
			Column::Hour => Value::Number(self.hour as f32),
		}
	}
}

/// This determines what happens when a prediction input has a place id or date bucket that was not in the training set. In both cases the value is encoded as all zeros.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub enum UnseenCategoryPolicy {
	#[serde(rename = "zero")]
	Zero,
	/// Log a warning naming the unseen values.
	#[serde(rename = "warn")]
	Warn,
}

impl Default for UnseenCategoryPolicy {
	fn default() -> Self {
		UnseenCategoryPolicy::Zero
	}
}

#[derive(Debug, Clone, Default)]
pub struct PredictOptions {
	pub unseen_category_policy: UnseenCategoryPolicy,
}

/// Predict the normalized visit rate for `example`. The result is `dot(weights, features) + bias` and is not clamped to [0, 1].
pub fn predict<E>(model: &Model, example: &E, options: &PredictOptions) -> f32
where
	E: Example,
{
	if options.unseen_category_policy == UnseenCategoryPolicy::Warn {
		for (column, value) in model.encoding_scheme.unseen_values(example) {
			log::warn!(
				"the value \"{}\" for column \"{}\" was not seen in training and is encoded as zeros",
				value,
				column,
			);
		}
	}
	let features = model.encoding_scheme.compute_features_row(example);
	model.regressor.predict_one(features.view())
}

/// Lazily predict the normalized visit rate for each of `examples`.
pub fn predict_many<'a, I>(
	model: &'a Model,
	examples: I,
	options: &'a PredictOptions,
) -> impl Iterator<Item = f32> + 'a
where
	I: IntoIterator,
	I::IntoIter: 'a,
	I::Item: Example,
{
	examples
		.into_iter()
		.map(move |example| predict(model, &example, options))
}
