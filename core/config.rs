/*!
This module defines the `Config` struct, which is used to configure training a model with [`train`](../train/fn.train.html).
*/

use anyhow::{format_err, Context, Result};
use footfall_dataframe::validate_test_fraction;
use std::path::Path;

pub const DEFAULT_SOURCE_URL: &str = "http://api.dalilak.pro/Query/LR_DataSet_";
pub const DEFAULT_TEST_FRACTION: f32 = 0.2;
pub const DEFAULT_SEED: u64 = 7985;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	pub source_url: Option<String>,
	pub test_fraction: Option<f32>,
	pub seed: Option<u64>,
	pub linear: Option<LinearConfig>,
	pub unseen_category_policy: Option<crate::predict::UnseenCategoryPolicy>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearConfig {
	pub l2_regularization: Option<f32>,
	pub convergence_tolerance: Option<f32>,
	pub max_epochs: Option<u64>,
	pub bias_learning_rate: Option<f32>,
}

impl Config {
	pub fn source_url(&self) -> &str {
		self.source_url.as_deref().unwrap_or(DEFAULT_SOURCE_URL)
	}

	pub fn test_fraction(&self) -> f32 {
		self.test_fraction.unwrap_or(DEFAULT_TEST_FRACTION)
	}

	pub fn seed(&self) -> u64 {
		self.seed.unwrap_or(DEFAULT_SEED)
	}

	pub fn train_options(&self) -> footfall_linear::TrainOptions {
		let defaults = footfall_linear::TrainOptions::default();
		let linear = match &self.linear {
			Some(linear) => linear,
			None => return defaults,
		};
		footfall_linear::TrainOptions {
			l2_regularization: linear
				.l2_regularization
				.unwrap_or(defaults.l2_regularization),
			convergence_tolerance: linear
				.convergence_tolerance
				.unwrap_or(defaults.convergence_tolerance),
			max_epochs: linear
				.max_epochs
				.map(|max_epochs| max_epochs as usize)
				.unwrap_or(defaults.max_epochs),
			bias_learning_rate: linear
				.bias_learning_rate
				.unwrap_or(defaults.bias_learning_rate),
		}
	}

	pub fn predict_options(&self) -> crate::predict::PredictOptions {
		crate::predict::PredictOptions {
			unseen_category_policy: self.unseen_category_policy.unwrap_or_default(),
		}
	}

	/// Check that every configured value is usable. This runs before any data is loaded.
	pub fn validate(&self) -> Result<()> {
		validate_test_fraction(self.test_fraction())?;
		let options = self.train_options();
		if !(options.l2_regularization > 0.0) {
			return Err(format_err!(
				"l2_regularization must be positive, got {}",
				options.l2_regularization
			));
		}
		if !(options.convergence_tolerance >= 0.0) {
			return Err(format_err!(
				"convergence_tolerance must not be negative, got {}",
				options.convergence_tolerance
			));
		}
		if options.max_epochs == 0 {
			return Err(format_err!("max_epochs must be at least 1"));
		}
		if !(options.bias_learning_rate >= 0.0) {
			return Err(format_err!(
				"bias_learning_rate must not be negative, got {}",
				options.bias_learning_rate
			));
		}
		Ok(())
	}
}

/// Load the config from the config file, if provided, and validate it.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
	let config = if let Some(config_path) = config_path {
		let config = std::fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", config_path.display()))?
	} else {
		Config::default()
	};
	config.validate().context("invalid config")?;
	Ok(config)
}

#[test]
fn test_parse_config() {
	let config: Config = serde_yaml::from_str(
		r#"
test_fraction: 0.25
seed: 1
linear:
  max_epochs: 500
unseen_category_policy: warn
"#,
	)
	.unwrap();
	config.validate().unwrap();
	assert_eq!(config.test_fraction(), 0.25);
	assert_eq!(config.seed(), 1);
	assert_eq!(config.source_url(), DEFAULT_SOURCE_URL);
	let options = config.train_options();
	assert_eq!(options.max_epochs, 500);
	assert_eq!(options.convergence_tolerance, 0.5);
	assert_eq!(options.bias_learning_rate, 0.7);
	assert_eq!(
		config.predict_options().unseen_category_policy,
		crate::predict::UnseenCategoryPolicy::Warn
	);
}

#[test]
fn test_invalid_test_fraction_is_rejected() {
	for test_fraction in &[1.5, 0.0, 1.0] {
		let config = Config {
			test_fraction: Some(*test_fraction),
			..Default::default()
		};
		let error = config.validate().unwrap_err();
		assert!(error
			.downcast_ref::<footfall_dataframe::SplitError>()
			.is_some());
	}
	assert!(Config::default().validate().is_ok());
}
