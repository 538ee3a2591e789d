//! This module contains the main entrypoint to the footfall cli.

use self::progress_view::ProgressView;
use anyhow::{format_err, Context, Result};
use clap::{Args, Parser};
use colored::Colorize;
use footfall_core::{
	load_config, predict, DataSource, Model, PredictInput, TrainOutput, UnseenCategoryPolicy,
};
use std::path::{Path, PathBuf};

mod progress_view;

#[derive(Parser)]
#[command(
	about = "Train a model that predicts how busy a place is, and make predictions with it.",
	disable_help_subcommand = true
)]
enum Options {
	#[command(name = "train")]
	Train(Box<TrainOptions>),
	#[command(name = "predict")]
	Predict(Box<PredictOptions>),
}

#[derive(Args, Debug)]
#[command(about = "train a model")]
#[command(long_about = "train a model from visit records fetched from a url or read from a json file")]
struct TrainOptions {
	/// the url to fetch the json records from, which defaults to the source url in the config
	#[arg(short, long, conflicts_with = "file")]
	url: Option<String>,
	/// the path to a json file of records
	#[arg(short, long)]
	file: Option<PathBuf>,
	/// the path to a config file
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// the path to write the .footfall file to
	#[arg(short, long)]
	output: Option<PathBuf>,
	/// the path to write the plot data to as json
	#[arg(long)]
	plot: Option<PathBuf>,
	/// disable the cli progress view
	#[arg(long = "no-progress", action = clap::ArgAction::SetFalse)]
	progress: bool,
}

#[derive(Args, Debug)]
#[command(about = "make a prediction")]
#[command(long_about = "predict the normalized visit rate for a place, date bucket, and hour")]
struct PredictOptions {
	/// the path to a .footfall file
	#[arg(short, long)]
	model: PathBuf,
	#[arg(long)]
	place_id: String,
	/// the date bucket, for example "Friday - March"
	#[arg(long)]
	date: String,
	#[arg(long, allow_negative_numbers = true)]
	hour: i64,
	/// the path to a config file, whose unseen_category_policy is used
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// also print the prediction mapped back to a raw visit rate
	#[arg(long)]
	denormalize: bool,
	/// log a warning for a place id or date bucket that was not seen in training
	#[arg(long)]
	warn_unseen: bool,
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
		.format_level(false)
		.format_module_path(false)
		.format_timestamp(None)
		.init();
	let options = Options::parse();
	let result = match options {
		Options::Train(options) => cli_train(*options),
		Options::Predict(options) => cli_predict(*options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_train(options: TrainOptions) -> Result<()> {
	let source = match (options.url.as_deref(), options.file.as_deref()) {
		(Some(url), _) => Some(DataSource::Url(url)),
		(None, Some(path)) => Some(DataSource::Path(path)),
		(None, None) => None,
	};
	let output = {
		let mut progress_view = if options.progress {
			Some(ProgressView::new())
		} else {
			None
		};
		footfall_core::train(source, options.config.as_deref(), &mut |progress| {
			if let Some(progress_view) = progress_view.as_mut() {
				progress_view.update(progress)
			}
		})
	};
	let TrainOutput { model, plot_data } = output?;

	// Retrieve the output path from the command line arguments or generate a default.
	let output_path = match options.output {
		Some(output) => output,
		None => {
			let dir = std::env::current_dir()?;
			available_path(&dir, "visits", "footfall")?
		}
	};

	// Write the model to the output path.
	model
		.to_path(&output_path)
		.with_context(|| format!("failed to write the model to {}", output_path.display()))?;

	if let Some(plot_path) = options.plot {
		let file = std::fs::File::create(&plot_path)
			.with_context(|| format!("failed to create {}", plot_path.display()))?;
		serde_json::to_writer_pretty(std::io::BufWriter::new(file), &plot_data)?;
		eprintln!("The plot data was written to {}.", plot_path.display());
	}

	if let Some(training) = model.training.as_ref() {
		let metrics = &training.test_metrics;
		eprintln!(
			"{} {:.4}  {} {:.4}  {} {:.4}  {} {:.4}",
			"r2".bold(),
			metrics.r2,
			"rmse".bold(),
			metrics.rmse,
			"mae".bold(),
			metrics.mae,
			"baseline rmse".bold(),
			metrics.baseline_rmse,
		);
	}
	eprintln!("Your model was written to {}.", output_path.display());
	Ok(())
}

fn cli_predict(options: PredictOptions) -> Result<()> {
	let model = Model::from_path(&options.model)
		.with_context(|| format!("failed to load the model from {}", options.model.display()))?;
	let mut predict_options = match options.config.as_deref() {
		Some(config_path) => load_config(Some(config_path))?.predict_options(),
		None => footfall_core::PredictOptions::default(),
	};
	if options.warn_unseen {
		predict_options.unseen_category_policy = UnseenCategoryPolicy::Warn;
	}
	let input = PredictInput {
		place_id: options.place_id,
		date_bucket: options.date,
		hour: options.hour,
	};
	let prediction = predict(&model, &input, &predict_options);
	println!("{}", prediction);
	if options.denormalize {
		let normalization = model
			.normalization
			.ok_or_else(|| format_err!("the model has no normalization stats"))?;
		println!("{}", normalization.denormalize(prediction));
	}
	Ok(())
}

/// This function checks if a file with the given name and extension already exists in `dir`, and if it does, it appends " 1", " 2", etc. to the name until it finds a path that will not overwrite an existing file.
fn available_path(dir: &Path, name: &str, extension: &str) -> Result<PathBuf> {
	let mut i = 0;
	loop {
		let filename = if i > 0 {
			format!("{} {}.{}", name, i, extension)
		} else {
			format!("{}.{}", name, extension)
		};
		let path = dir.join(filename);
		match std::fs::metadata(&path) {
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(path),
			Err(error) => return Err(error.into()),
			Ok(_) => i += 1,
		}
	}
}

#[test]
fn test_available_path() {
	let dir = std::env::temp_dir().join(format!("footfall_cli_{}", std::process::id()));
	std::fs::create_dir_all(&dir).unwrap();
	let first = available_path(&dir, "visits", "footfall").unwrap();
	assert_eq!(first, dir.join("visits.footfall"));
	std::fs::write(&first, b"").unwrap();
	let second = available_path(&dir, "visits", "footfall").unwrap();
	assert_eq!(second, dir.join("visits 1.footfall"));
	std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_parse_predict_options() {
	let options = Options::try_parse_from(&[
		"footfall",
		"predict",
		"--model",
		"visits.footfall",
		"--place-id",
		"b279",
		"--date",
		"Friday - March",
		"--hour",
		"14",
		"--warn-unseen",
	])
	.unwrap();
	match options {
		Options::Predict(options) => {
			assert_eq!(options.place_id, "b279");
			assert_eq!(options.date, "Friday - March");
			assert_eq!(options.hour, 14);
			assert!(options.warn_unseen);
			assert!(!options.denormalize);
		}
		Options::Train(_) => panic!("expected the predict command"),
	}
	assert!(Options::try_parse_from(&[
		"footfall",
		"train",
		"--url",
		"http://localhost",
		"--file",
		"records.json"
	])
	.is_err());
}
