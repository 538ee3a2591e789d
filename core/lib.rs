/*!
This crate ties together the pieces of footfall. It holds the configuration, the [`train`](train/fn.train.html) pipeline that turns raw visit records into a [`Model`](model/struct.Model.html), evaluation on the held out test set, single and batch prediction, and saving and loading models.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod config;
pub mod model;
pub mod plot;
pub mod predict;
pub mod progress;
pub mod test;
pub mod train;

pub use self::{
	config::{load_config, Config},
	model::Model,
	predict::{predict, predict_many, PredictInput, PredictOptions, UnseenCategoryPolicy},
	progress::Progress,
	train::{train, DataSource, TrainOutput},
};
