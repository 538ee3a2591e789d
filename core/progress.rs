use footfall_linear::TrainProgress;

/// These are the stages of the training pipeline, reported in order through the `update_progress` callback passed to [`train`](../train/fn.train.html).
#[derive(Debug, Clone)]
pub enum Progress {
	Loading,
	Normalizing,
	Splitting,
	Encoding,
	Training(TrainProgress),
	Testing,
}
