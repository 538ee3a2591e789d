/*!
This module prepares the arrays a chart renderer needs to plot the data and the model's predictions. Nothing here draws anything.
*/

use crate::{
	model::Model,
	predict::{predict_many, PredictOptions},
};
use footfall_dataframe::Record;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Series<X> {
	pub name: String,
	pub x: Vec<X>,
	pub y: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlotData {
	/// The normalized visit rate of each training record against its hour.
	pub visits_per_hour: Series<i64>,
	/// The normalized visit rate of each training record against its date bucket.
	pub visits_per_date: Series<String>,
	/// The actual and predicted normalized visit rates of each test record against its hour.
	pub desired_per_hour: Series<i64>,
	pub predicted_per_hour: Series<i64>,
}

pub fn visits_per_hour(records: &[Record]) -> Series<i64> {
	Series {
		name: "Rate Of Visitors/Time".to_owned(),
		x: records.iter().map(|record| record.hour).collect(),
		y: records.iter().map(|record| record.visit_rate).collect(),
	}
}

pub fn visits_per_date(records: &[Record]) -> Series<String> {
	Series {
		name: "Rate Of Visitors/Date".to_owned(),
		x: records
			.iter()
			.map(|record| record.date_bucket.clone())
			.collect(),
		y: records.iter().map(|record| record.visit_rate).collect(),
	}
}

/// Returns the desired and the predicted visit rates of `records` against their hours.
pub fn desired_and_predicted_per_hour(
	model: &Model,
	records: &[Record],
) -> (Series<i64>, Series<i64>) {
	let hours: Vec<i64> = records.iter().map(|record| record.hour).collect();
	let desired = Series {
		name: "Desired".to_owned(),
		x: hours.clone(),
		y: records.iter().map(|record| record.visit_rate).collect(),
	};
	let options = PredictOptions::default();
	let predicted = Series {
		name: "Predicted".to_owned(),
		x: hours,
		y: predict_many(model, records, &options).collect(),
	};
	(desired, predicted)
}

pub fn compute_plot_data(model: &Model, train: &[Record], test: &[Record]) -> PlotData {
	let (desired_per_hour, predicted_per_hour) = desired_and_predicted_per_hour(model, test);
	PlotData {
		visits_per_hour: visits_per_hour(train),
		visits_per_date: visits_per_date(train),
		desired_per_hour,
		predicted_per_hour,
	}
}

#[test]
fn test_desired_and_predicted_per_hour() {
	let model = crate::model::test_model();
	let records = vec![
		Record {
			place_id: "b279".to_owned(),
			date_bucket: "Friday - March".to_owned(),
			hour: 10,
			visit_rate: 0.5,
		},
		Record {
			place_id: "a113".to_owned(),
			date_bucket: "Monday - May".to_owned(),
			hour: 0,
			visit_rate: 0.25,
		},
	];
	let (desired, predicted) = desired_and_predicted_per_hour(&model, &records);
	assert_eq!(desired.x, vec![10, 0]);
	assert_eq!(desired.y, vec![0.5, 0.25]);
	assert_eq!(predicted.x, desired.x);
	// bias + place weight + date weight + hour weight * hour
	assert!((predicted.y[0] - (0.125 + 0.5 + 0.1 + 0.01 * 10.0)).abs() < 1e-6);
	assert!((predicted.y[1] - (0.125 - 0.25 - 0.1)).abs() < 1e-6);
}
