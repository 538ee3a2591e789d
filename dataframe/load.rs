use crate::Record;
use footfall_util::finite::ToFinite;
use std::{io::Read, path::Path};
use thiserror::Error;

/// Any failure while loading records fails the whole batch. No records are returned if one is malformed.
#[derive(Debug, Error)]
pub enum IngestionError {
	#[error("request to the data source failed")]
	Http(#[from] reqwest::Error),
	#[error("failed to read records")]
	Io(#[from] std::io::Error),
	#[error("failed to parse records")]
	Parse(#[from] serde_json::Error),
	#[error("record {index} has an invalid visits_num {value}, expected a finite non-negative number")]
	InvalidVisits { index: usize, value: f64 },
	#[error("record {index} has a visits_num {value} that is out of range, expected at most {max}", max = f32::MAX)]
	VisitsOutOfRange { index: usize, value: f64 },
	#[error("ingestion returned 0 records")]
	Empty,
}

/// This is the shape of one record as served by the data source.
#[derive(Debug, serde::Deserialize)]
struct RawRecord {
	place_id: String,
	date: String,
	time: i64,
	visits_num: f64,
}

/// Parse records from a JSON array of objects with the fields `place_id`, `date`, `time`, and `visits_num`.
pub fn records_from_json_str(json: &str) -> Result<Vec<Record>, IngestionError> {
	let raw_records: Vec<RawRecord> = serde_json::from_str(json)?;
	validate(raw_records)
}

pub fn records_from_reader<R>(reader: R) -> Result<Vec<Record>, IngestionError>
where
	R: Read,
{
	let raw_records: Vec<RawRecord> = serde_json::from_reader(reader)?;
	validate(raw_records)
}

pub fn records_from_path(path: &Path) -> Result<Vec<Record>, IngestionError> {
	let file = std::fs::File::open(path)?;
	let reader = std::io::BufReader::new(file);
	let records = records_from_reader(reader)?;
	log::info!("loaded {} records from {}", records.len(), path.display());
	Ok(records)
}

/// Fetch records from the data source at `url`. This blocks until the whole response has been received.
pub fn records_from_url(url: &str) -> Result<Vec<Record>, IngestionError> {
	let response = reqwest::blocking::get(url)?.error_for_status()?;
	let body = response.text()?;
	let records = records_from_json_str(&body)?;
	log::info!("fetched {} records from {}", records.len(), url);
	Ok(records)
}

fn validate(raw_records: Vec<RawRecord>) -> Result<Vec<Record>, IngestionError> {
	if raw_records.is_empty() {
		return Err(IngestionError::Empty);
	}
	raw_records
		.into_iter()
		.enumerate()
		.map(|(index, raw_record)| {
			let value = raw_record.visits_num;
			let invalid_visits = || IngestionError::InvalidVisits { index, value };
			let value = value.to_finite().map_err(|_| invalid_visits())?;
			if *value < 0.0 {
				return Err(invalid_visits());
			}
			if *value > f32::MAX as f64 {
				return Err(IngestionError::VisitsOutOfRange {
					index,
					value: value.get(),
				});
			}
			Ok(Record {
				place_id: raw_record.place_id,
				date_bucket: raw_record.date,
				hour: raw_record.time,
				visit_rate: value.get() as f32,
			})
		})
		.collect()
}

#[test]
fn test_records_from_json_str() {
	let json = r#"[
		{ "place_id": "p1", "date": "Friday - March", "time": 21, "visits_num": 12 },
		{ "place_id": "p2", "date": "Monday - May", "time": 9, "visits_num": 0.5, "extra": true }
	]"#;
	let records = records_from_json_str(json).unwrap();
	insta::assert_debug_snapshot!(records, @r###"
	[
	    Record {
	        place_id: "p1",
	        date_bucket: "Friday - March",
	        hour: 21,
	        visit_rate: 12.0,
	    },
	    Record {
	        place_id: "p2",
	        date_bucket: "Monday - May",
	        hour: 9,
	        visit_rate: 0.5,
	    },
	]
	"###);
}

#[test]
fn test_malformed_records_fail_the_batch() {
	let missing_field = r#"[
		{ "place_id": "p1", "date": "Friday - March", "time": 21, "visits_num": 12 },
		{ "place_id": "p2", "date": "Monday - May", "visits_num": 3 }
	]"#;
	assert!(matches!(
		records_from_json_str(missing_field),
		Err(IngestionError::Parse(_))
	));
	let fractional_hour = r#"[{ "place_id": "p1", "date": "Mon", "time": 1.5, "visits_num": 1 }]"#;
	assert!(matches!(
		records_from_json_str(fractional_hour),
		Err(IngestionError::Parse(_))
	));
	let negative_visits = r#"[{ "place_id": "p1", "date": "Mon", "time": 1, "visits_num": -1 }]"#;
	assert!(matches!(
		records_from_json_str(negative_visits),
		Err(IngestionError::InvalidVisits { index: 0, .. })
	));
	assert!(matches!(
		records_from_json_str("[]"),
		Err(IngestionError::Empty)
	));
}

#[test]
fn test_visits_beyond_f32_are_out_of_range() {
	let json = r#"[
		{ "place_id": "p1", "date": "Mon", "time": 1, "visits_num": 2 },
		{ "place_id": "p1", "date": "Mon", "time": 2, "visits_num": 1e39 }
	]"#;
	let error = records_from_json_str(json).unwrap_err();
	assert!(matches!(
		error,
		IngestionError::VisitsOutOfRange { index: 1, .. }
	));
	assert!(error.to_string().contains("out of range"));
}
