/// A `Record` is a single observation of the visit rate of a place during one hour.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
	pub place_id: String,
	/// This is a label like "Friday - March" that groups dates together.
	pub date_bucket: String,
	pub hour: i64,
	/// The raw visit rate when loaded, and a value in [0, 1] once the records have been normalized.
	pub visit_rate: f32,
}

/// These are the columns of a `Record` that can be used as model inputs. Their names match the field names used by the remote data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
	PlaceId,
	DateBucket,
	Hour,
}

impl Column {
	pub fn name(&self) -> &'static str {
		match self {
			Column::PlaceId => "place_id",
			Column::DateBucket => "date",
			Column::Hour => "time",
		}
	}
}

impl std::str::FromStr for Column {
	type Err = UnknownColumnError;
	fn from_str(name: &str) -> Result<Self, Self::Err> {
		match name {
			"place_id" => Ok(Column::PlaceId),
			"date" => Ok(Column::DateBucket),
			"time" => Ok(Column::Hour),
			_ => Err(UnknownColumnError(name.to_owned())),
		}
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown column \"{0}\"")]
pub struct UnknownColumnError(pub String);

impl std::fmt::Display for Column {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
	Text(&'a str),
	Number(f32),
}

impl<'a> Value<'a> {
	pub fn as_text(&self) -> Option<&'a str> {
		match self {
			Value::Text(value) => Some(*value),
			Value::Number(_) => None,
		}
	}

	pub fn as_number(&self) -> Option<f32> {
		match self {
			Value::Text(_) => None,
			Value::Number(value) => Some(*value),
		}
	}
}

/**
An `Example` is anything the model can compute features for. Both training `Record`s and prediction inputs, which lack a visit rate, implement it.
*/
pub trait Example {
	fn value(&self, column: Column) -> Value<'_>;
}

impl Example for Record {
	fn value(&self, column: Column) -> Value<'_> {
		match column {
			Column::PlaceId => Value::Text(&self.place_id),
			Column::DateBucket => Value::Text(&self.date_bucket),
			Column::Hour => Value::Number(self.hour as f32),
		}
	}
}

impl<T> Example for &T
where
	T: Example + ?Sized,
{
	fn value(&self, column: Column) -> Value<'_> {
		(**self).value(column)
	}
}

#[test]
fn test_record_values() {
	let record = Record {
		place_id: "p1".to_owned(),
		date_bucket: "Friday - March".to_owned(),
		hour: 21,
		visit_rate: 3.0,
	};
	assert_eq!(record.value(Column::PlaceId).as_text(), Some("p1"));
	assert_eq!(
		record.value(Column::DateBucket).as_text(),
		Some("Friday - March")
	);
	assert_eq!(record.value(Column::Hour).as_number(), Some(21.0));
	assert_eq!(record.value(Column::Hour).as_text(), None);
	assert_eq!(Column::DateBucket.to_string(), "date");
	assert_eq!("time".parse::<Column>().unwrap(), Column::Hour);
	assert!("visits_num".parse::<Column>().is_err());
}
