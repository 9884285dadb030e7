//! JSON array and NDJSON record readers

use crate::error::MotorError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A record that could not be deserialized
#[derive(Debug)]
pub struct RejectedRecord {
    /// 1-based line (NDJSON) or element (array) number
    pub position: usize,
    /// Present when the entry was valid JSON carrying a string `subject_id`
    pub subject_id: Option<String>,
    pub error: MotorError,
}

pub struct RecordReader;

impl RecordReader {
    /// Parse a JSON array of records, failing on the first bad element
    pub fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, MotorError> {
        first_rejection(Self::each_in_array(json)?)
    }

    /// Parse newline-delimited records, skipping blank lines and failing on
    /// the first bad line
    pub fn parse_ndjson<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, MotorError> {
        first_rejection(Self::each_in_ndjson(ndjson))
    }

    /// A leading `[` selects array parsing, a leading `{` NDJSON
    pub fn parse<T: DeserializeOwned>(input: &str) -> Result<Vec<T>, MotorError> {
        first_rejection(Self::parse_each(input)?)
    }

    /// Parse every record on its own, so one bad record leaves the rest intact.
    ///
    /// Only an array input that is not valid JSON as a whole fails outright.
    pub fn parse_each<T: DeserializeOwned>(
        input: &str,
    ) -> Result<Vec<Result<T, RejectedRecord>>, MotorError> {
        if input.trim_start().starts_with('[') {
            Self::each_in_array(input)
        } else {
            Ok(Self::each_in_ndjson(input))
        }
    }

    fn each_in_array<T: DeserializeOwned>(
        json: &str,
    ) -> Result<Vec<Result<T, RejectedRecord>>, MotorError> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(index, value)| decode(value, index + 1, "record"))
            .collect())
    }

    fn each_in_ndjson<T: DeserializeOwned>(ndjson: &str) -> Vec<Result<T, RejectedRecord>> {
        ndjson
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| match serde_json::from_str::<Value>(line.trim()) {
                Ok(value) => decode(value, index + 1, "line"),
                Err(e) => Err(RejectedRecord {
                    position: index + 1,
                    subject_id: None,
                    error: MotorError::InvalidInput(format!(
                        "Failed to parse line {}: {}",
                        index + 1,
                        e
                    )),
                }),
            })
            .collect()
    }
}

fn decode<T: DeserializeOwned>(value: Value, position: usize, unit: &str) -> Result<T, RejectedRecord> {
    let subject_id = value
        .get("subject_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    serde_json::from_value(value).map_err(|e| RejectedRecord {
        position,
        subject_id,
        error: MotorError::InvalidInput(format!("Failed to parse {unit} {position}: {e}")),
    })
}

fn first_rejection<T>(entries: Vec<Result<T, RejectedRecord>>) -> Result<Vec<T>, MotorError> {
    entries
        .into_iter()
        .map(|entry| entry.map_err(|rejected| rejected.error))
        .collect()
}
