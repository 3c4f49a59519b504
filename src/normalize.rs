//! Display normalization for paged results.
//!
//! Turns positional database rows into [`Record`]s keyed by human-readable
//! column names, with date-like columns rendered as calendar dates.
//!
//! Dates are rendered in UTC as `YYYY-MM-DD`, so output does not depend on the
//! locale or timezone of the machine running the query.

use crate::db::{ColumnInfo, Row, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, warn};

/// Format used for every normalized date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A normalized row: display name to value, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. An existing entry keeps its position and its old
    /// value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Keys in column order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Converts a raw column name into its display name.
///
/// Splits on underscores, uppercases the first letter of each segment and joins
/// the segments with single spaces: `start_date` becomes `Start Date`.
pub fn normalize_field_name(name: &str) -> String {
    name.split('_')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds display records from raw rows.
///
/// Date-like columns (per [`ColumnInfo::is_date_like`]) are rendered with
/// [`format_date_value`]. When two raw names normalize to the same display name
/// the later column's value wins.
pub fn normalize(rows: &[Row], fields: &[ColumnInfo]) -> Vec<Record> {
    if rows.is_empty() {
        warn!("Result set for normalization was empty; skipping normalization");
        return Vec::new();
    }

    let display_names: Vec<String> = fields
        .iter()
        .map(|field| normalize_field_name(&field.name))
        .collect();

    debug!(
        "Normalizing {} rows: {:?} -> {:?}",
        rows.len(),
        fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        display_names
    );

    rows.iter()
        .map(|row| {
            let mut record = Record::new();
            for ((field, display_name), value) in fields.iter().zip(&display_names).zip(row) {
                let value = if field.is_date_like() {
                    format_date_value(value)
                } else {
                    value.clone()
                };
                if record.insert(display_name.clone(), value).is_some() {
                    debug!(
                        "Column '{}' overwrote an earlier column named '{}'",
                        field.name, display_name
                    );
                }
            }
            record
        })
        .collect()
}

/// Renders a stored date/time value as a UTC calendar date.
///
/// Accepts native dates and datetimes, RFC 3339 text, `YYYY-MM-DD[ HH:MM:SS]`
/// text, and integers as Unix milliseconds. NULL stays NULL; anything else is
/// returned unchanged.
pub fn format_date_value(value: &Value) -> Value {
    let date = match value {
        Value::Null => return Value::Null,
        Value::Date(date) => Some(*date),
        Value::DateTime(instant) => Some(instant.date_naive()),
        Value::Int(millis) => {
            DateTime::<Utc>::from_timestamp_millis(*millis).map(|dt| dt.date_naive())
        }
        Value::String(text) => parse_date_text(text),
        _ => None,
    };

    match date {
        Some(date) => Value::String(date.format(DATE_FORMAT).to_string()),
        None => {
            warn!("Could not interpret {value:?} as a date; leaving it unchanged");
            value.clone()
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc).date_naive());
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.date())
        .or_else(|| NaiveDate::parse_from_str(text, DATE_FORMAT).ok())
}
