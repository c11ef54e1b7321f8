//! In-memory CSV table with typed, row-aware cell accessors.

use crate::error::{EngineError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

/// Day-first date layouts, tried in order. Two-digit years come first: chrono's `%Y` also
/// accepts `24` and would read it as year 24.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y",
    "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d-%m-%y %H:%M:%S",
    "%d-%m-%y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a calendar day, resolving ambiguous numeric dates day-first.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // a year below 100 is a short year token that slipped through a `%Y` layout
    let plausible = |d: &NaiveDate| d.year() >= 100;
    DATE_FORMATS
        .iter()
        .filter_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .find(plausible)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
                .find(plausible)
        })
}

pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    pub fn from_path(name: &str, path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(name, file)
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| EngineError::missing_column(&self.name, name))
    }

    /// Data rows with their 1-based row number.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &StringRecord)> {
        self.rows.iter().enumerate().map(|(i, r)| (i + 1, r))
    }

    fn cell<'a>(rec: &'a StringRecord, col: usize) -> Option<&'a str> {
        rec.get(col).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn text(&self, row: usize, rec: &StringRecord, col: usize) -> Result<String> {
        Self::cell(rec, col)
            .map(str::to_string)
            .ok_or_else(|| EngineError::invalid(&self.name, row, &self.headers[col], "empty value"))
    }

    pub fn opt_text(&self, rec: &StringRecord, col: Option<usize>) -> Option<String> {
        col.and_then(|c| Self::cell(rec, c)).map(str::to_string)
    }

    pub fn number(&self, row: usize, rec: &StringRecord, col: usize) -> Result<f64> {
        self.opt_number(row, rec, Some(col))?
            .ok_or_else(|| EngineError::invalid(&self.name, row, &self.headers[col], "empty value"))
    }

    /// Empty cells and the usual missing-value markers read as `None`.
    pub fn opt_number(&self, row: usize, rec: &StringRecord, col: Option<usize>) -> Result<Option<f64>> {
        let Some(c) = col else {
            return Ok(None);
        };
        match Self::cell(rec, c) {
            None => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("null") => {
                Ok(None)
            }
            Some(s) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| EngineError::invalid(&self.name, row, &self.headers[c], format!("not a number: {s:?}"))),
        }
    }

    pub fn date(&self, row: usize, rec: &StringRecord, col: usize) -> Result<NaiveDate> {
        let s = self.text(row, rec, col)?;
        parse_date(&s)
            .ok_or_else(|| EngineError::invalid(&self.name, row, &self.headers[col], format!("unrecognized date: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_day_first() {
        let d = parse_date("03/04/2024").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
        assert_eq!(parse_date("2024-04-03"), Some(d));
        assert_eq!(parse_date("03-Apr-2024"), Some(d));
        assert_eq!(parse_date("2024-04-03 10:15:00"), Some(d));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn two_digit_years_are_this_century() {
        let d = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();
        assert_eq!(parse_date("03/04/24"), Some(d));
        assert_eq!(parse_date("03-04-24"), Some(d));
        assert_eq!(parse_date("03.04.24"), Some(d));
        assert_eq!(parse_date("03/04/24 08:30"), Some(d));
        // four-digit years are not cut short by the two-digit layouts
        assert_eq!(parse_date("03/04/2024"), Some(d));
        assert_eq!(parse_date("03-04-2024"), Some(d));
    }

    #[test]
    fn missing_column_is_schema_error() {
        let t = Table::from_reader("merged", "consumer_id,date\nc1,2024-01-01\n".as_bytes()).unwrap();
        assert!(t.require("consumer_id").is_ok());
        match t.require("energy_consumed") {
            Err(EngineError::MissingColumn { table, column }) => {
                assert_eq!(table, "merged");
                assert_eq!(column, "energy_consumed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn headers_are_normalized_and_nan_is_missing() {
        let t = Table::from_reader("t", " Consumer_ID ,Energy_Input\nc1,NaN\n".as_bytes()).unwrap();
        let col = t.column("energy_input");
        let (row, rec) = t.rows().next().unwrap();
        assert_eq!(t.column("consumer_id"), Some(0));
        assert_eq!(t.opt_number(row, rec, col).unwrap(), None);
    }
}
