//! Parsing of the tabular movie catalog used by the bulk import.
//!
//! The source is CSV with a header row and the columns `Title`,
//! `Release Date` (also accepted as `ReleaseDate`) and `Actors`, where
//! `Actors` is a comma-separated list of names:
//!
//! ```text
//! Title,Release Date,Actors
//! Inception,2010-07-16,"Leonardo DiCaprio, Tom Hardy"
//! ```
//!
//! The whole source is parsed before anything is written, so a malformed
//! record never reaches the store.

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::CoreError;
use crate::movie::{validate_actor_name, validate_title};

/// Header of the title column.
const TITLE_HEADER: &str = "Title";

/// Accepted headers of the release date column.
const RELEASE_DATE_HEADERS: &[&str] = &["Release Date", "ReleaseDate"];

/// Date-only formats accepted for `Release Date`, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Date-time formats accepted for `Release Date`; the time part is dropped.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// One raw CSV row.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Release Date", alias = "ReleaseDate")]
    release_date: String,
    #[serde(rename = "Actors", default)]
    actors: String,
}

/// A fully parsed catalog entry, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedMovie {
    pub title: String,
    pub release_date: NaiveDate,
    pub actor_names: Vec<String>,
}

/// Parse every record of a catalog source.
///
/// Fails with [`CoreError::Validation`] when the header lacks a required
/// column, so a source that is not a catalog never reads as an empty one.
/// Otherwise fails on the first malformed record; the message carries the
/// 1-based record number (header excluded).
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<ImportedMovie>, CoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Catalog header is malformed: {e}")))?;
    check_headers(headers)?;

    let mut movies = Vec::new();
    for (index, row) in csv_reader.deserialize::<CatalogRecord>().enumerate() {
        let record_no = index + 1;
        let record = row.map_err(|e| {
            CoreError::Validation(format!("Catalog record {record_no} is malformed: {e}"))
        })?;

        validate_title(&record.title).map_err(|e| {
            CoreError::Validation(format!("Catalog record {record_no}: {e}"))
        })?;

        let release_date = parse_release_date(&record.release_date).ok_or_else(|| {
            CoreError::Validation(format!(
                "Catalog record {record_no}: unrecognised release date '{}'",
                record.release_date
            ))
        })?;

        let actor_names = split_actor_names(&record.actors);
        for name in &actor_names {
            validate_actor_name(name).map_err(|e| {
                CoreError::Validation(format!("Catalog record {record_no}: {e}"))
            })?;
        }

        movies.push(ImportedMovie {
            title: record.title,
            release_date,
            actor_names,
        });
    }

    Ok(movies)
}

fn check_headers(headers: &csv::StringRecord) -> Result<(), CoreError> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    if !has(TITLE_HEADER) {
        return Err(CoreError::Validation(format!(
            "Catalog header must contain a '{TITLE_HEADER}' column"
        )));
    }
    if !RELEASE_DATE_HEADERS.iter().any(|&name| has(name)) {
        return Err(CoreError::Validation(format!(
            "Catalog header must contain a '{}' column",
            RELEASE_DATE_HEADERS[0]
        )));
    }
    Ok(())
}

/// Parse a release date in any of the accepted formats.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Split a comma-separated actor list, trimming each name and dropping
/// empty entries.
pub fn split_actor_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
