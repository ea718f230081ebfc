//! Cast-list normalization — raw tabular rows → typed [`CastEntry`] values.
//!
//! The normalizer consumes an ordered sequence of header-addressed rows
//! (column header → cell value). The concrete local row source is a CSV
//! file with a header row ([`read_castlist`]), but the normalization core
//! ([`normalize_rows`]) is independent of where the rows came from.
//!
//! ## Recognized headers
//!
//! `Real Name`, `Character`, `Comments`, `Image`, `Crop`, `Resize`,
//! `Channel`. Unrecognized headers are ignored; an absent header yields the
//! field's default. `Crop` and `Resize` accept a single truthy token (`"1"`);
//! any other value is false. `Crop` defaults to true, `Resize` to a
//! caller-supplied default.
//!
//! A row whose `Real Name` and `Character` are both empty after trimming is
//! structurally empty and is dropped. Malformed individual cells degrade to
//! field defaults; only an unreadable table is an error.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastlistError {
    #[error("failed to read castlist table: {0}")]
    Table(#[from] csv::Error),
}

/// One source row, addressed by column header.
pub type Row = HashMap<String, String>;

/// Normalized, validated representation of one cast-list row.
///
/// Built once by the normalizer and read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastEntry {
    /// Role name; may be empty.
    pub character: String,
    /// Performer name; may be empty.
    pub real_name: String,
    pub comments: String,
    /// Absent, a filesystem path, or a URL.
    pub image: Option<String>,
    pub crop: bool,
    pub resize: bool,
    /// Display label for the mic channel.
    pub channel: String,
}

/// The single token recognized as true in `Crop`/`Resize` cells.
const TRUTHY: &str = "1";

fn text_field(row: &Row, header: &str) -> String {
    row.get(header).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Absent header → default; present cell → strict comparison against `"1"`.
fn flag_field(row: &Row, header: &str, default: bool) -> bool {
    match row.get(header) {
        Some(value) => value == TRUTHY,
        None => default,
    }
}

/// Normalize raw rows into an ordered list of entries.
///
/// Rows with both name fields blank are dropped; input order is preserved
/// for the survivors.
pub fn normalize_rows<I>(rows: I, default_resize: bool) -> Vec<CastEntry>
where
    I: IntoIterator<Item = Row>,
{
    rows.into_iter()
        .filter_map(|row| {
            let character = text_field(&row, "Character");
            let real_name = text_field(&row, "Real Name");
            if character.is_empty() && real_name.is_empty() {
                return None;
            }
            let image = text_field(&row, "Image");
            Some(CastEntry {
                character,
                real_name,
                comments: text_field(&row, "Comments"),
                image: (!image.is_empty()).then_some(image),
                crop: flag_field(&row, "Crop", true),
                resize: flag_field(&row, "Resize", default_resize),
                channel: text_field(&row, "Channel"),
            })
        })
        .collect()
}

/// Read a CSV cast list from disk and normalize it.
///
/// The reader is flexible: rows shorter than the header row simply lack
/// those cells, rows longer have the extras ignored.
pub fn read_castlist(path: &Path, default_resize: bool) -> Result<Vec<CastEntry>, CastlistError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(normalize_rows(rows, default_resize))
}
