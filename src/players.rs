//! Player-list serialization — records → binary property list.
//!
//! The output is a plist array with one dictionary per record. Key names,
//! key order, and the constant `Compressed`/`Scaled`/`Version` fields are a
//! schema contract with the downstream player tooling; the dictionary is
//! built explicitly (not via serde) so that contract is visible in one
//! place.

use crate::pipeline::PlayerRecord;
use plist::{Dictionary, Value};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayersError {
    #[error("failed to write player list: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode player list: {0}")]
    Plist(#[from] plist::Error),
}

fn record_value(record: &PlayerRecord) -> Value {
    let mut dict = Dictionary::new();
    dict.insert("Comments".to_string(), Value::String(record.comments.clone()));
    dict.insert("Compressed".to_string(), Value::Boolean(record.compressed));
    dict.insert("Image".to_string(), Value::Data(record.image.clone()));
    dict.insert("Name".to_string(), Value::String(record.name.clone()));
    dict.insert("RoleName".to_string(), Value::String(record.role_name.clone()));
    dict.insert("Scaled".to_string(), Value::Boolean(record.scaled));
    dict.insert("Channel".to_string(), Value::String(record.channel.clone()));
    dict.insert("Version".to_string(), Value::Integer((record.version as u64).into()));
    Value::Dictionary(dict)
}

/// The full player list as a plist value, records in input order.
pub fn players_value(records: &[PlayerRecord]) -> Value {
    Value::Array(records.iter().map(record_value).collect())
}

/// Encode the player list as a binary plist.
pub fn write_players<W: Write>(records: &[PlayerRecord], writer: W) -> Result<(), PlayersError> {
    players_value(records).to_writer_binary(writer)?;
    Ok(())
}

/// Encode the player list into a file.
pub fn write_players_file(records: &[PlayerRecord], path: &Path) -> Result<(), PlayersError> {
    let file = std::fs::File::create(path)?;
    write_players(records, std::io::BufWriter::new(file))
}
