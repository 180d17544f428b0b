//! CSV format handling for command files and view output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvCommand structure for deserialization
//! - Conversion from CSV records to [`Command`]s
//! - View output serialization
//!
//! Conversion is pure (no I/O) for easy testing.

use crate::types::{
    Command, Description, PaymentError, PaymentMethod, Status, Transaction, TransactionView,
};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Column names of the view output, in order
pub const OUTPUT_HEADER: [&str; 12] = [
    "command",
    "id",
    "description_id",
    "payment_method_id",
    "value",
    "establishment",
    "merchant_code",
    "nsu",
    "authorization_code",
    "status",
    "payment_type",
    "instalments",
];

/// CSV record structure for deserialization
///
/// Matches the input format with columns:
/// `command,id,value,establishment,merchant_code,payment_type,instalments,
/// description_id,payment_method_id,nsu,authorization_code,status`.
/// Everything but `command` is optional; which columns a command needs
/// depends on the command.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvCommand {
    pub command: String,
    pub id: Option<String>,
    pub value: Option<String>,
    pub establishment: Option<String>,
    pub merchant_code: Option<String>,
    pub payment_type: Option<String>,
    pub instalments: Option<String>,
    pub description_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub nsu: Option<String>,
    pub authorization_code: Option<String>,
    pub status: Option<String>,
}

/// Treat blank cells as missing
fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_optional<T: FromStr>(field: &Option<String>, column: &str) -> Result<Option<T>, String> {
    present(field)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| format!("Invalid {} '{}'", column, raw))
        })
        .transpose()
}

fn require<'a>(field: &'a Option<String>, column: &str, command: &str) -> Result<&'a str, String> {
    present(field).ok_or_else(|| format!("{} requires {}", command, column))
}

/// Convert a CsvCommand to a Command
///
/// This function:
/// - Parses the command name (case-insensitive)
/// - Requires an `id` for `find` and `reverse`
/// - Builds the prospective transaction for `pay`, copying every supplied
///   column onto it (server-owned columns included, so the service can
///   reject them)
///
/// # Returns
///
/// * `Ok(Command)` - Successfully converted command
/// * `Err(String)` - Description of the conversion failure
pub fn convert_csv_command(record: CsvCommand) -> Result<Command, String> {
    let name = record.command.trim().to_lowercase();

    match name.as_str() {
        "find" | "find_by_id" => {
            let id = require(&record.id, "id", "find")?;
            let id = id.parse().map_err(|_| format!("Invalid id '{}'", id))?;
            Ok(Command::FindById(id))
        }
        "find_all" => Ok(Command::FindAll),
        "reverse" => {
            let id = require(&record.id, "id", "reverse")?;
            let id = id.parse().map_err(|_| format!("Invalid id '{}'", id))?;
            Ok(Command::Reverse(id))
        }
        "pay" => {
            let value = require(&record.value, "value", "pay")?;
            let value =
                Decimal::from_str(value).map_err(|_| format!("Invalid value '{}'", value))?;
            let instalments = parse_optional::<u32>(&record.instalments, "instalments")?
                .ok_or_else(|| "pay requires instalments".to_string())?;

            let description = Description {
                id: parse_optional(&record.description_id, "description_id")?,
                value,
                establishment: require(&record.establishment, "establishment", "pay")?.to_string(),
                merchant_code: require(&record.merchant_code, "merchant_code", "pay")?.to_string(),
                nsu: present(&record.nsu).map(str::to_string),
                authorization_code: present(&record.authorization_code).map(str::to_string),
                status: parse_optional::<Status>(&record.status, "status")?,
            };
            let payment_method = PaymentMethod {
                id: parse_optional(&record.payment_method_id, "payment_method_id")?,
                payment_type: require(&record.payment_type, "payment_type", "pay")?.to_string(),
                instalments,
            };

            Ok(Command::Pay(Transaction {
                id: parse_optional(&record.id, "id")?,
                description,
                payment_method,
            }))
        }
        _ => Err(format!("Invalid command '{}'", record.command)),
    }
}

/// Streaming writer of transaction views
///
/// Writes the header on creation and one row per view afterwards.
pub struct ViewWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> ViewWriter<W> {
    /// Create a writer and emit the header row
    pub fn new(output: W) -> Result<Self, PaymentError> {
        let mut writer = Writer::from_writer(output);
        writer.write_record(OUTPUT_HEADER)?;
        Ok(Self { writer })
    }

    /// Write one row per view, tagged with the command that produced it
    pub fn write_views(&mut self, command: &str, views: &[TransactionView]) -> Result<(), PaymentError> {
        for view in views {
            self.writer.write_record(&[
                command.to_string(),
                view.id.to_string(),
                view.description.id.to_string(),
                view.payment_method.id.to_string(),
                view.description.value.to_string(),
                view.description.establishment.clone(),
                view.description.merchant_code.clone(),
                view.description.nsu.clone(),
                view.description.authorization_code.clone(),
                view.description.status.to_string(),
                view.payment_method.payment_type.clone(),
                view.payment_method.instalments.to_string(),
            ])?;
        }
        Ok(())
    }

    /// Flush buffered rows to the underlying writer
    pub fn flush(&mut self) -> Result<(), PaymentError> {
        self.writer.flush()?;
        Ok(())
    }
}
