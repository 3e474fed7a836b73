//! Date normalization
//!
//! Spreadsheet sources hand dates over as serial day counts; CSV sources as
//! text in whatever locale the export used. Both are reduced to ISO dates.

use chrono::{Duration, NaiveDate};

use crate::app::models::CellValue;
use crate::constants::{DATE_FORMATS, ISO_DATE_FORMAT, SPREADSHEET_EPOCH};

/// Largest serial accepted; beyond this chrono cannot represent the date
const MAX_SERIAL_DAYS: f64 = 2_900_000.0;

/// Normalize a raw date cell to `YYYY-MM-DD`.
///
/// Numeric text (a serial written out by a CSV export) is treated as a serial.
/// Unparseable text is returned unchanged rather than dropped.
pub fn normalize_date(raw: &CellValue) -> Option<String> {
    match raw {
        CellValue::Empty => None,
        CellValue::Number(serial) => serial_to_iso(*serial),
        CellValue::Text(text) => {
            let serial = text.trim().parse::<f64>().ok().filter(|n| n.is_finite());
            let converted = match serial {
                Some(serial) => serial_to_iso(serial),
                None => parse_text_date(text),
            };
            Some(converted.unwrap_or_else(|| text.clone()))
        }
        CellValue::Bool(b) => Some(b.to_string()),
    }
}

/// Convert a spreadsheet serial (day 0 = 1899-12-30) to an ISO date.
///
/// Fractional parts carry the time of day and are dropped.
pub fn serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }

    let (year, month, day) = SPREADSHEET_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    let date = epoch.checked_add_signed(Duration::days(serial.floor() as i64))?;
    Some(date.format(ISO_DATE_FORMAT).to_string())
}

/// Try each known format against the date portion of `text`
fn parse_text_date(text: &str) -> Option<String> {
    let date_part = text.split(' ').next().unwrap_or(text);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(|date| date.format(ISO_DATE_FORMAT).to_string())
}
