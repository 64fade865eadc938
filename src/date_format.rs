//! Conversions between timestamps and their form and display representations.
//!
//! All timestamps are stored as naive UTC.
use chrono::{NaiveDate, NaiveDateTime};

/// The format used by `datetime-local` inputs
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parses a date submitted through a form, accepting either a full `datetime-local` value or a
/// plain date, which is taken as midnight.
pub fn parse(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    NaiveDateTime::parse_from_str(input, INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(input, DATE_FORMAT)
                .ok()
                .map(|date| date.and_hms(0, 0, 0))
        })
}

/// Formats a date as the value of a `datetime-local` input.
pub fn to_input(date: &NaiveDateTime) -> String {
    date.format(INPUT_FORMAT).to_string()
}

/// Formats a date for display on a page.
pub fn display(date: &NaiveDateTime) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}
