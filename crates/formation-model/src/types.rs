//! Special field types and the conversions between stored and displayed
//! values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use formation::text::{fold_accent, tidy_hyphens};
use formation::{format_date_time, FormationConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ModelError, Result};

/// Stored value of an empty date.
pub const ZERO_DATE: &str = "0000-00-00";

/// Stored value of an empty date-time.
pub const ZERO_DATE_TIME: &str = "0000-00-00 00:00:00";

const STORED_DATE: &str = "%Y-%m-%d";
const STORED_DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";

/// A field whose value is converted between storage and the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialType {
    /// `Y-m-d` in storage, the configured date format in forms.
    Date,
    /// `Y-m-d H:i:s` in storage, the configured date-time format in forms.
    DateTime,
    /// Slugified on save.
    Slug,
    /// Slugified on save and made unique within its table column.
    UniqueSlug,
}

impl SpecialType {
    /// Returns the type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Slug => "slug",
            Self::UniqueSlug => "unique-slug",
        }
    }

    /// Returns the stored value meaning "no date", for date types.
    pub const fn zero_value(self) -> Option<&'static str> {
        match self {
            Self::Date => Some(ZERO_DATE),
            Self::DateTime => Some(ZERO_DATE_TIME),
            Self::Slug | Self::UniqueSlug => None,
        }
    }

    /// Reads a `field → type` map from JSON, e.g.
    /// `{"published_at": "date-time", "slug": "unique-slug"}`.
    pub fn parse_map(json: &str) -> Result<BTreeMap<String, Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for SpecialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_stored(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, STORED_DATE_TIME)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, STORED_DATE)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Converts a stored value to the form's display format.
///
/// Zero dates and empty values display as `""`. Slugs and values that do not
/// parse are returned unchanged.
pub fn format_value(value: &str, kind: SpecialType, config: &FormationConfig) -> String {
    let format = match kind {
        SpecialType::Date => &config.date_format,
        SpecialType::DateTime => &config.date_time_format,
        SpecialType::Slug | SpecialType::UniqueSlug => return value.to_string(),
    };
    let value = value.trim();
    if value.is_empty() || Some(value) == kind.zero_value() {
        return String::new();
    }
    match parse_stored(value) {
        Some(stamp) => format_date_time(stamp, format).unwrap_or_else(|| {
            warn!(value, format = %format, "date format cannot be rendered, leaving value as is");
            value.to_string()
        }),
        None => {
            warn!(value, kind = %kind, "stored value is not a date, leaving it as is");
            value.to_string()
        }
    }
}

fn parse_display(value: &str, kind: SpecialType, config: &FormationConfig) -> Option<NaiveDateTime> {
    let date_formats = [config.date_format.as_str(), STORED_DATE, "%m/%d/%Y"];
    let parse_date = || {
        date_formats
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
            .map(|d| d.and_time(NaiveTime::MIN))
    };
    match kind {
        SpecialType::Date => parse_date(),
        _ => [
            config.date_time_format.as_str(),
            STORED_DATE_TIME,
            "%Y-%m-%d %H:%M",
            "%m/%d/%Y %H:%M",
        ]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(parse_date),
    }
}

/// Converts a submitted date or date-time to its stored form.
///
/// Empty input stores the zero date. Other types pass through.
pub fn storage_value(
    field: &str,
    value: &str,
    kind: SpecialType,
    config: &FormationConfig,
) -> Result<String> {
    let Some(zero) = kind.zero_value() else {
        return Ok(value.to_string());
    };
    let format = if kind == SpecialType::Date {
        STORED_DATE
    } else {
        STORED_DATE_TIME
    };

    let value = value.trim();
    if value.is_empty() {
        return Ok(zero.to_string());
    }
    parse_display(value, kind, config)
        .and_then(|stamp| format_date_time(stamp, format))
        .ok_or_else(|| ModelError::InvalidDate {
            field: field.to_string(),
            kind,
            value: value.to_string(),
        })
}

/// Lower-cases text, folds accents and joins the remaining words with
/// hyphens.
pub fn slug(text: &str) -> String {
    let raw: String = text
        .chars()
        .map(fold_accent)
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    tidy_hyphens(&raw).trim_start_matches('-').to_string()
}
