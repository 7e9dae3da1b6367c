//! Option lists for selects, checkbox sets and radio sets.
//!
//! An [`OptionList`] keeps its entries in insertion order. Keys are the
//! submitted values; inserting an existing key replaces its entry in place.
//! A key may carry a `[DUPLICATE]` suffix so that two entries can render the
//! same value, see [`DUPLICATE_MARKER`].

use chrono::{Datelike, Local, Months, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::format_date_time;
use crate::tree::ValueTree;

/// Suffix stripped from option keys at render time.
pub const DUPLICATE_MARKER: &str = "[DUPLICATE]";

/// One option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionEntry {
    /// A plain option with its display text.
    Item(String),
    /// An `<optgroup>` of options, labelled by its key.
    Group(OptionList),
    /// An option with an inline help text (radio sets).
    Described { label: String, help: String },
}

impl OptionEntry {
    /// Returns the display text, or the empty string for groups.
    pub fn label(&self) -> &str {
        match self {
            Self::Item(label) | Self::Described { label, .. } => label,
            Self::Group(_) => "",
        }
    }
}

impl From<&str> for OptionEntry {
    fn from(label: &str) -> Self {
        Self::Item(label.to_string())
    }
}

impl From<String> for OptionEntry {
    fn from(label: String) -> Self {
        Self::Item(label)
    }
}

impl From<OptionList> for OptionEntry {
    fn from(list: OptionList) -> Self {
        Self::Group(list)
    }
}

/// An ordered list of `key → option` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionList {
    entries: Vec<(String, OptionEntry)>,
}

impl OptionList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing an existing entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<OptionEntry>) {
        let key = key.into();
        let entry = entry.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Builder method to add an entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, entry: impl Into<OptionEntry>) -> Self {
        self.insert(key, entry);
        self
    }

    /// Builder method to add an option with help text.
    #[must_use]
    pub fn described(
        mut self,
        key: impl Into<String>,
        label: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        self.insert(
            key,
            OptionEntry::Described {
                label: label.into(),
                help: help.into(),
            },
        );
        self
    }

    /// Returns the entry for a key.
    pub fn get(&self, key: &str) -> Option<&OptionEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// Iterates over `(key, entry)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for OptionList
where
    K: Into<String>,
    V: Into<OptionEntry>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut list = Self::new();
        for (key, entry) in iter {
            list.insert(key, entry);
        }
        list
    }
}

/// Strips the `[DUPLICATE]` marker from an option key.
pub fn strip_duplicate(key: &str) -> String {
    key.replace(DUPLICATE_MARKER, "")
}

/// Uses every value as both key and display text.
pub fn simple<I, S>(values: I) -> OptionList
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(|v| {
            let v = v.into();
            (v.clone(), v)
        })
        .collect()
}

/// Keys the values by their 1-based position.
pub fn offset<I, S>(values: I) -> OptionList
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| ((i + 1).to_string(), v.into()))
        .collect()
}

fn format_number(value: f64, decimals: usize) -> String {
    if decimals > 0 {
        format!("{value:.decimals$}")
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Most entries [`number`] produces.
pub const MAX_NUMBER_OPTIONS: usize = 10_000;

/// Numbers from `start` to `end` by `increment`, counting down when `start`
/// is greater than `end`. With `decimals`, values are formatted with that
/// many decimal places.
///
/// The list stops after [`MAX_NUMBER_OPTIONS`] entries. Non-finite bounds
/// give an empty list.
pub fn number(start: f64, end: f64, increment: f64, decimals: usize) -> OptionList {
    if increment <= 0.0 || !increment.is_finite() {
        warn!(increment, "number options need a positive increment");
        return OptionList::new();
    }
    if !start.is_finite() || !end.is_finite() {
        warn!(start, end, "number options need finite bounds");
        return OptionList::new();
    }

    let mut steps = ((end - start).abs() / increment + 1e-9).floor() as usize;
    if steps >= MAX_NUMBER_OPTIONS {
        warn!(start, end, increment, "number options truncated to {MAX_NUMBER_OPTIONS} entries");
        steps = MAX_NUMBER_OPTIONS - 1;
    }
    let direction = if start <= end { 1.0 } else { -1.0 };
    (0..=steps)
        .map(|step| {
            let value = format_number(start + direction * increment * step as f64, decimals);
            (value.clone(), value)
        })
        .collect()
}

/// A two-entry list from `"Yes/No"`-style text. With `start_with_one` the
/// first text gets key `1`, otherwise key `0`.
pub fn boolean(options: &str, start_with_one: bool) -> OptionList {
    let mut parts = options.splitn(2, '/');
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();
    let (first_key, second_key) = if start_with_one { ("1", "0") } else { ("0", "1") };
    OptionList::new()
        .with(first_key, first)
        .with(second_key, second)
}

/// Minute granularity of [`time`] options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStep {
    /// On the hour.
    Full,
    /// Every 30 minutes.
    #[default]
    Half,
    /// Every 15 minutes.
    Quarter,
    /// Every minute.
    All,
}

impl TimeStep {
    fn minutes(self) -> Vec<u32> {
        match self {
            Self::Full => vec![0],
            Self::Half => vec![0, 30],
            Self::Quarter => vec![0, 15, 30, 45],
            Self::All => (0..60).collect(),
        }
    }
}

/// Times of day keyed `HH:MM:00` (24-hour) and displayed `hh:MMam`.
pub fn time(step: TimeStep) -> OptionList {
    let minutes = step.minutes();
    let mut list = OptionList::new();
    for hour in 0..24u32 {
        let meridiem = if hour < 12 { "am" } else { "pm" };
        let display_hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        for minute in &minutes {
            list.insert(
                format!("{hour:02}:{minute:02}:00"),
                format!("{display_hour:02}:{minute:02}{meridiem}"),
            );
        }
    }
    list
}

/// Where [`month`] options stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthEnd {
    /// This many months after (positive) or before (negative) the start.
    Count(i32),
    /// The given date; the list counts down when it precedes the start.
    Date(NaiveDate),
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let step = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    }
}

/// Months from `start` (the current month when `None`) to `end`, keyed by
/// the first day of the month (`%Y-%m-%d`), or by the last day when
/// `last_day` is set, and displayed with the `chrono` `format`.
pub fn month(start: Option<NaiveDate>, end: MonthEnd, last_day: bool, format: &str) -> OptionList {
    let start = first_of_month(start.unwrap_or_else(|| Local::now().date_naive()));
    let end = match end {
        MonthEnd::Count(count) => shift_months(start, count).unwrap_or(start),
        MonthEnd::Date(date) => date,
    };
    let ascending = end > start;

    let mut list = OptionList::new();
    let mut current = start;
    while (ascending && current <= end) || (!ascending && current >= end) {
        let date = if last_day {
            last_day_of_month(current)
        } else {
            current
        };
        let key = date.format("%Y-%m-%d").to_string();
        let label = format_date_time(date.and_time(NaiveTime::MIN), format).unwrap_or_else(|| {
            warn!(format, "month format cannot be rendered, showing the date");
            key.clone()
        });
        list.insert(key, label);
        match shift_months(current, if ascending { 1 } else { -1 }) {
            Some(next) => current = next,
            None => break,
        }
    }
    list
}

/// Returns the last day of the month `date` falls in.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Builds options from records, keyed by one field and displayed by another.
///
/// Records are anything serializable to a JSON object; records missing
/// either field are skipped.
pub fn prep<T: Serialize>(records: &[T], key_field: &str, display_field: &str) -> OptionList {
    let mut list = OptionList::new();
    for record in records {
        let tree = match serde_json::to_value(record) {
            Ok(value) => ValueTree::from_json(&value).unwrap_or_default(),
            Err(error) => {
                warn!(%error, "skipping option record that does not serialize");
                continue;
            }
        };
        match (tree.get_dotted(key_field), tree.get_dotted(display_field)) {
            (Some(key), Some(display)) => list.insert(key.as_text(), display.as_text()),
            _ => debug!(key_field, display_field, "option record is missing a field"),
        }
    }
    list
}

const COUNTRIES: &[&str] = &[
    "Canada", "United States", "Afghanistan", "Albania", "Algeria", "American Samoa",
    "Andorra", "Angola", "Anguilla", "Antarctica", "Antigua And Barbuda", "Argentina",
    "Armenia", "Aruba", "Australia", "Austria", "Azerbaijan", "Bahamas", "Bahrain",
    "Bangladesh", "Barbados", "Belarus", "Belgium", "Belize", "Benin", "Bermuda", "Bhutan",
    "Bolivia", "Bosnia And Herzegowina", "Botswana", "Bouvet Island", "Brazil",
    "British Indian Ocean Territory", "Brunei Darussalam", "Bulgaria", "Burkina Faso",
    "Burundi", "Cambodia", "Cameroon", "Cape Verde", "Cayman Islands",
    "Central African Republic", "Chad", "Chile", "China", "Christmas Island",
    "Cocos (Keeling) Islands", "Colombia", "Comoros", "Congo",
    "Congo, The Democratic Republic Of The", "Cook Islands", "Costa Rica", "Cote D'Ivoire",
    "Croatia (Local Name: Hrvatska)", "Cuba", "Cyprus", "Czech Republic", "Denmark",
    "Djibouti", "Dominica", "Dominican Republic", "East Timor", "Ecuador", "Egypt",
    "El Salvador", "Equatorial Guinea", "Eritrea", "Estonia", "Ethiopia",
    "Falkland Islands (Malvinas)", "Faroe Islands", "Fiji", "Finland", "France",
    "France, Metropolitan", "French Guiana", "French Polynesia", "French Southern Territories",
    "Gabon", "Gambia", "Georgia", "Germany", "Ghana", "Gibraltar", "Greece", "Greenland",
    "Grenada", "Guadeloupe", "Guam", "Guatemala", "Guinea", "Guinea-Bissau", "Guyana", "Haiti",
    "Heard And Mc Donald Islands", "Holy See (Vatican City State)", "Honduras", "Hong Kong",
    "Hungary", "Iceland", "India", "Indonesia", "Iran", "Iraq", "Ireland", "Israel", "Italy",
    "Jamaica", "Japan", "Jordan", "Kazakhstan", "Kenya", "Kiribati",
    "Korea, Democratic People'S Republic Of", "Korea, Republic Of", "Kuwait", "Kyrgyzstan",
    "Lao People'S Democratic Republic", "Latvia", "Lebanon", "Lesotho", "Liberia",
    "Libyan Arab Jamahiriya", "Liechtenstein", "Lithuania", "Luxembourg", "Macau",
    "Macedonia, Former Yugoslav Republic Of", "Madagascar", "Malawi", "Malaysia", "Maldives",
    "Mali", "Malta", "Marshall Islands", "Martinique", "Mauritania", "Mauritius", "Mayotte",
    "Mexico", "Micronesia, Federated States Of", "Moldova, Republic Of", "Monaco", "Mongolia",
    "Montserrat", "Morocco", "Mozambique", "Myanmar", "Namibia", "Nauru", "Nepal",
    "Netherlands", "Netherlands Antilles", "New Caledonia", "New Zealand", "Nicaragua",
    "Niger", "Nigeria", "Niue", "Norfolk Island", "Northern Mariana Islands", "Norway", "Oman",
    "Pakistan", "Palau", "Panama", "Papua New Guinea", "Paraguay", "Peru", "Philippines",
    "Pitcairn", "Poland", "Portugal", "Puerto Rico", "Qatar", "Reunion", "Romania",
    "Russian Federation", "Rwanda", "Saint Kitts And Nevis", "Saint Lucia",
    "Saint Vincent And The Grenadines", "Samoa", "San Marino", "Sao Tome And Principe",
    "Saudi Arabia", "Senegal", "Seychelles", "Sierra Leone", "Singapore",
    "Slovakia (Slovak Republic)", "Slovenia", "Solomon Islands", "Somalia", "South Africa",
    "South Georgia, South Sandwich Islands", "Spain", "Sri Lanka", "St. Helena",
    "St. Pierre And Miquelon", "Sudan", "Suriname", "Svalbard And Jan Mayen Islands",
    "Swaziland", "Sweden", "Switzerland", "Syrian Arab Republic", "Taiwan", "Tajikistan",
    "Tanzania, United Republic Of", "Thailand", "Togo", "Tokelau", "Tonga",
    "Trinidad And Tobago", "Tunisia", "Turkey", "Turkmenistan", "Turks And Caicos Islands",
    "Tuvalu", "Uganda", "Ukraine", "United Arab Emirates", "United Kingdom",
    "United States Minor Outlying Islands", "Uruguay", "Uzbekistan", "Vanuatu", "Venezuela",
    "Viet Nam", "Virgin Islands (British)", "Virgin Islands (U.S.)",
    "Wallis And Futuna Islands", "Western Sahara", "Yemen", "Yugoslavia", "Zambia", "Zimbabwe",
];

const PROVINCES: &[(&str, &str)] = &[
    ("AB", "Alberta"),
    ("BC", "British Columbia"),
    ("MB", "Manitoba"),
    ("NB", "New Brunswick"),
    ("NL", "Newfoundland"),
    ("NT", "Northwest Territories"),
    ("NS", "Nova Scotia"),
    ("NU", "Nunavut"),
    ("ON", "Ontario"),
    ("PE", "Prince Edward Island"),
    ("QC", "Quebec"),
    ("SK", "Saskatchewan"),
    ("YT", "Yukon Territory"),
];

const STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("VI", "Virgin Islands"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

fn region_options(regions: &[(&str, &str)], abbreviated: bool) -> OptionList {
    if abbreviated {
        regions.iter().copied().collect()
    } else {
        simple(regions.iter().map(|(_, name)| *name))
    }
}

/// Country names.
pub fn countries() -> OptionList {
    simple(COUNTRIES.iter().copied())
}

/// Canadian provinces and territories, keyed by abbreviation or by name.
pub fn provinces(abbreviated: bool) -> OptionList {
    region_options(PROVINCES, abbreviated)
}

/// US states, keyed by abbreviation or by name.
pub fn states(abbreviated: bool) -> OptionList {
    region_options(STATES, abbreviated)
}
