//! Dataset model and scalar value helpers.
//!
//! A [`Dataset`] is an ordered sequence of rows over a fixed, ordered list of
//! unique field names. Values are kept as strings the way the CSV layer
//! delivers them; normalization (date reformatting, integer coercion) happens
//! at the point a value enters a mapping table or a resolved output cell.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};

/// Input date patterns tried in order when normalizing a value to `dd/mm/yy`.
pub const DATE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d/%m/%y",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    fields: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Builds a dataset from a header row and data rows.
    ///
    /// Field names must be unique. Rows shorter than the header are padded
    /// with empty strings; rows wider than the header are rejected.
    pub fn new(fields: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.as_str()) {
                return Err(anyhow!("Duplicate field name '{field}' in dataset"));
            }
        }
        let width = fields.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(anyhow!(
                    "Row {} has {} values but the dataset defines {} field(s)",
                    idx + 1,
                    row.len(),
                    width
                ));
            }
            row.resize(width, String::new());
            padded.push(row);
        }
        Ok(Dataset {
            fields,
            rows: padded,
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<RowView<'_>> {
        self.rows.get(idx).map(|values| RowView {
            fields: &self.fields,
            values,
        })
    }

    pub fn iter_rows(&self) -> impl DoubleEndedIterator<Item = RowView<'_>> {
        self.rows.iter().map(|values| RowView {
            fields: &self.fields,
            values,
        })
    }
}

/// Borrowed view over one dataset row with by-name access.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    fields: &'a [String],
    values: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn get(&self, field: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn get_index(&self, idx: usize) -> Option<&'a str> {
        self.values.get(idx).map(String::as_str)
    }

    pub fn fields(&self) -> &'a [String] {
        self.fields
    }
}

/// Returns true when the field name hints at a date value.
pub fn is_date_field(name: &str) -> bool {
    let lowered = name.to_lowercase();
    lowered.contains("fecha") || lowered.contains("date")
}

/// Returns true when the field name hints at an integer identifier.
pub fn is_integer_field(name: &str) -> bool {
    let lowered = name.to_lowercase();
    ["id", "codigo", "código", "numero", "número"]
        .iter()
        .any(|hint| lowered.contains(hint))
}

/// Normalizes a date-like value to `dd/mm/yy`.
///
/// Tries [`DATE_INPUT_FORMATS`] in order. Values carrying a time component
/// that no pattern accepts are split on whitespace and the date part is
/// reparsed. Values that are already `dd/mm/yy` pass through untouched, and
/// unparseable values are returned unchanged.
pub fn normalize_date_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() == 3 && parts[2].len() == 2 {
        return trimmed.to_string();
    }
    for fmt in DATE_INPUT_FORMATS {
        if fmt.contains("%H") {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return parsed.format("%d/%m/%y").to_string();
            }
        } else if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return parsed.format("%d/%m/%y").to_string();
        }
    }
    // Timestamp variants such as "2025-02-18 00:00:00.000": retry on the
    // date part alone.
    if let Some(date_part) = trimmed.split_whitespace().next() {
        if date_part != trimmed {
            for fmt in DATE_INPUT_FORMATS.iter().filter(|f| !f.contains("%H")) {
                if let Ok(parsed) = NaiveDate::parse_from_str(date_part, fmt) {
                    return parsed.format("%d/%m/%y").to_string();
                }
            }
        }
    }
    trimmed.to_string()
}

/// Coerces float-looking values to integers when the conversion is exact.
///
/// `"11.0"` becomes `"11"`; `"11.5"` and non-numeric values are returned
/// unchanged.
pub fn coerce_integer(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.parse::<i64>().is_ok() {
        return trimmed.to_string();
    }
    if let Ok(parsed) = trimmed.parse::<f64>() {
        if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
            return (parsed as i64).to_string();
        }
    }
    trimmed.to_string()
}

/// Applies a destination-column format string to a resolved value.
///
/// Recognizes the number formats `#`, `##`, `0.00`, `0.00%`, `#,##0`,
/// `#,##0.00` and the date formats `dd/mm/yy`, `dd/mm/yyyy`, `yyyy-mm-dd`,
/// `mm/dd/yy`, `mm/dd/yyyy`. Unknown formats and unparseable values fall
/// through unchanged.
pub fn apply_format_string(value: &str, format: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match format.trim().to_lowercase().as_str() {
        "#" | "##" => coerce_integer(trimmed),
        "0.00" => match trimmed.parse::<f64>() {
            Ok(n) => format!("{n:.2}"),
            Err(_) => trimmed.to_string(),
        },
        "0.00%" => match trimmed.parse::<f64>() {
            Ok(n) => format!("{:.2}%", n * 100.0),
            Err(_) => trimmed.to_string(),
        },
        "#,##0" => match trimmed.parse::<f64>() {
            Ok(n) => group_thousands(&format!("{:.0}", n)),
            Err(_) => trimmed.to_string(),
        },
        "#,##0.00" => match trimmed.parse::<f64>() {
            Ok(n) => {
                let formatted = format!("{n:.2}");
                match formatted.split_once('.') {
                    Some((whole, frac)) => format!("{}.{frac}", group_thousands(whole)),
                    None => group_thousands(&formatted),
                }
            }
            Err(_) => trimmed.to_string(),
        },
        date_format @ ("dd/mm/yy" | "dd/mm/yyyy" | "yyyy-mm-dd" | "mm/dd/yy" | "mm/dd/yyyy") => {
            reformat_date(trimmed, date_format)
        }
        _ => trimmed.to_string(),
    }
}

fn reformat_date(value: &str, format: &str) -> String {
    let strftime = match format {
        "dd/mm/yy" => "%d/%m/%y",
        "dd/mm/yyyy" => "%d/%m/%Y",
        "yyyy-mm-dd" => "%Y-%m-%d",
        "mm/dd/yy" => "%m/%d/%y",
        "mm/dd/yyyy" => "%m/%d/%Y",
        _ => return value.to_string(),
    };
    for fmt in DATE_INPUT_FORMATS {
        if fmt.contains("%H") {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
                return parsed.format(strftime).to_string();
            }
        } else if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return parsed.format(strftime).to_string();
        }
    }
    value.to_string()
}

fn group_thousands(digits: &str) -> String {
    let (sign, magnitude) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let chars: Vec<char> = magnitude.chars().collect();
    let mut grouped = String::with_capacity(magnitude.len() + magnitude.len() / 3);
    for (idx, ch) in chars.iter().enumerate() {
        if idx > 0 && (chars.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    format!("{sign}{grouped}")
}
