//! Destination-column configuration model, loading, and validation.
//!
//! A column list is loaded from a YAML or JSON file (chosen by extension) and
//! validated once, up front. Validation failures are configuration errors:
//! the only fatal error class in the engine, raised before any row is
//! processed.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Dataset;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No destination columns configured")]
    Empty,
    #[error("Duplicate destination column name '{0}'")]
    DuplicateColumn(String),
    #[error(
        "Column '{0}' is generated but configures no source field, numeric generator, or mapping"
    )]
    MissingSource(String),
    #[error("Column '{column}' configures a mapping but no base dataset was supplied")]
    MissingBaseDataset { column: String },
    #[error("Base dataset has no key field '{field}' required by column '{column}'")]
    MissingKeyField { column: String, field: String },
    #[error("Base dataset has no value field '{field}' required by column '{column}'")]
    MissingValueField { column: String, field: String },
}

/// Configuration for one destination column.
///
/// Dispatch priority when several strategies are configured: numeric
/// generator, then mapping, then pass-through from `source_field`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSpec {
    /// Destination column header.
    pub name: String,
    /// Source dataset field for pass-through columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    /// Marks a column whose value does not come verbatim from the source.
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingSpec>,
    /// Optional output format, e.g. `dd/mm/yy` or `0.00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_string: Option<String>,
}

/// Grouped or simple sequential numbering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NumericSpec {
    #[serde(default = "default_start")]
    pub start: i64,
    /// Logical grouping field names; empty means one plain sequence.
    #[serde(default)]
    pub grouping_fields: Vec<String>,
    /// Zero-pad generated numbers to this width (0 disables padding).
    #[serde(default)]
    pub padding: usize,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

fn default_start() -> i64 {
    1
}

impl Default for NumericSpec {
    fn default() -> Self {
        NumericSpec {
            start: default_start(),
            grouping_fields: Vec::new(),
            padding: 0,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

/// Lookup of a value from the base dataset keyed by a source-field value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingSpec {
    /// Field read from the source dataset.
    pub source_field: String,
    /// Base dataset field matched against the source value.
    pub key_field: String,
    /// Base dataset field supplying the resolved value.
    pub value_field: String,
    /// Extra logical fields disambiguating duplicate keys.
    #[serde(default)]
    pub additional_fields: Vec<String>,
    /// Returned on lookup miss; defaults to echoing the source value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnSpec {
    pub fn pass_through(name: &str, source_field: &str) -> Self {
        ColumnSpec {
            name: name.to_string(),
            source_field: Some(source_field.to_string()),
            is_generated: false,
            numeric: None,
            mapping: None,
            format_string: None,
        }
    }
}

/// Loads column specs from a YAML (default) or JSON file.
pub fn load_specs(path: &Path) -> Result<Vec<ColumnSpec>> {
    let file = File::open(path).with_context(|| format!("Opening column config {path:?}"))?;
    let reader = BufReader::new(file);
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let specs: Vec<ColumnSpec> = if is_json {
        serde_json::from_reader(reader)
            .with_context(|| format!("Parsing JSON column config {path:?}"))?
    } else {
        serde_yaml::from_reader(reader)
            .with_context(|| format!("Parsing YAML column config {path:?}"))?
    };
    Ok(specs)
}

/// Validates a column list against the optionally supplied base dataset.
///
/// This is the single fatal gate: everything past it recovers locally with
/// defaults instead of erroring.
pub fn validate_specs(specs: &[ColumnSpec], base: Option<&Dataset>) -> Result<(), ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::Empty);
    }
    let mut seen = std::collections::HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigError::DuplicateColumn(spec.name.clone()));
        }
        if spec.is_generated
            && spec.source_field.is_none()
            && spec.numeric.is_none()
            && spec.mapping.is_none()
        {
            return Err(ConfigError::MissingSource(spec.name.clone()));
        }
        if let Some(mapping) = &spec.mapping {
            let Some(base) = base else {
                return Err(ConfigError::MissingBaseDataset {
                    column: spec.name.clone(),
                });
            };
            if base.field_index(&mapping.key_field).is_none() {
                return Err(ConfigError::MissingKeyField {
                    column: spec.name.clone(),
                    field: mapping.key_field.clone(),
                });
            }
            if base.field_index(&mapping.value_field).is_none() {
                return Err(ConfigError::MissingValueField {
                    column: spec.name.clone(),
                    field: mapping.value_field.clone(),
                });
            }
        }
    }
    Ok(())
}
