//! Mapping table construction and application.
//!
//! A [`MappingTable`] is built once from the base dataset and then applied,
//! read-only, to every source row. Lookups go through four tiers (exact,
//! case-insensitive, whitespace-trimmed, fuzzy) and misses resolve to a
//! default instead of erroring. Results are memoized in a
//! [`ResolutionCache`] scoped to one resolution pass.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    columns::{ConfigError, MappingSpec},
    data::{self, Dataset, RowView},
    resolver,
    similarity::{KEY_MATCH_THRESHOLD, SimilarityScorer},
};

/// Separator for composite-key parts.
pub const KEY_SEPARATOR: &str = "|";
/// Keys at or below this length never fuzzy-match; short codes collide too
/// easily on diff ratio.
const MIN_FUZZY_KEY_LEN: usize = 4;

/// Immutable lookup table keyed by composite key.
#[derive(Debug, Clone)]
pub struct MappingTable {
    id: String,
    source_field: String,
    additional_fields: Vec<String>,
    default: Option<String>,
    entries: HashMap<String, String>,
    /// Composite keys in first-insertion order. The fallback tiers scan this
    /// list so a tie within a tier always resolves to the earliest base row.
    key_order: Vec<String>,
}

impl MappingTable {
    /// Builds the table from the base dataset.
    ///
    /// Key and value fields must exist in the base dataset (fatal
    /// [`ConfigError`] otherwise, matching the pre-pass validation).
    /// Additional logical fields are resolved against the base's field names;
    /// ones that fail to resolve are pruned from the table with a warning so
    /// that build and apply always agree on key arity.
    pub fn build(base: &Dataset, spec: &MappingSpec, column: &str) -> Result<Self, ConfigError> {
        let key_idx =
            base.field_index(&spec.key_field)
                .ok_or_else(|| ConfigError::MissingKeyField {
                    column: column.to_string(),
                    field: spec.key_field.clone(),
                })?;
        let value_idx =
            base.field_index(&spec.value_field)
                .ok_or_else(|| ConfigError::MissingValueField {
                    column: column.to_string(),
                    field: spec.value_field.clone(),
                })?;

        let mut additional_fields = Vec::with_capacity(spec.additional_fields.len());
        for logical in &spec.additional_fields {
            match resolver::resolve_field(logical, base.fields()) {
                Some(found) => additional_fields.push(found.to_string()),
                None => warn!(
                    "Additional mapping field '{logical}' not found in base dataset; \
                     dropping it from the composite key for column '{column}'"
                ),
            }
        }

        let date_value = data::is_date_field(&spec.value_field);
        let integer_value = data::is_integer_field(&spec.value_field);

        let mut entries = HashMap::new();
        let mut key_order = Vec::new();
        let mut overwrites = 0usize;
        for row in base.iter_rows() {
            let key = row.get_index(key_idx).unwrap_or_default().trim();
            if key.is_empty() {
                continue;
            }
            let mut parts = vec![key.to_string()];
            for field in &additional_fields {
                parts.push(row.get(field).unwrap_or_default().trim().to_string());
            }
            let composite = parts.join(KEY_SEPARATOR);

            let raw_value = row.get_index(value_idx).unwrap_or_default();
            let value = if integer_value {
                data::coerce_integer(raw_value)
            } else if date_value {
                data::normalize_date_value(raw_value)
            } else {
                raw_value.to_string()
            };

            // Last write wins on duplicate keys; the key keeps its original
            // position and the overwrite count surfaces base-data quality
            // issues without failing the build.
            if entries.insert(composite.clone(), value).is_some() {
                overwrites += 1;
            } else {
                key_order.push(composite);
            }
        }
        if overwrites > 0 {
            debug!(
                "Mapping '{}' -> '{}' overwrote {overwrites} duplicate composite key(s)",
                spec.key_field, spec.value_field
            );
        }

        Ok(MappingTable {
            id: format!(
                "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
                spec.source_field, spec.key_field, spec.value_field
            ),
            source_field: spec.source_field.clone(),
            additional_fields,
            default: spec.default.clone(),
            entries,
            key_order,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_field(&self) -> &str {
        &self.source_field
    }

    /// Additional base fields that actually resolved during the build.
    pub fn additional_fields(&self) -> &[String] {
        &self.additional_fields
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves one source row to a mapped value.
    ///
    /// The source value is trimmed and, for date-like source fields,
    /// normalized to `dd/mm/yy` before the composite search key is built.
    /// A lookup miss returns the configured default, falling back to the
    /// normalized source value itself.
    pub fn resolve_value(
        &self,
        row: &RowView<'_>,
        scorer: &dyn SimilarityScorer,
        cache: &mut ResolutionCache,
    ) -> String {
        let raw = match row.get(&self.source_field) {
            Some(value) => value,
            None => match resolver::resolve_field(&self.source_field, row.fields()) {
                Some(found) => row.get(found).unwrap_or_default(),
                None => return self.default.clone().unwrap_or_default(),
            },
        };
        let mut source_value = raw.trim().to_string();
        if data::is_date_field(&self.source_field) {
            source_value = data::normalize_date_value(&source_value);
        }

        let search_key = self.build_search_key(&source_value, row);
        if let Some(hit) = cache.get(&self.id, &search_key) {
            return hit.to_string();
        }

        let resolved = self
            .lookup(&search_key, scorer)
            .map(str::to_string)
            .unwrap_or_else(|| self.default.clone().unwrap_or(source_value));
        cache.insert(&self.id, &search_key, &resolved);
        resolved
    }

    /// Builds the search key exactly like the build pass: trimmed source
    /// value plus the table's recorded additional fields. A recorded field
    /// that does not resolve against the source row contributes an empty
    /// string so key arity stays aligned with the base side.
    fn build_search_key(&self, source_value: &str, row: &RowView<'_>) -> String {
        if self.additional_fields.is_empty() {
            return source_value.to_string();
        }
        let mut parts = vec![source_value.to_string()];
        for field in &self.additional_fields {
            let value = match row.get(field) {
                Some(value) => value,
                None => resolver::resolve_field(field, row.fields())
                    .and_then(|found| row.get(found))
                    .unwrap_or_default(),
            };
            parts.push(value.trim().to_string());
        }
        parts.join(KEY_SEPARATOR)
    }

    /// Keys and values in first-insertion order.
    fn iter_ordered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.key_order
            .iter()
            .map(|key| (key.as_str(), self.entries[key.as_str()].as_str()))
    }

    /// Four lookup tiers, first hit wins. Within a tier, ties resolve to the
    /// earliest-inserted base row.
    fn lookup(&self, search_key: &str, scorer: &dyn SimilarityScorer) -> Option<&str> {
        if let Some(value) = self.entries.get(search_key) {
            return Some(value);
        }

        let search_lower = search_key.trim().to_lowercase();
        if let Some(value) = self
            .iter_ordered()
            .find(|(key, _)| key.trim().to_lowercase() == search_lower)
            .map(|(_, value)| value)
        {
            return Some(value);
        }

        let search_trimmed = search_key.trim();
        if let Some(value) = self
            .iter_ordered()
            .find(|(key, _)| key.trim() == search_trimmed)
            .map(|(_, value)| value)
        {
            return Some(value);
        }

        if search_trimmed.len() >= MIN_FUZZY_KEY_LEN {
            for (key, value) in self.iter_ordered() {
                if key.trim().len() >= MIN_FUZZY_KEY_LEN
                    && scorer.score(key.trim(), search_trimmed) > KEY_MATCH_THRESHOLD
                {
                    return Some(value);
                }
            }
        }
        None
    }
}

/// Applies a mapping table to every row of the source dataset.
pub fn apply(
    table: &MappingTable,
    source: &Dataset,
    scorer: &dyn SimilarityScorer,
    cache: &mut ResolutionCache,
) -> Vec<String> {
    source
        .iter_rows()
        .map(|row| table.resolve_value(&row, scorer, cache))
        .collect()
}

/// Memoization of `(mapping id, search key) -> resolved value` for one
/// resolution pass. Cleared explicitly before each pass and on configuration
/// change; never carried across unrelated passes.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<(String, String), String>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mapping_id: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&(mapping_id.to_string(), key.to_string()))
            .map(String::as_str)
    }

    pub fn insert(&mut self, mapping_id: &str, key: &str, value: &str) {
        self.entries
            .insert((mapping_id.to_string(), key.to_string()), value.to_string());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
