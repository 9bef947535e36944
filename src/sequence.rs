//! Grouped and simple sequential number generation.
//!
//! Grouped generation is two-pass by design: [`SequenceGenerator::preprocess`]
//! scans the whole dataset, collects the distinct group keys, sorts them
//! lexicographically and assigns `start, start+1, ...` in that order. Row
//! lookups afterwards only read the table, so every row of a group receives
//! the same number and the assignment does not depend on row iteration order.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, anyhow};
use log::{debug, warn};

use crate::{
    columns::NumericSpec,
    data::{Dataset, RowView},
    resolver,
};

/// Separator for group-key parts.
pub const GROUP_SEPARATOR: &str = "|";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Empty,
    Preprocessed,
    Consumed,
}

/// Zero-padding plus literal prefix/suffix around a generated number.
#[derive(Debug, Clone, Default)]
pub struct NumberFormat {
    pub padding: usize,
    pub prefix: String,
    pub suffix: String,
}

impl NumberFormat {
    pub fn render(&self, number: i64) -> String {
        if self.padding > 0 {
            format!(
                "{}{:0width$}{}",
                self.prefix,
                number,
                self.suffix,
                width = self.padding
            )
        } else {
            format!("{}{}{}", self.prefix, number, self.suffix)
        }
    }
}

#[derive(Debug)]
pub struct SequenceGenerator {
    start: i64,
    grouping_fields: Vec<String>,
    format: NumberFormat,
    state: GeneratorState,
    /// Group counter table: populated only by the pre-pass, read-only after.
    groups: BTreeMap<String, i64>,
    /// Grouping fields resolved against the preprocessed dataset; `None`
    /// entries contribute an empty key part.
    resolved_fields: Vec<Option<String>>,
    simple_next: i64,
}

impl SequenceGenerator {
    pub fn new(spec: &NumericSpec) -> Self {
        SequenceGenerator {
            start: spec.start,
            grouping_fields: spec.grouping_fields.clone(),
            format: NumberFormat {
                padding: spec.padding,
                prefix: spec.prefix.clone(),
                suffix: spec.suffix.clone(),
            },
            state: GeneratorState::Empty,
            groups: BTreeMap::new(),
            resolved_fields: Vec::new(),
            simple_next: spec.start,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn is_grouped(&self) -> bool {
        !self.grouping_fields.is_empty()
    }

    /// Number of distinct groups discovered by the pre-pass.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns the generator to `Empty`, dropping the group table.
    pub fn reset(&mut self) {
        self.state = GeneratorState::Empty;
        self.groups.clear();
        self.resolved_fields.clear();
        self.simple_next = self.start;
    }

    /// Mandatory pre-pass over the full dataset before any row resolution.
    ///
    /// Resolves every grouping field once against the dataset's field names,
    /// builds the group key for each row, and assigns numbers to the distinct
    /// keys in lexicographic order.
    pub fn preprocess(&mut self, dataset: &Dataset) {
        self.reset();
        self.resolved_fields = self
            .grouping_fields
            .iter()
            .map(|logical| {
                let resolved = resolver::resolve_field(logical, dataset.fields());
                if resolved.is_none() {
                    warn!(
                        "Grouping field '{logical}' not found in dataset; \
                         it contributes an empty group-key part"
                    );
                }
                resolved.map(str::to_string)
            })
            .collect();

        if self.is_grouped() {
            let distinct: BTreeSet<String> = dataset
                .iter_rows()
                .map(|row| self.group_key(&row))
                .collect();
            for (offset, key) in distinct.into_iter().enumerate() {
                self.groups.insert(key, self.start + offset as i64);
            }
            debug!(
                "Preprocessed {} distinct group(s) over {:?}",
                self.groups.len(),
                self.grouping_fields
            );
        }
        self.state = GeneratorState::Preprocessed;
    }

    /// Resolves the number for one row.
    ///
    /// Grouped generators only read the table built by [`preprocess`];
    /// ungrouped generators advance a single counter per call.
    pub fn value_for_row(&mut self, row: &RowView<'_>) -> Result<String> {
        if self.state == GeneratorState::Empty {
            if self.is_grouped() {
                return Err(anyhow!(
                    "Grouped sequence requires preprocessing before row resolution"
                ));
            }
            self.state = GeneratorState::Preprocessed;
        }
        self.state = GeneratorState::Consumed;

        if self.is_grouped() {
            let key = self.group_key(row);
            match self.groups.get(&key) {
                Some(number) => Ok(self.format.render(*number)),
                None => {
                    // Only reachable when a row outside the preprocessed
                    // dataset is resolved; keep the pass alive.
                    warn!("Group key '{key}' was not seen during preprocessing");
                    Ok(self.format.render(self.start))
                }
            }
        } else {
            let number = self.simple_next;
            self.simple_next += 1;
            Ok(self.format.render(number))
        }
    }

    fn group_key(&self, row: &RowView<'_>) -> String {
        self.resolved_fields
            .iter()
            .map(|field| match field {
                Some(name) => row.get(name).unwrap_or_default().trim(),
                None => "",
            })
            .collect::<Vec<_>>()
            .join(GROUP_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::NumericSpec;

    fn grouped_spec(fields: &[&str], start: i64) -> NumericSpec {
        NumericSpec {
            start,
            grouping_fields: fields.iter().map(|f| f.to_string()).collect(),
            ..NumericSpec::default()
        }
    }

    fn two_group_dataset() -> Dataset {
        let mut rows = Vec::new();
        for _ in 0..5 {
            rows.push(vec![
                "2025-02-18".to_string(),
                "DECRETO 1072".to_string(),
                "Marco Legal".to_string(),
            ]);
        }
        for _ in 0..4 {
            rows.push(vec![
                "2025-02-21".to_string(),
                "FUNCIONES".to_string(),
                "Sostenibilidad Empresarial".to_string(),
            ]);
        }
        Dataset::new(
            vec![
                "Fecha".to_string(),
                "Tema".to_string(),
                "Módulo".to_string(),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn ungrouped_sequence_counts_up_from_start() {
        let mut generator = SequenceGenerator::new(&NumericSpec {
            start: 10,
            ..NumericSpec::default()
        });
        let dataset = two_group_dataset();
        generator.preprocess(&dataset);
        let values: Vec<String> = dataset
            .iter_rows()
            .take(3)
            .map(|row| generator.value_for_row(&row).unwrap())
            .collect();
        assert_eq!(values, vec!["10", "11", "12"]);
        assert_eq!(generator.state(), GeneratorState::Consumed);
    }

    #[test]
    fn grouped_rows_share_one_number_per_group() {
        let dataset = two_group_dataset();
        let mut generator =
            SequenceGenerator::new(&grouped_spec(&["Fecha", "Tema", "Módulo"], 1));
        generator.preprocess(&dataset);
        assert_eq!(generator.group_count(), 2);

        let values: Vec<String> = dataset
            .iter_rows()
            .map(|row| generator.value_for_row(&row).unwrap())
            .collect();
        let first_group: BTreeSet<&String> = values[..5].iter().collect();
        let second_group: BTreeSet<&String> = values[5..].iter().collect();
        assert_eq!(first_group.len(), 1);
        assert_eq!(second_group.len(), 1);
        assert_ne!(first_group, second_group);
    }

    #[test]
    fn group_numbers_follow_lexicographic_key_order() {
        let dataset = two_group_dataset();
        let mut generator =
            SequenceGenerator::new(&grouped_spec(&["Fecha", "Tema", "Módulo"], 1));
        generator.preprocess(&dataset);
        // "2025-02-18|DECRETO 1072|Marco Legal" sorts first.
        let first = generator.value_for_row(&dataset.row(0).unwrap()).unwrap();
        let second = generator.value_for_row(&dataset.row(5).unwrap()).unwrap();
        assert_eq!(first, "1");
        assert_eq!(second, "2");
    }

    #[test]
    fn assignment_is_independent_of_row_order() {
        let dataset = two_group_dataset();
        let reversed = Dataset::new(
            dataset.fields().to_vec(),
            dataset
                .iter_rows()
                .rev()
                .map(|row| {
                    dataset
                        .fields()
                        .iter()
                        .map(|f| row.get(f).unwrap().to_string())
                        .collect()
                })
                .collect(),
        )
        .unwrap();

        let mut forward =
            SequenceGenerator::new(&grouped_spec(&["Fecha", "Tema", "Módulo"], 1));
        forward.preprocess(&dataset);
        let mut backward =
            SequenceGenerator::new(&grouped_spec(&["Fecha", "Tema", "Módulo"], 1));
        backward.preprocess(&reversed);

        let row = dataset.row(0).unwrap();
        assert_eq!(
            forward.value_for_row(&row).unwrap(),
            backward.value_for_row(&row).unwrap()
        );
    }

    #[test]
    fn grouping_fields_resolve_fuzzily() {
        let dataset = Dataset::new(
            vec!["Fecha (DD/MM/AA)".to_string(), "Nombre programa".to_string()],
            vec![
                vec!["18/02/25".to_string(), "A".to_string()],
                vec!["21/02/25".to_string(), "B".to_string()],
            ],
        )
        .unwrap();
        let mut generator = SequenceGenerator::new(&grouped_spec(&["Fecha", "Tema"], 1));
        generator.preprocess(&dataset);
        assert_eq!(generator.group_count(), 2);
    }

    #[test]
    fn unresolved_grouping_fields_contribute_empty_parts() {
        let dataset = Dataset::new(
            vec!["Cupos".to_string()],
            vec![vec!["1".to_string()], vec!["2".to_string()]],
        )
        .unwrap();
        let mut generator = SequenceGenerator::new(&grouped_spec(&["Zzz Qqq"], 7));
        generator.preprocess(&dataset);
        // Every row collapses into the single empty-keyed group.
        assert_eq!(generator.group_count(), 1);
        let first = generator.value_for_row(&dataset.row(0).unwrap()).unwrap();
        let second = generator.value_for_row(&dataset.row(1).unwrap()).unwrap();
        assert_eq!(first, "7");
        assert_eq!(second, "7");
    }

    #[test]
    fn grouped_lookup_without_preprocess_is_an_error() {
        let dataset = two_group_dataset();
        let mut generator = SequenceGenerator::new(&grouped_spec(&["Fecha"], 1));
        assert!(generator.value_for_row(&dataset.row(0).unwrap()).is_err());
    }

    #[test]
    fn reset_returns_to_empty() {
        let dataset = two_group_dataset();
        let mut generator = SequenceGenerator::new(&grouped_spec(&["Fecha"], 1));
        generator.preprocess(&dataset);
        generator.value_for_row(&dataset.row(0).unwrap()).unwrap();
        assert_eq!(generator.state(), GeneratorState::Consumed);
        generator.reset();
        assert_eq!(generator.state(), GeneratorState::Empty);
        assert_eq!(generator.group_count(), 0);
    }

    #[test]
    fn padding_prefix_and_suffix_wrap_the_number() {
        let mut generator = SequenceGenerator::new(&NumericSpec {
            start: 3,
            padding: 4,
            prefix: "MAT-".to_string(),
            suffix: "-V".to_string(),
            ..NumericSpec::default()
        });
        let dataset = Dataset::new(vec!["a".to_string()], vec![vec!["x".to_string()]]).unwrap();
        generator.preprocess(&dataset);
        let value = generator.value_for_row(&dataset.row(0).unwrap()).unwrap();
        assert_eq!(value, "MAT-0003-V");
    }
}
