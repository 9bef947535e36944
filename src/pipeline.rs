//! Value resolution pipeline: per destination column, per row, dispatch to a
//! numeric generator, a mapping table, or a pass-through read.
//!
//! The pipeline owns every mapping table, sequence generator, and the
//! resolution cache for the duration of one pass. Configuration problems are
//! fatal and surface from [`ResolutionPipeline::new`], before any row is
//! touched; once a pass starts, individual row faults are logged and
//! substituted, never aborting the batch.

use anyhow::Result;
use log::{info, warn};

use crate::{
    columns::{self, ColumnSpec},
    data::{self, Dataset, RowView},
    mapping::{MappingTable, ResolutionCache},
    resolver,
    sequence::SequenceGenerator,
    similarity::{DiffRatioScorer, SimilarityScorer},
};

/// Rows are processed in fixed-size batches purely to bound memory; nothing
/// is interleaved between batches.
pub const BATCH_SIZE: usize = 1000;

pub struct ResolutionPipeline {
    specs: Vec<ColumnSpec>,
    /// One slot per spec; `Some` where the spec configures a mapping.
    tables: Vec<Option<MappingTable>>,
    /// One slot per spec; `Some` where the spec configures a generator.
    generators: Vec<Option<SequenceGenerator>>,
    cache: ResolutionCache,
    scorer: Box<dyn SimilarityScorer>,
}

impl std::fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPipeline")
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

impl ResolutionPipeline {
    /// Validates the configuration and builds all mapping tables.
    ///
    /// Every fatal error the engine can raise comes out of here; `resolve`
    /// afterwards only degrades locally.
    pub fn new(specs: Vec<ColumnSpec>, base: Option<&Dataset>) -> Result<Self> {
        Self::with_scorer(specs, base, Box::new(DiffRatioScorer))
    }

    /// [`ResolutionPipeline::new`] with a custom similarity scorer for the
    /// fuzzy mapping-key tier.
    pub fn with_scorer(
        specs: Vec<ColumnSpec>,
        base: Option<&Dataset>,
        scorer: Box<dyn SimilarityScorer>,
    ) -> Result<Self> {
        columns::validate_specs(&specs, base)?;

        let mut tables = Vec::with_capacity(specs.len());
        let mut generators = Vec::with_capacity(specs.len());
        for spec in &specs {
            let generator = spec.numeric.as_ref().map(SequenceGenerator::new);
            // Numeric takes dispatch priority; only build the table when the
            // mapping can actually be consulted.
            let table = match (&spec.numeric, &spec.mapping) {
                (None, Some(mapping)) => {
                    let base = base.expect("validated above");
                    let table = MappingTable::build(base, mapping, &spec.name)?;
                    info!(
                        "Built mapping table '{}' with {} entry(ies) for column '{}'",
                        table.id(),
                        table.len(),
                        spec.name
                    );
                    Some(table)
                }
                _ => None,
            };
            generators.push(generator);
            tables.push(table);
        }

        Ok(ResolutionPipeline {
            specs,
            tables,
            generators,
            cache: ResolutionCache::new(),
            scorer,
        })
    }

    /// Destination column headers in configured order.
    pub fn headers(&self) -> Vec<String> {
        self.specs.iter().map(|spec| spec.name.clone()).collect()
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    /// Resolves the whole dataset to one output row per source row.
    ///
    /// Clears the cache and re-runs every generator pre-pass first, so a
    /// pipeline can be reused across passes without carrying state over.
    pub fn resolve(&mut self, dataset: &Dataset) -> Result<Vec<Vec<String>>> {
        self.resolve_limited(dataset, None)
    }

    /// [`resolve`](Self::resolve) capped at `limit` output rows. The grouped
    /// generator pre-pass always covers the full dataset so previews assign
    /// the same numbers a full pass would.
    pub fn resolve_limited(
        &mut self,
        dataset: &Dataset,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<String>>> {
        self.cache.clear();
        for generator in self.generators.iter_mut().flatten() {
            generator.preprocess(dataset);
        }

        let total = limit.map_or(dataset.len(), |cap| cap.min(dataset.len()));
        let mut output = Vec::with_capacity(total);
        let mut processed = 0usize;
        while processed < total {
            let batch_end = (processed + BATCH_SIZE).min(total);
            for idx in processed..batch_end {
                let row = dataset
                    .row(idx)
                    .expect("row index bounded by dataset length");
                output.push(self.resolve_row(&row));
            }
            processed = batch_end;
        }
        info!(
            "Resolved {} row(s) across {} column(s)",
            output.len(),
            self.specs.len()
        );
        Ok(output)
    }

    fn resolve_row(&mut self, row: &RowView<'_>) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.specs.len());
        for idx in 0..self.specs.len() {
            let value = match self.resolve_cell(idx, row) {
                Ok(value) => value,
                Err(err) => {
                    // Per-row faults never abort the batch.
                    warn!(
                        "Resolution fault in column '{}': {err:#}; substituting default",
                        self.specs[idx].name
                    );
                    self.specs[idx]
                        .mapping
                        .as_ref()
                        .and_then(|m| m.default.clone())
                        .unwrap_or_default()
                }
            };
            let formatted = match &self.specs[idx].format_string {
                Some(format) => data::apply_format_string(&value, format),
                None => value,
            };
            cells.push(formatted);
        }
        cells
    }

    /// Strategy dispatch for one cell, in priority order: numeric generator,
    /// mapping, pass-through, empty string.
    fn resolve_cell(&mut self, idx: usize, row: &RowView<'_>) -> Result<String> {
        if let Some(generator) = self.generators[idx].as_mut() {
            return generator.value_for_row(row);
        }
        if let Some(table) = &self.tables[idx] {
            return Ok(table.resolve_value(row, self.scorer.as_ref(), &mut self.cache));
        }
        if let Some(source_field) = &self.specs[idx].source_field {
            let value = match row.get(source_field) {
                Some(value) => Some(value),
                None => resolver::resolve_field(source_field, row.fields())
                    .and_then(|found| row.get(found)),
            };
            return Ok(value.unwrap_or_default().to_string());
        }
        Ok(String::new())
    }
}
