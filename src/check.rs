//! The `check` command: validate a column configuration against the datasets
//! and report how every logical field name resolves.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::CheckArgs,
    columns::{self, ColumnSpec},
    data::Dataset,
    io_utils, resolver, table,
};

pub fn execute(args: &CheckArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let specs = columns::load_specs(&args.config)
        .with_context(|| format!("Loading column config from {:?}", args.config))?;
    let source = io_utils::read_dataset(&args.input, delimiter)
        .with_context(|| format!("Loading source dataset from {:?}", args.input))?;
    let base = match &args.base {
        Some(path) => Some(
            io_utils::read_dataset(path, io_utils::resolve_input_delimiter(path, args.delimiter))
                .with_context(|| format!("Loading base dataset from {path:?}"))?,
        ),
        None => None,
    };

    columns::validate_specs(&specs, base.as_ref()).context("Validating column configuration")?;

    let headers = vec![
        "column".to_string(),
        "strategy".to_string(),
        "field".to_string(),
        "resolves to".to_string(),
    ];
    let mut rows = Vec::new();
    for spec in &specs {
        rows.extend(report_rows(spec, &source, base.as_ref()));
    }
    table::print_table(&headers, &rows);
    info!(
        "Checked {} column(s) against {:?}",
        specs.len(),
        args.input
    );
    Ok(())
}

fn report_rows(spec: &ColumnSpec, source: &Dataset, base: Option<&Dataset>) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    if let Some(numeric) = &spec.numeric {
        if numeric.grouping_fields.is_empty() {
            rows.push(vec![
                spec.name.clone(),
                "numeric".to_string(),
                "(simple sequence)".to_string(),
                format!("start {}", numeric.start),
            ]);
        }
        for field in &numeric.grouping_fields {
            rows.push(vec![
                spec.name.clone(),
                "numeric group".to_string(),
                field.clone(),
                describe(resolver::resolve_field(field, source.fields())),
            ]);
        }
        return rows;
    }
    if let Some(mapping) = &spec.mapping {
        rows.push(vec![
            spec.name.clone(),
            "mapping source".to_string(),
            mapping.source_field.clone(),
            describe(resolver::resolve_field(&mapping.source_field, source.fields())),
        ]);
        for (strategy, field) in [
            ("mapping key", &mapping.key_field),
            ("mapping value", &mapping.value_field),
        ] {
            let resolved = base.and_then(|b| resolver::resolve_field(field, b.fields()));
            rows.push(vec![
                spec.name.clone(),
                strategy.to_string(),
                field.clone(),
                describe(resolved),
            ]);
        }
        for field in &mapping.additional_fields {
            let resolved = base.and_then(|b| resolver::resolve_field(field, b.fields()));
            rows.push(vec![
                spec.name.clone(),
                "mapping key part".to_string(),
                field.clone(),
                describe(resolved),
            ]);
        }
        return rows;
    }
    if let Some(source_field) = &spec.source_field {
        rows.push(vec![
            spec.name.clone(),
            "pass-through".to_string(),
            source_field.clone(),
            describe(resolver::resolve_field(source_field, source.fields())),
        ]);
        return rows;
    }
    rows.push(vec![
        spec.name.clone(),
        "empty".to_string(),
        String::new(),
        "(always blank)".to_string(),
    ]);
    rows
}

fn describe(resolved: Option<&str>) -> String {
    match resolved {
        Some(field) => field.to_string(),
        None => "NOT FOUND".to_string(),
    }
}
