//! The `resolve` command: run a full resolution pass and write CSV.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ResolveArgs, columns, io_utils, pipeline::ResolutionPipeline};

pub fn execute(args: &ResolveArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let output_delimiter = io_utils::resolve_output_delimiter(
        args.output.as_deref(),
        args.output_delimiter,
        delimiter,
    );

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
    info!(
        "Resolving '{}' ({} row(s)) with {} configured column(s)",
        args.input.display(),
        source.len(),
        specs.len()
    );

    let mut pipeline = ResolutionPipeline::new(specs, base.as_ref())
        .context("Validating column configuration")?;
    let headers = pipeline.headers();
    let rows = pipeline.resolve_limited(&source, args.limit)?;

    io_utils::write_rows(args.output.as_deref(), output_delimiter, &headers, &rows)?;
    info!(
        "Wrote {} resolved row(s) to {}",
        rows.len(),
        args.output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into())
    );
    Ok(())
}
