//! The `preview` command: resolve the first N rows and print a table.
//!
//! Previews run through the same pipeline as a full pass, including the
//! grouped-sequence pre-pass over the entire dataset, so the numbers shown
//! match what `resolve` would produce.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, columns, io_utils, pipeline::ResolutionPipeline, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
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

    let mut pipeline = ResolutionPipeline::new(specs, base.as_ref())
        .context("Validating column configuration")?;
    let headers = pipeline.headers();
    let rows = pipeline.resolve_limited(&source, Some(args.rows))?;

    table::print_table(&headers, &rows);
    info!(
        "Previewed {} of {} row(s) from {:?}",
        rows.len(),
        source.len(),
        args.input
    );
    Ok(())
}
