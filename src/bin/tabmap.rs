//! tabmap: Map NDJSON rows onto a declared record shape
//!
//! Usage:
//!   # Map rows from a file, write records to stdout
//!   tabmap --shape order.json rows.jsonl
//!
//!   # Read rows from stdin, restrict and rename fields
//!   cat rows.jsonl | tabmap --shape order.json --map Id=order_id --map Status=Status
//!
//!   # Treat missing columns as null and keep going past rows that fail to parse or map
//!   tabmap --shape order.json --missing-columns null --skip-errors rows.jsonl

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, BufWriter, Write};
use tabmap::map::RecordWriter;
use tabmap::{load_shape, ColumnMapping, MapConfig, MissingColumn, Row, RowMapper, TableMapper};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MissingPolicy {
    /// Fail the row
    Fail,
    /// Map the field to null
    Null,
}

#[derive(Parser, Debug)]
#[command(name = "tabmap")]
#[command(about = "Map tabular rows onto a declared record shape", long_about = None)]
struct Args {
    /// Input NDJSON rows (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// JSON shape definition
    #[arg(long, short = 's')]
    shape: String,

    /// JSON object of field name to column name; only listed fields are mapped
    #[arg(long)]
    mapping: Option<String>,

    /// Inline column mapping entry, may be repeated
    #[arg(long = "map", value_name = "FIELD=COLUMN")]
    map: Vec<String>,

    /// What to do when a source column is missing from a row
    #[arg(long, value_enum, default_value_t = MissingPolicy::Fail)]
    missing_columns: MissingPolicy,

    /// Match enum member names case-insensitively
    #[arg(long)]
    enum_ignore_case: bool,

    /// Require column names to match field names exactly (no case-insensitive fallback)
    #[arg(long)]
    exact_columns: bool,

    /// Log and skip rows that fail to parse or map instead of aborting
    #[arg(long)]
    skip_errors: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let shape_text = std::fs::read_to_string(&args.shape)
        .with_context(|| format!("Failed to read shape file: {}", args.shape))?;
    let shape = load_shape(&shape_text).context("Failed to load shape")?;

    let mapping = build_mapping(args.mapping.as_deref(), &args.map)?;

    let config = MapConfig {
        missing_column: match args.missing_columns {
            MissingPolicy::Fail => MissingColumn::Fail,
            MissingPolicy::Null => MissingColumn::Null,
        },
        column_ignore_case: !args.exact_columns,
        enum_ignore_case: args.enum_ignore_case,
    };

    let mapper = TableMapper::new(config).row_mapper(&shape, mapping.as_ref());

    let reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open input: {}", file_path))?,
        ))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let stdout = std::io::stdout();
    let mut writer = RecordWriter::new(BufWriter::new(stdout.lock()));
    let skipped = map_lines(reader, &mapper, args.skip_errors, &mut writer)?;

    writer.flush()?;
    info!(
        shape = shape.name(),
        written = writer.written(),
        skipped,
        "done"
    );

    Ok(())
}

/// Map each NDJSON line, returning the number of skipped rows.
///
/// Errors report the 1-based line number in the input, blank lines included.
fn map_lines<R: BufRead, W: Write>(
    reader: R,
    mapper: &RowMapper,
    skip_errors: bool,
    writer: &mut RecordWriter<W>,
) -> Result<usize> {
    let mut skipped = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }

        let mut bytes = line.into_bytes();
        let row: Row = match simd_json::serde::from_slice(&mut bytes) {
            Ok(row) => row,
            Err(e) if skip_errors => {
                warn!(line = line_no, error = %e, "skipping unparseable row");
                skipped += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to parse row on line {}", line_no));
            }
        };

        match mapper.map_row(&row) {
            Ok(record) => writer.write_record(&record)?,
            Err(e) if skip_errors => {
                warn!(line = line_no, error = %e, "skipping row");
                skipped += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to map row on line {}", line_no));
            }
        }
    }

    Ok(skipped)
}

/// Merge the mapping file and inline `FIELD=COLUMN` entries
fn build_mapping(file: Option<&str>, entries: &[String]) -> Result<Option<ColumnMapping>> {
    if file.is_none() && entries.is_empty() {
        return Ok(None);
    }

    let mut mapping = match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read mapping file: {}", path))?;
            serde_json::from_str::<ColumnMapping>(&text).context("Mapping file must be a JSON object of strings")?
        }
        None => ColumnMapping::new(),
    };

    for entry in entries {
        let Some((field, column)) = entry.split_once('=') else {
            bail!("Invalid --map entry '{}', expected FIELD=COLUMN", entry);
        };
        let (field, column) = (field.trim(), column.trim());
        if field.is_empty() || column.is_empty() {
            bail!("Invalid --map entry '{}', expected FIELD=COLUMN", entry);
        }
        mapping.insert(field, column);
    }

    Ok(Some(mapping))
}
