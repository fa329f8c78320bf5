use anyhow::{Context, Result};
use arrow::util::display::array_value_to_string;
use ic3scraper::transform::read_parquet;
use parquet::file::metadata::ColumnChunkMetaData;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs::File, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to a final table.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <PARQUET_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print a final table's metadata, column chunks and rows.
fn inspect(path: &Path) -> Result<()> {
    // 1) File-level metadata
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file)?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== {} ===", path.display());
    println!("Rows:       {}", file_meta.num_rows());
    println!("Row groups: {}", meta.num_row_groups());
    println!("On disk:    {} bytes", std::fs::metadata(path)?.len());
    println!();

    // 2) Column chunks, per row group
    for rg_idx in 0..meta.num_row_groups() {
        let rg = meta.row_group(rg_idx);
        println!("--- Row group {} ({} rows) ---", rg_idx, rg.num_rows());
        for col_idx in 0..rg.num_columns() {
            print_column_chunk(rg.column(col_idx));
        }
    }
    println!();

    // 3) Rows, tab separated
    for batch in read_parquet(path)? {
        let schema = batch.schema();
        let header: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        println!("{}", header.join("\t"));
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| array_value_to_string(col, row))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            println!("{}", cells.join("\t"));
        }
    }
    Ok(())
}

fn print_column_chunk(col_md: &ColumnChunkMetaData) {
    let descr = col_md.column_descr();
    let logical = descr
        .logical_type()
        .as_ref()
        .map_or("<none>".into(), |lt| format!("{:?}", lt));
    println!(
        "  {:<24} | {:?} / {} | {:?} | {} values | {} bytes",
        descr.name(),
        descr.physical_type(),
        logical,
        col_md.compression(),
        col_md.num_values(),
        col_md.compressed_size()
    );
}
