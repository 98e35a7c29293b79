use std::fs;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use tracing::info;

use crate::blocks::{blocks_from_geojson, StratumBlock};
use crate::error::Result;

fn read_csv(path: &Path, overrides: Schema) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(Arc::new(overrides)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Reads a raw station CSV. Identifier columns are forced to strings so
/// codes like `"00000"` keep their leading zeros through CSV inference.
pub fn read_stations_csv(path: &Path) -> Result<DataFrame> {
    let overrides = Schema::from_iter([
        Field::new("idestacion".into(), DataType::String),
        Field::new("recaudoestacion".into(), DataType::String),
        Field::new("nombreestacion".into(), DataType::String),
        Field::new("latitud".into(), DataType::Float64),
        Field::new("longitud".into(), DataType::Float64),
    ]);
    let df = read_csv(path, overrides)?;
    info!(rows = df.height(), path = %path.display(), "loaded station table");
    Ok(df)
}

/// Reads a raw transaction CSV. The packed date/time fields and the station
/// reference are forced to strings; everything else keeps its inferred type.
pub fn read_transactions_csv(path: &Path) -> Result<DataFrame> {
    let overrides = Schema::from_iter([
        Field::new("idestacion".into(), DataType::String),
        Field::new("horatransaccion".into(), DataType::String),
        Field::new("fechatransaccion".into(), DataType::String),
    ]);
    let df = read_csv(path, overrides)?;
    info!(rows = df.height(), path = %path.display(), "loaded transaction table");
    Ok(df)
}

/// Loads the stratum block polygon layer from a GeoJSON file.
pub fn read_blocks_geojson(path: &Path) -> Result<Vec<StratumBlock>> {
    let raw = fs::read_to_string(path)?;
    let blocks = blocks_from_geojson(&raw)?;
    info!(blocks = blocks.len(), path = %path.display(), "loaded stratum block layer");
    Ok(blocks)
}

/// Writes a table as parquet when the output path ends in `.parquet`,
/// otherwise as CSV.
pub fn write_table(path: &Path, df: &mut DataFrame) -> Result<()> {
    let file = File::create(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("parquet") => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Zstd(None))
                .with_statistics(StatisticsOptions::full())
                .finish(df)?;
        }
        _ => {
            CsvWriter::new(file).finish(df)?;
        }
    }
    info!(rows = df.height(), path = %path.display(), "wrote output table");
    Ok(())
}
