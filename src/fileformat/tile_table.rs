use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::runtime::{Error, Result};

pub const COLUMN_CELL_BC: &str = "cell_bc";
pub const COLUMN_XCOORD: &str = "xcoord";
pub const COLUMN_YCOORD: &str = "ycoord";

/// Header of a tile barcode table, in column order
pub const TILE_TABLE_HEADER: [&str; 3] = [COLUMN_CELL_BC, COLUMN_XCOORD, COLUMN_YCOORD];

///////////////////////////////
/// One barcode occurrence on a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRow {
    pub cell_bc: String,
    pub xcoord: u32,
    pub ycoord: u32,
}

impl TileRow {
    pub fn new<S: Into<String>>(cell_bc: S, xcoord: u32, ycoord: u32) -> Self {
        TileRow {
            cell_bc: cell_bc.into(),
            xcoord,
            ycoord,
        }
    }
}

fn tsv_writer<W: std::io::Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| {
        Error::file_not_valid(path, Some(format!("could not open table: {}", e)))
    })?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(file))
}

///////////////////////////////
/// Append rows to a tile table. The header is written only when this call creates
/// the file. The file is closed before returning.
///
/// Returns whether the file was newly created.
pub fn append_tile_rows(path: &Path, rows: &[TileRow]) -> Result<bool> {
    let (file, created) = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => (file, true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            (OpenOptions::new().append(true).open(path)?, false)
        }
        Err(e) => return Err(e.into()),
    };

    let mut writer = tsv_writer(BufWriter::new(file));
    if created {
        writer.write_record(TILE_TABLE_HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(created)
}

///////////////////////////////
/// Read a complete tile table into typed rows
pub fn read_tile_rows(path: &Path) -> Result<Vec<TileRow>> {
    let mut reader = tsv_reader(path)?;
    check_columns(path, reader.headers()?, &TILE_TABLE_HEADER)?;

    let mut rows = Vec::new();
    for row in reader.deserialize::<TileRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Fail with a schema error listing every `required` column absent from `headers`
pub fn check_columns(path: &Path, headers: &csv::StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::schema(path, missing))
    }
}

///////////////////////////////
/// A tile table loaded verbatim: header and rows as text, so that extra columns
/// and number formatting survive a rewrite
#[derive(Debug, Clone)]
pub struct RawTileTable {
    pub path: PathBuf,
    pub headers: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

impl RawTileTable {
    /// Load a table, requiring the given columns to be present
    pub fn load(path: &Path, required: &[&str]) -> Result<Self> {
        let mut reader = tsv_reader(path)?;
        let headers = reader.headers()?.clone();
        check_columns(path, &headers, required)?;

        let mut rows = Vec::new();
        for row in reader.records() {
            rows.push(row?);
        }
        Ok(RawTileTable {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// File name of the table, used to name its output
    pub fn file_name(&self) -> Result<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::file_not_valid(&self.path, Some("path has no file name")))
    }
}

/// Write a header and rows to a new tab separated file, replacing any existing file
pub fn write_tsv<'a, I>(path: &Path, headers: &csv::StringRecord, rows: I) -> Result<()>
where
    I: IntoIterator<Item = &'a csv::StringRecord>,
{
    let mut writer = tsv_writer(BufWriter::new(File::create(path)?));
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
