use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

use super::params;
use crate::command::dedup::constants::DEDUP_BARCODE_COLUMN;
use crate::fileformat::{write_tsv, RawTileTable, TILE_TABLE_HEADER};
use crate::runtime::{Error, Result};

///////////////////////////////
/// Where a row came from
#[derive(Debug, Clone)]
pub struct TableSource {
    /// File name of the input table, reused for its output
    pub name: String,
    pub headers: csv::StringRecord,
    barcode_column: usize,
}

#[derive(Debug, Clone)]
struct TaggedRow {
    source: usize,
    row: csv::StringRecord,
}

///////////////////////////////
/// Every row of every tile table of one sample, each tagged with its table
#[derive(Debug, Clone, Default)]
pub struct SampleBarcodeUniverse {
    sources: Vec<TableSource>,
    rows: Vec<TaggedRow>,
}

impl SampleBarcodeUniverse {
    /// Load all tables of a sample. Every table must have the tile table columns.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut universe = SampleBarcodeUniverse::default();
        for path in paths {
            let table = RawTileTable::load(path, &TILE_TABLE_HEADER)?;
            debug!("Loaded {} row(s) from {}", table.rows.len(), path.display());
            universe.add_table(table)?;
        }
        Ok(universe)
    }

    pub fn add_table(&mut self, table: RawTileTable) -> Result<()> {
        let name = table.file_name()?;
        if self.sources.iter().any(|s| s.name == name) {
            return Err(Error::DuplicateTableName { name });
        }
        let barcode_column = table
            .column_index(DEDUP_BARCODE_COLUMN)
            .ok_or_else(|| Error::schema(&table.path, vec![DEDUP_BARCODE_COLUMN.to_string()]))?;

        let source = self.sources.len();
        self.sources.push(TableSource {
            name,
            headers: table.headers,
            barcode_column,
        });
        self.rows
            .extend(table.rows.into_iter().map(|row| TaggedRow { source, row }));
        Ok(())
    }

    pub fn sources(&self) -> &[TableSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn barcode<'a>(&self, row: &'a TaggedRow) -> &'a str {
        row.row
            .get(self.sources[row.source].barcode_column)
            .unwrap_or_default()
    }

    /// Number of rows carrying each barcode, over all tables
    pub fn barcode_counts(&self) -> FxHashMap<&str, u32> {
        let mut counts: FxHashMap<&str, u32> = FxHashMap::default();
        for row in &self.rows {
            *counts.entry(self.barcode(row)).or_insert(0) += 1;
        }
        counts
    }

    /// Barcodes seen on more than one row anywhere in the sample
    pub fn duplicated_barcodes(&self) -> FxHashSet<&str> {
        self.barcode_counts()
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(barcode, _)| barcode)
            .collect()
    }

    /// Rows whose barcode is unique in the whole sample, grouped back by table in
    /// input order. Tables left without rows are not part of the result.
    pub fn unique_rows_by_table(&self) -> Vec<(&TableSource, Vec<&csv::StringRecord>)> {
        let duplicated = self.duplicated_barcodes();

        let mut grouped: Vec<Vec<&csv::StringRecord>> = vec![Vec::new(); self.sources.len()];
        for row in &self.rows {
            if !duplicated.contains(self.barcode(row)) {
                grouped[row.source].push(&row.row);
            }
        }

        self.sources
            .iter()
            .zip(grouped)
            .filter(|(_, rows)| !rows.is_empty())
            .collect()
    }
}

///////////////////////////////
/// What a deduplication run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupSummary {
    pub rows_loaded: usize,
    pub distinct_barcodes: usize,
    pub duplicated_barcodes: usize,
    pub rows_removed: usize,
    pub tables_written: usize,
    /// Tables that lost every row and were not written
    pub tables_emptied: Vec<String>,
}

/// The output directory must not exist yet or be an empty directory
pub fn check_output_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(Error::file_not_valid(path, Some("output path is not a directory")));
    }
    if std::fs::read_dir(path)?.next().is_some() {
        return Err(Error::non_empty_output_directory(path));
    }
    Ok(())
}

pub struct SampleDeduplicator {}
impl SampleDeduplicator {
    /// Remove every barcode occurring more than once across the sample's tables and
    /// write the remaining rows, one file per input table, to `params_io.path_out`
    pub fn run(params_io: &params::IO) -> Result<DedupSummary> {
        check_output_directory(&params_io.path_out)?;

        let universe = SampleBarcodeUniverse::load(&params_io.paths_in)?;
        info!(
            "Loaded {} row(s) from {} table(s)",
            universe.len(),
            universe.sources().len()
        );

        let summary = Self::write_unique(&universe, &params_io.path_out)?;
        info!(
            "Removed {} row(s) carrying {} duplicated barcode(s), wrote {} table(s)",
            summary.rows_removed, summary.duplicated_barcodes, summary.tables_written
        );
        Ok(summary)
    }

    pub fn write_unique(universe: &SampleBarcodeUniverse, out_dir: &Path) -> Result<DedupSummary> {
        let counts = universe.barcode_counts();
        let duplicated_barcodes = counts.values().filter(|&&count| count > 1).count();
        let distinct_barcodes = counts.len();

        let filtered = universe.unique_rows_by_table();
        let rows_kept: usize = filtered.iter().map(|(_, rows)| rows.len()).sum();

        std::fs::create_dir_all(out_dir)?;
        for (source, rows) in &filtered {
            let path = out_dir.join(&source.name);
            write_tsv(&path, &source.headers, rows.iter().copied())?;
            debug!("Wrote {} row(s) to {}", rows.len(), path.display());
        }

        let tables_emptied: Vec<String> = universe
            .sources()
            .iter()
            .filter(|s| !filtered.iter().any(|(kept, _)| kept.name == s.name))
            .map(|s| s.name.clone())
            .collect();
        for name in &tables_emptied {
            warn!("Every barcode of {} is duplicated in the sample, no output written", name);
        }

        Ok(DedupSummary {
            rows_loaded: universe.len(),
            distinct_barcodes,
            duplicated_barcodes,
            rows_removed: universe.len() - rows_kept,
            tables_written: filtered.len(),
            tables_emptied,
        })
    }
}
