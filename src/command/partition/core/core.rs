use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::params;
use super::state::{Flush, PartitionState, TileRunBatch, WrittenFileRegistry};
use crate::barcode::{SequencePreprocessor, SequenceTransformer};
use crate::command::partition::constants::PARTITION_PROGRESS_INTERVAL;
use crate::fileformat::{append_tile_rows, SequencingRecord, TileFastqReader, TileKey, TileRow};
use crate::runtime::{Error, Result};

///////////////////////////////
/// Destination of finished runs
pub trait TileSink {
    fn append(&mut self, key: TileKey, batch: &TileRunBatch) -> Result<()>;
}

///////////////////////////////
/// How a tile maps onto an output file name.
///
/// By default only the tile number is used, so two lanes sharing a tile number
/// end up in the same table. Set `lane_in_filename` to keep them apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileFileNaming {
    pub prefix: String,
    pub suffix: String,
    pub lane_in_filename: bool,
}

impl TileFileNaming {
    pub fn file_name(&self, key: TileKey) -> String {
        if self.lane_in_filename {
            format!("{}{}_{}{}", self.prefix, key.lane, key.tile, self.suffix)
        } else {
            format!("{}{}{}", self.prefix, key.tile, self.suffix)
        }
    }
}

///////////////////////////////
/// Appends runs to per-tile tables in one output directory, refusing to touch
/// tables this invocation did not create
pub struct TableWriter {
    out_dir: PathBuf,
    naming: TileFileNaming,
    registry: WrittenFileRegistry,
}

impl TableWriter {
    pub fn new<P: Into<PathBuf>>(
        out_dir: P,
        naming: TileFileNaming,
        registry: WrittenFileRegistry,
    ) -> Self {
        TableWriter {
            out_dir: out_dir.into(),
            naming,
            registry,
        }
    }

    pub fn path_for(&self, key: TileKey) -> PathBuf {
        self.out_dir.join(self.naming.file_name(key))
    }

    pub fn registry(&self) -> &WrittenFileRegistry {
        &self.registry
    }
}

impl TileSink for TableWriter {
    fn append(&mut self, key: TileKey, batch: &TileRunBatch) -> Result<()> {
        let path = self.path_for(key);
        if !self.registry.contains(&path) && path.exists() {
            return Err(Error::conflicting_output(&path));
        }

        let created = append_tile_rows(&path, batch.rows())?;
        debug!(
            "Flushed {} row(s) of {} to {}{}",
            batch.len(),
            key,
            path.display(),
            if created { " (new table)" } else { "" }
        );
        self.registry.insert(path);
        Ok(())
    }
}

///////////////////////////////
/// What a partitioning run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSummary {
    pub records: u64,
    pub flushes: u64,
    pub rows_per_tile: BTreeMap<TileKey, u64>,
}

///////////////////////////////
/// Groups a record stream into runs of the same tile and hands each finished
/// run to a sink
pub struct TilePartitioner<S: TileSink> {
    sink: S,
    state: PartitionState,
    summary: PartitionSummary,
}

impl<S: TileSink> TilePartitioner<S> {
    pub fn new(sink: S) -> Self {
        TilePartitioner {
            sink,
            state: PartitionState::NoActiveRun,
            summary: PartitionSummary::default(),
        }
    }

    pub fn state(&self) -> &PartitionState {
        &self.state
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn push(&mut self, key: TileKey, row: TileRow) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let Some((state, flush)) = state.on_record(key, row) else {
            self.state = PartitionState::Done;
            return Err(Error::parse_error::<_, String>(
                "record stream: record received after the end of the stream",
                None,
            ));
        };
        self.state = state;
        self.summary.records += 1;

        match flush {
            Some(flush) => self.flush(flush),
            None => Ok(()),
        }
    }

    /// Flush the last run. Afterwards the partitioner is `Done`.
    pub fn finish(&mut self) -> Result<PartitionSummary> {
        let (state, flush) = std::mem::take(&mut self.state).on_end_of_stream();
        self.state = state;
        if let Some(flush) = flush {
            self.flush(flush)?;
        }
        Ok(self.summary.clone())
    }

    fn flush(&mut self, flush: Flush) -> Result<()> {
        self.sink.append(flush.key, &flush.batch)?;
        self.summary.flushes += 1;
        *self.summary.rows_per_tile.entry(flush.key).or_insert(0) += flush.batch.len() as u64;
        Ok(())
    }
}

///////////////////////////////
/// Transform every record's sequence and partition the stream into `sink`
pub fn partition_records<I, P, S>(
    records: I,
    preprocessor: &P,
    sink: S,
    progress_interval: u64,
) -> Result<(PartitionSummary, S)>
where
    I: IntoIterator<Item = Result<SequencingRecord>>,
    P: SequencePreprocessor,
    S: TileSink,
{
    let mut partitioner = TilePartitioner::new(sink);
    let mut n_records: u64 = 0;

    for record in records {
        let record = record?;
        let barcode = preprocessor.preprocess(&record.sequence);
        partitioner.push(record.key, TileRow::new(barcode, record.x, record.y))?;

        n_records += 1;
        if progress_interval > 0 && n_records % progress_interval == 0 {
            info!("Processed {} records", n_records);
        }
    }

    let summary = partitioner.finish()?;
    Ok((summary, partitioner.into_sink()))
}

pub struct TilePartitionProcessor {}
impl TilePartitionProcessor {
    /// Split one FASTQ file into per-tile barcode tables under `params_io.path_out`
    pub fn run(params_io: &params::IO, params_runtime: &params::Runtime) -> Result<PartitionSummary> {
        ensure_out_dir(&params_io.path_out)?;

        let reader = TileFastqReader::open(&params_io.path_in)?;
        let transformer =
            SequenceTransformer::new(params_runtime.crop_seq, params_runtime.rev_comp);
        let naming = TileFileNaming {
            prefix: params_runtime.out_prefix.clone(),
            suffix: params_runtime.out_suffix.clone(),
            lane_in_filename: params_runtime.lane_in_filename,
        };
        let writer = TableWriter::new(&params_io.path_out, naming, WrittenFileRegistry::new());

        let (summary, writer) =
            partition_records(reader, &transformer, writer, PARTITION_PROGRESS_INTERVAL)?;

        if summary.records == 0 {
            if !params_runtime.allow_empty {
                return Err(Error::empty_input(&params_io.path_in));
            }
            info!("{} contains no records, nothing written", params_io.path_in.display());
        }

        info!(
            "Partitioned {} records into {} table(s) with {} flush(es)",
            summary.records,
            writer.registry().len(),
            summary.flushes
        );
        for path in writer.registry().paths() {
            debug!("Wrote {}", path.display());
        }
        Ok(summary)
    }
}

fn ensure_out_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(Error::file_not_valid(path, Some("output path is not a directory")));
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::CropRange;

    #[derive(Default)]
    struct MemorySink {
        flushes: Vec<(TileKey, Vec<TileRow>)>,
    }

    impl TileSink for MemorySink {
        fn append(&mut self, key: TileKey, batch: &TileRunBatch) -> Result<()> {
            self.flushes.push((key, batch.rows().to_vec()));
            Ok(())
        }
    }

    fn record(lane: u32, tile: u32, x: u32, seq: &str) -> Result<SequencingRecord> {
        Ok(SequencingRecord {
            key: TileKey::new(lane, tile),
            x,
            y: x + 1,
            sequence: seq.to_string(),
        })
    }

    fn identity(raw: &str) -> String {
        raw.to_string()
    }

    #[test]
    fn test_reopened_run_is_flushed_twice() {
        let records = vec![
            record(1, 100, 1, "b1"),
            record(1, 100, 2, "b2"),
            record(1, 101, 3, "b3"),
            record(1, 100, 4, "b4"),
            record(1, 100, 5, "b5"),
        ];
        let (summary, sink) =
            partition_records(records, &identity, MemorySink::default(), 0).unwrap();

        let keys: Vec<TileKey> = sink.flushes.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![TileKey::new(1, 100), TileKey::new(1, 101), TileKey::new(1, 100)]
        );
        assert_eq!(sink.flushes[0].1, vec![TileRow::new("b1", 1, 2), TileRow::new("b2", 2, 3)]);
        assert_eq!(sink.flushes[2].1, vec![TileRow::new("b4", 4, 5), TileRow::new("b5", 5, 6)]);

        assert_eq!(summary.records, 5);
        assert_eq!(summary.flushes, 3);
        assert_eq!(summary.rows_per_tile[&TileKey::new(1, 100)], 4);
        assert_eq!(summary.rows_per_tile[&TileKey::new(1, 101)], 1);
    }

    #[test]
    fn test_barcodes_are_transformed() {
        let transformer = SequenceTransformer::new("::".parse::<CropRange>().unwrap(), true);
        let records = vec![record(1, 7, 0, " AACG\n")];
        let (_, sink) =
            partition_records(records, &transformer, MemorySink::default(), 0).unwrap();
        assert_eq!(sink.flushes[0].1[0].cell_bc, "CGTT");
    }

    #[test]
    fn test_error_stops_partitioning() {
        let records = vec![
            record(1, 100, 1, "b1"),
            Err(Error::malformed_record("in.fq", 5, Some("bad"))),
            record(1, 101, 3, "b3"),
        ];
        let result = partition_records(records, &identity, MemorySink::default(), 0);
        assert!(matches!(result, Err(Error::MalformedRecord { .. })));
    }

    #[test]
    fn test_partitioner_states() {
        let mut partitioner = TilePartitioner::new(MemorySink::default());
        assert_eq!(partitioner.state(), &PartitionState::NoActiveRun);

        partitioner.push(TileKey::new(1, 1), TileRow::new("b1", 0, 0)).unwrap();
        assert!(matches!(partitioner.state(), PartitionState::ActiveRun { .. }));

        let summary = partitioner.finish().unwrap();
        assert_eq!(partitioner.state(), &PartitionState::Done);
        assert_eq!(summary.flushes, 1);
        assert!(partitioner.push(TileKey::new(1, 1), TileRow::new("b2", 0, 0)).is_err());
    }

    #[test]
    fn test_file_naming() {
        let naming = TileFileNaming {
            prefix: "L1_tile_".to_string(),
            suffix: ".txt".to_string(),
            lane_in_filename: false,
        };
        assert_eq!(naming.file_name(TileKey::new(1, 2101)), "L1_tile_2101.txt");
        assert_eq!(naming.file_name(TileKey::new(2, 2101)), "L1_tile_2101.txt");

        let naming = TileFileNaming {
            lane_in_filename: true,
            ..naming
        };
        assert_eq!(naming.file_name(TileKey::new(2, 2101)), "L1_tile_2_2101.txt");
    }

    #[test]
    fn test_table_writer_refuses_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("5.txt");
        std::fs::write(&existing, "old content\n").unwrap();

        let naming = TileFileNaming {
            suffix: ".txt".to_string(),
            ..Default::default()
        };
        let mut writer = TableWriter::new(dir.path(), naming, WrittenFileRegistry::new());
        let batch = TileRunBatch::with_row(TileRow::new("AAA", 1, 1));

        match writer.append(TileKey::new(1, 5), &batch) {
            Err(Error::ConflictingOutput { path }) => assert_eq!(path, existing),
            other => panic!("expected conflicting output, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "old content\n");
        assert!(writer.registry().is_empty());
    }

    #[test]
    fn test_lanes_sharing_a_tile_share_a_table() {
        let dir = tempfile::tempdir().unwrap();
        let naming = TileFileNaming {
            suffix: ".txt".to_string(),
            ..Default::default()
        };
        let mut writer = TableWriter::new(dir.path(), naming, WrittenFileRegistry::new());

        writer
            .append(TileKey::new(1, 100), &TileRunBatch::with_row(TileRow::new("AAA", 1, 1)))
            .unwrap();
        writer
            .append(TileKey::new(2, 100), &TileRunBatch::with_row(TileRow::new("GGG", 2, 2)))
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("100.txt")).unwrap();
        assert_eq!(content, "cell_bc\txcoord\tycoord\nAAA\t1\t1\nGGG\t2\t2\n");
        assert_eq!(writer.registry().len(), 1);
    }

    #[test]
    fn test_table_writer_appends_to_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let naming = TileFileNaming {
            suffix: ".txt".to_string(),
            ..Default::default()
        };
        let mut writer = TableWriter::new(dir.path(), naming, WrittenFileRegistry::new());

        writer
            .append(TileKey::new(1, 5), &TileRunBatch::with_row(TileRow::new("AAA", 1, 1)))
            .unwrap();
        writer
            .append(TileKey::new(1, 5), &TileRunBatch::with_row(TileRow::new("CCC", 2, 2)))
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("5.txt")).unwrap();
        assert_eq!(content, "cell_bc\txcoord\tycoord\nAAA\t1\t1\nCCC\t2\t2\n");
        assert_eq!(writer.registry().len(), 1);
    }
}
