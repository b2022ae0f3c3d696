use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::fileformat::{TileKey, TileRow};

///////////////////////////////
/// Output files created or appended to by the current invocation. A file that
/// exists on disk but is not in here was left by some other run.
#[derive(Debug, Default)]
pub struct WrittenFileRegistry {
    paths: FxHashSet<PathBuf>,
}

impl WrittenFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Returns true if the path was not registered before
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

///////////////////////////////
/// Rows of one contiguous run of records sharing a tile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileRunBatch {
    rows: Vec<TileRow>,
}

impl TileRunBatch {
    pub fn with_row(row: TileRow) -> Self {
        TileRunBatch { rows: vec![row] }
    }

    pub fn push(&mut self, row: TileRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TileRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A finished run, ready to be appended to its table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub key: TileKey,
    pub batch: TileRunBatch,
}

///////////////////////////////
/// Run detection over a stream that is ordered by tile only locally.
///
/// A change of key closes the active run and opens a new one. A key may come back
/// later; that opens a fresh run which is flushed to the same table again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PartitionState {
    #[default]
    NoActiveRun,
    ActiveRun {
        key: TileKey,
        batch: TileRunBatch,
    },
    Done,
}

impl PartitionState {
    /// Feed one record. Returns the new state and the run to flush, if the key changed.
    /// `None` means the state is `Done` and takes no more records.
    pub fn on_record(self, key: TileKey, row: TileRow) -> Option<(PartitionState, Option<Flush>)> {
        match self {
            PartitionState::NoActiveRun => Some((
                PartitionState::ActiveRun {
                    key,
                    batch: TileRunBatch::with_row(row),
                },
                None,
            )),
            PartitionState::ActiveRun {
                key: active,
                mut batch,
            } if active == key => {
                batch.push(row);
                Some((PartitionState::ActiveRun { key, batch }, None))
            }
            PartitionState::ActiveRun { key: active, batch } => Some((
                PartitionState::ActiveRun {
                    key,
                    batch: TileRunBatch::with_row(row),
                },
                Some(Flush { key: active, batch }),
            )),
            PartitionState::Done => None,
        }
    }

    /// Close the stream, handing back the final run if there is one
    pub fn on_end_of_stream(self) -> (PartitionState, Option<Flush>) {
        match self {
            PartitionState::ActiveRun { key, batch } => {
                (PartitionState::Done, Some(Flush { key, batch }))
            }
            PartitionState::NoActiveRun | PartitionState::Done => (PartitionState::Done, None),
        }
    }
}
