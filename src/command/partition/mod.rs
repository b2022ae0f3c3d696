pub mod command;
pub mod constants;
pub mod core;

pub use self::command::Command;
pub use self::core::core::{
    partition_records, PartitionSummary, TableWriter, TileFileNaming, TilePartitionProcessor,
    TilePartitioner, TileSink,
};
pub use self::core::state::{Flush, PartitionState, TileRunBatch, WrittenFileRegistry};
