pub mod command;
pub mod constants;
pub mod core;

pub use self::command::Command;
pub use self::core::core::{
    check_output_directory, DedupSummary, SampleBarcodeUniverse, SampleDeduplicator,
};
