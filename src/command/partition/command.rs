use super::{
    constants::{
        PARTITION_DEFAULT_ALLOW_EMPTY, PARTITION_DEFAULT_CROP_SEQ,
        PARTITION_DEFAULT_LANE_IN_FILENAME, PARTITION_DEFAULT_OUT_PREFIX,
        PARTITION_DEFAULT_REV_COMP,
    },
    core::{core::TilePartitionProcessor, params},
};
use crate::barcode::CropRange;
use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};
use std::{path::PathBuf, time::Instant};

/// Convert a FASTQ file into spatial barcode tables, one per tile (sequence and coordinates)
#[derive(Args, Debug)]
pub struct Command {
    /// FASTQ file with the spatial barcode reads, optionally compressed
    #[arg(short = 'i', long = "in-fastq", value_parser)]
    path_in: PathBuf,

    /// Directory where the tile tables are written
    #[arg(short = 'o', long = "out-path", value_parser)]
    path_out: PathBuf,

    /// Appended to the tile number to form each file name
    #[arg(long)]
    out_suffix: String,

    /// Prepended to the tile number to form each file name
    #[arg(long, default_value = PARTITION_DEFAULT_OUT_PREFIX)]
    out_prefix: String,

    /// Crop applied to each sequence, as start:stop:step
    #[arg(long, default_value = PARTITION_DEFAULT_CROP_SEQ, allow_hyphen_values = true)]
    crop_seq: String,

    /// Reverse complement each sequence after cropping
    #[arg(long, default_value_t = PARTITION_DEFAULT_REV_COMP)]
    rev_comp: bool,

    /// Name tables {prefix}{lane}_{tile}{suffix} so lanes sharing tile numbers stay apart
    #[arg(long, default_value_t = PARTITION_DEFAULT_LANE_IN_FILENAME)]
    lane_in_filename: bool,

    /// Succeed without output when the input holds no records
    #[arg(long, default_value_t = PARTITION_DEFAULT_ALLOW_EMPTY)]
    allow_empty: bool,
}

impl Command {
    pub fn try_execute(&mut self) -> Result<()> {
        let start = Instant::now();
        debug!("Running partition with {:?}", self);

        let crop_seq: CropRange = self
            .crop_seq
            .parse()
            .with_context(|| format!("Invalid --crop-seq '{}'", self.crop_seq))?;

        let params_io = params::IO {
            path_in: self.path_in.clone(),
            path_out: self.path_out.clone(),
        };
        let params_runtime = params::Runtime {
            out_prefix: self.out_prefix.clone(),
            out_suffix: self.out_suffix.clone(),
            crop_seq,
            rev_comp: self.rev_comp,
            lane_in_filename: self.lane_in_filename,
            allow_empty: self.allow_empty,
        };

        info!(
            "Partitioning {} into {}",
            self.path_in.display(),
            self.path_out.display()
        );
        let summary = TilePartitionProcessor::run(&params_io, &params_runtime)
            .with_context(|| format!("Failed to partition {}", self.path_in.display()))?;

        for (key, rows) in &summary.rows_per_tile {
            debug!("{}: {} row(s)", key, rows);
        }
        info!("Finished in {:.2} sec", start.elapsed().as_secs_f64());
        Ok(())
    }
}
