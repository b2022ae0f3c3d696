use super::core::{core::SampleDeduplicator, params};
use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};
use std::{path::PathBuf, time::Instant};

/// Filter the barcodes of the tiles making up a capture area (a sample), dropping
/// every barcode that is not unique across the sample
#[derive(Args, Debug)]
pub struct Command {
    /// Tile barcode tables of one sample, as written by partition
    #[arg(short = 'i', long = "sample-barcode-files", value_parser, num_args = 1.., required = true)]
    paths_in: Vec<PathBuf>,

    /// Directory for the filtered tables; must not exist or be empty
    #[arg(short = 'o', long = "out-path", value_parser)]
    path_out: PathBuf,
}

impl Command {
    pub fn try_execute(&mut self) -> Result<()> {
        let start = Instant::now();
        debug!("Running dedup with {:?}", self);

        let params_io = params::IO {
            paths_in: self.paths_in.clone(),
            path_out: self.path_out.clone(),
        };

        let summary = SampleDeduplicator::run(&params_io).with_context(|| {
            format!(
                "Failed to deduplicate {} table(s) into {}",
                self.paths_in.len(),
                self.path_out.display()
            )
        })?;

        debug!("{:?}", summary);
        info!("Finished in {:.2} sec", start.elapsed().as_secs_f64());
        Ok(())
    }
}
