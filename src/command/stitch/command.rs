use super::{
    constants::{
        STITCH_DEFAULT_NO_RESET_INDEX, STITCH_DEFAULT_NO_TRANSFORM, STITCH_DEFAULT_TILE_ID_KEY,
        STITCH_DEFAULT_TILE_ID_REGEX,
    },
    core::{core::TileStitcher, params},
};
use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};
use std::{path::PathBuf, time::Instant};

/// Stitch the tile tables of a sample into one table in global coordinates
#[derive(Args, Debug)]
pub struct Command {
    /// Tile tables to stitch
    #[arg(short = 'i', long = "tiles", value_parser, num_args = 1.., required = true)]
    paths_in: Vec<PathBuf>,

    /// Comma, tab or | separated file with tile_id (or puck_id), x_offset and y_offset
    #[arg(long = "tile-coordinates", value_parser)]
    path_tile_coordinates: PathBuf,

    /// Stitched table
    #[arg(short = 'o', long = "output", value_parser)]
    path_out: PathBuf,

    /// Tile id of each input, in order. Otherwise found in the file names
    #[arg(long = "tile-id", num_args = 1..)]
    tile_ids: Option<Vec<String>>,

    /// Regex finding tile ids in file names and in the coordinate file
    #[arg(long, default_value = STITCH_DEFAULT_TILE_ID_REGEX)]
    tile_id_regex: String,

    /// Name of the tile id column added to the output
    #[arg(long, default_value = STITCH_DEFAULT_TILE_ID_KEY)]
    tile_id_key: String,

    /// Keep cell_bc as is instead of appending :tile_id
    #[arg(long, default_value_t = STITCH_DEFAULT_NO_RESET_INDEX)]
    no_reset_index: bool,

    /// Keep tile-local coordinates
    #[arg(long, default_value_t = STITCH_DEFAULT_NO_TRANSFORM)]
    no_transform: bool,
}

impl Command {
    pub fn try_execute(&mut self) -> Result<()> {
        let start = Instant::now();
        debug!("Running stitch with {:?}", self);

        let params_io = params::IO {
            paths_in: self.paths_in.clone(),
            path_tile_coordinates: self.path_tile_coordinates.clone(),
            path_out: self.path_out.clone(),
        };
        let params_runtime = params::Runtime {
            tile_ids: self.tile_ids.clone(),
            tile_id_regex: self.tile_id_regex.clone(),
            tile_id_key: self.tile_id_key.clone(),
            reset_index: !self.no_reset_index,
            transform: !self.no_transform,
        };

        let summary = TileStitcher::run(&params_io, &params_runtime)
            .with_context(|| format!("Failed to stitch tiles into {}", self.path_out.display()))?;

        debug!("{:?}", summary);
        info!("Finished in {:.2} sec", start.elapsed().as_secs_f64());
        Ok(())
    }
}
