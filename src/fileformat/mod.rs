pub mod fastq;
pub mod tile_coordinates;
pub mod tile_table;

pub use fastq::parse_tile_info;
pub use fastq::SequencingRecord;
pub use fastq::TileFastqReader;
pub use fastq::TileKey;

pub use tile_table::append_tile_rows;
pub use tile_table::check_columns;
pub use tile_table::read_tile_rows;
pub use tile_table::write_tsv;
pub use tile_table::RawTileTable;
pub use tile_table::TileRow;
pub use tile_table::{COLUMN_CELL_BC, COLUMN_XCOORD, COLUMN_YCOORD, TILE_TABLE_HEADER};

pub use tile_coordinates::TileCoordinateSystem;
pub use tile_coordinates::TileIdPattern;
pub use tile_coordinates::TileOffset;
pub use tile_coordinates::DEFAULT_TILE_ID_REGEX;
