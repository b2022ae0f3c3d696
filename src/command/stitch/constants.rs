pub const STITCH_DEFAULT_TILE_ID_REGEX: &str = crate::fileformat::DEFAULT_TILE_ID_REGEX;
pub const STITCH_DEFAULT_TILE_ID_KEY: &str = "tile_id";
pub const STITCH_DEFAULT_NO_RESET_INDEX: bool = false;
pub const STITCH_DEFAULT_NO_TRANSFORM: bool = false;
