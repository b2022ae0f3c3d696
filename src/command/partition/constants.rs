pub const PARTITION_DEFAULT_OUT_PREFIX: &str = "";
pub const PARTITION_DEFAULT_CROP_SEQ: &str = ":";
pub const PARTITION_DEFAULT_REV_COMP: bool = false;
pub const PARTITION_DEFAULT_LANE_IN_FILENAME: bool = false;
pub const PARTITION_DEFAULT_ALLOW_EMPTY: bool = false;

/// Records between two progress lines in the log
pub const PARTITION_PROGRESS_INTERVAL: u64 = 1_000_000;
