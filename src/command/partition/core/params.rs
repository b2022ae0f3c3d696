use crate::barcode::CropRange;

pub struct IO {
    pub path_in: std::path::PathBuf,
    pub path_out: std::path::PathBuf,
}

pub struct Runtime {
    pub out_prefix: String,
    pub out_suffix: String,
    pub crop_seq: CropRange,
    pub rev_comp: bool,
    pub lane_in_filename: bool,
    pub allow_empty: bool,
}
