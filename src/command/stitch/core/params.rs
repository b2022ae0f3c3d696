pub struct IO {
    pub paths_in: Vec<std::path::PathBuf>,
    pub path_tile_coordinates: std::path::PathBuf,
    pub path_out: std::path::PathBuf,
}

pub struct Runtime {
    pub tile_ids: Option<Vec<String>>,
    pub tile_id_regex: String,
    pub tile_id_key: String,
    pub reset_index: bool,
    pub transform: bool,
}
