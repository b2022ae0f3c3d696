pub struct IO {
    pub paths_in: Vec<std::path::PathBuf>,
    pub path_out: std::path::PathBuf,
}
