/// Column holding the barcode that must be unique across a sample
pub const DEDUP_BARCODE_COLUMN: &str = crate::fileformat::COLUMN_CELL_BC;
