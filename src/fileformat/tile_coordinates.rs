use log::{debug, warn};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::path::Path;

use crate::runtime::{Error, Result};

/// Tile ids as they appear in file names, e.g. `L2a_tile_2417`
pub const DEFAULT_TILE_ID_REGEX: &str = r"(L[1-4][a-b]?_tile_[1-2][0-7][0-9][0-9])";

pub const COLUMN_TILE_ID: &str = "tile_id";
pub const COLUMN_PUCK_ID: &str = "puck_id";
pub const COLUMN_X_OFFSET: &str = "x_offset";
pub const COLUMN_Y_OFFSET: &str = "y_offset";

///////////////////////////////
/// Finds tile ids in free text. If the pattern has a capture group, the first
/// group is the id, otherwise the whole match.
#[derive(Debug, Clone)]
pub struct TileIdPattern {
    regex: Regex,
}

impl TileIdPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(TileIdPattern {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// First tile id in `text`; warns when there is more than one
    pub fn find_first(&self, text: &str) -> Option<String> {
        let mut ids = self.find_all(text);
        if ids.len() > 1 {
            warn!(
                "Found more than one tile id in '{}', using the first one ({})",
                text, ids[0]
            );
        }
        if ids.is_empty() {
            None
        } else {
            Some(ids.swap_remove(0))
        }
    }
}

///////////////////////////////
/// Translation of one tile into the global coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOffset {
    pub x_offset: f64,
    pub y_offset: f64,
}

///////////////////////////////
/// Tile id to offset lookup, read from a comma, tab or `|` separated file
#[derive(Debug, Clone, Default)]
pub struct TileCoordinateSystem {
    offsets: FxHashMap<String, TileOffset>,
}

impl TileCoordinateSystem {
    pub fn load(path: &Path, pattern: &TileIdPattern) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::file_not_valid(path, Some(format!("could not read tile coordinates: {}", e)))
        })?;
        Self::parse(&content, path, pattern)
    }

    /// Parse file content; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path, pattern: &TileIdPattern) -> Result<Self> {
        let header_line = content.lines().next().unwrap_or_default();
        let delimiter = [b'\t', b',', b'|']
            .into_iter()
            .find(|d| header_line.as_bytes().contains(d))
            .unwrap_or(b',');

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let id_column = position(COLUMN_TILE_ID)
            .or_else(|| position(COLUMN_PUCK_ID))
            .ok_or_else(|| Error::schema(path, vec![COLUMN_TILE_ID.to_string()]))?;
        let (x_column, y_column) = match (position(COLUMN_X_OFFSET), position(COLUMN_Y_OFFSET)) {
            (Some(x), Some(y)) => (x, y),
            (x, y) => {
                let mut missing = Vec::new();
                if x.is_none() {
                    missing.push(COLUMN_X_OFFSET.to_string());
                }
                if y.is_none() {
                    missing.push(COLUMN_Y_OFFSET.to_string());
                }
                return Err(Error::schema(path, missing));
            }
        };

        let parse_offset = |value: &str, column: &str| -> Result<f64> {
            value.trim().parse::<f64>().map_err(|e| {
                Error::parse_error(
                    format!("{} '{}' in {}", column, value, path.display()),
                    Some(e.to_string()),
                )
            })
        };

        let mut offsets = FxHashMap::default();
        for record in reader.records() {
            let record = record?;
            let raw_id = record.get(id_column).unwrap_or_default();
            let Some(tile_id) = pattern.find_first(raw_id) else {
                warn!("No tile id found in '{}', skipping this row of {}", raw_id, path.display());
                continue;
            };
            if offsets.contains_key(&tile_id) {
                debug!("Tile {} listed again in {}, keeping the first entry", tile_id, path.display());
                continue;
            }
            let offset = TileOffset {
                x_offset: parse_offset(record.get(x_column).unwrap_or_default(), COLUMN_X_OFFSET)?,
                y_offset: parse_offset(record.get(y_column).unwrap_or_default(), COLUMN_Y_OFFSET)?,
            };
            offsets.insert(tile_id, offset);
        }

        Ok(TileCoordinateSystem { offsets })
    }

    pub fn get(&self, tile_id: &str) -> Option<&TileOffset> {
        self.offsets.get(tile_id)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
