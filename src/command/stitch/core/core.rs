use log::{debug, info};
use std::path::Path;

use super::params;
use crate::fileformat::{
    write_tsv, RawTileTable, TileCoordinateSystem, TileIdPattern, COLUMN_CELL_BC,
    COLUMN_XCOORD, COLUMN_YCOORD, TILE_TABLE_HEADER,
};
use crate::runtime::{Error, Result};

///////////////////////////////
/// One input table together with the tile it belongs to. `None` when the table
/// already carries a tile id column, whose values are kept.
#[derive(Debug, Clone)]
pub struct TileTableInput {
    pub tile_id: Option<String>,
    pub table: RawTileTable,
}

///////////////////////////////
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StitchSummary {
    pub tables: usize,
    pub rows: usize,
    pub columns: usize,
}

/// Columns of all tables in first-seen order, followed by the tile id column
pub fn merged_headers(tables: &[TileTableInput], tile_id_key: &str) -> csv::StringRecord {
    let mut columns: Vec<&str> = Vec::new();
    for input in tables {
        for column in input.table.headers.iter() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    if !columns.contains(&tile_id_key) {
        columns.push(tile_id_key);
    }
    csv::StringRecord::from(columns)
}

/// Tile id of every table. A table with a `tile_id_key` column keeps its own ids.
/// Otherwise the explicit ids are used in order if given, else a match in the file name.
pub fn resolve_tile_ids(
    tables: &[RawTileTable],
    explicit: Option<&[String]>,
    pattern: &TileIdPattern,
    tile_id_key: &str,
) -> Result<Vec<Option<String>>> {
    if let Some(ids) = explicit {
        if ids.len() != tables.len() {
            return Err(Error::parse_error(
                "tile ids",
                Some(format!(
                    "{} tile id(s) given for {} table(s)",
                    ids.len(),
                    tables.len()
                )),
            ));
        }
    }

    tables
        .iter()
        .enumerate()
        .map(|(i, table)| {
            if table.column_index(tile_id_key).is_some() {
                debug!("{} has a {} column, keeping it", table.path.display(), tile_id_key);
                return Ok(None);
            }
            if let Some(ids) = explicit {
                return Ok(Some(ids[i].clone()));
            }
            let name = table.file_name()?;
            pattern.find_first(&name).map(Some).ok_or_else(|| {
                Error::parse_error(
                    format!("tile id of {}", table.path.display()),
                    Some(format!("no match for '{}'", pattern.as_str())),
                )
            })
        })
        .collect()
}

fn shift_coordinate(value: &str, offset: f64, column: &str, path: &Path) -> Result<String> {
    let parsed: f64 = value.trim().parse().map_err(|e: std::num::ParseFloatError| {
        Error::parse_error(
            format!("{} '{}' in {}", column, value, path.display()),
            Some(e.to_string()),
        )
    })?;
    Ok((parsed + offset).to_string())
}

pub struct TileStitcher {}
impl TileStitcher {
    /// Merge the tile tables of a sample into one table in global coordinates
    pub fn run(params_io: &params::IO, params_runtime: &params::Runtime) -> Result<StitchSummary> {
        let parent = params_io
            .path_out
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if !parent.is_dir() {
            return Err(Error::file_not_valid(
                &params_io.path_out,
                Some("parent directory does not exist"),
            ));
        }

        let pattern = TileIdPattern::new(&params_runtime.tile_id_regex)?;

        let coordinates = TileCoordinateSystem::load(&params_io.path_tile_coordinates, &pattern)?;
        info!(
            "Loaded offsets for {} tile(s) from {}",
            coordinates.len(),
            params_io.path_tile_coordinates.display()
        );

        let mut tables = Vec::with_capacity(params_io.paths_in.len());
        for path in &params_io.paths_in {
            let table = RawTileTable::load(path, &TILE_TABLE_HEADER)?;
            debug!("Loaded {} row(s) from {}", table.rows.len(), path.display());
            tables.push(table);
        }
        let tile_ids = resolve_tile_ids(
            &tables,
            params_runtime.tile_ids.as_deref(),
            &pattern,
            &params_runtime.tile_id_key,
        )?;
        let tables: Vec<TileTableInput> = tile_ids
            .into_iter()
            .zip(tables)
            .map(|(tile_id, table)| TileTableInput { tile_id, table })
            .collect();

        Self::stitch(&tables, &coordinates, params_runtime, &params_io.path_out)
    }

    pub fn stitch(
        tables: &[TileTableInput],
        coordinates: &TileCoordinateSystem,
        params_runtime: &params::Runtime,
        path_out: &Path,
    ) -> Result<StitchSummary> {
        let headers = merged_headers(tables, &params_runtime.tile_id_key);
        let position = |name: &str| headers.iter().position(|h| h == name);
        let (Some(bc_out), Some(x_out), Some(y_out), Some(id_out)) = (
            position(COLUMN_CELL_BC),
            position(COLUMN_XCOORD),
            position(COLUMN_YCOORD),
            position(&params_runtime.tile_id_key),
        ) else {
            return Err(Error::schema(path_out, vec![COLUMN_CELL_BC.to_string()]));
        };

        let mut rows = Vec::new();
        for input in tables {
            // Input column index for each output column
            let mapping: Vec<Option<usize>> = headers
                .iter()
                .map(|h| input.table.column_index(h))
                .collect();

            for row in &input.table.rows {
                let mut fields: Vec<String> = mapping
                    .iter()
                    .map(|i| i.and_then(|i| row.get(i)).unwrap_or_default().to_string())
                    .collect();
                if let Some(tile_id) = &input.tile_id {
                    fields[id_out] = tile_id.clone();
                }
                let tile_id = fields[id_out].clone();

                if params_runtime.reset_index {
                    fields[bc_out] = format!("{}:{}", fields[bc_out], tile_id);
                }
                if params_runtime.transform {
                    let offset = coordinates
                        .get(&tile_id)
                        .ok_or_else(|| Error::UnknownTile { tile_id })?;
                    fields[x_out] =
                        shift_coordinate(&fields[x_out], offset.x_offset, COLUMN_XCOORD, &input.table.path)?;
                    fields[y_out] =
                        shift_coordinate(&fields[y_out], offset.y_offset, COLUMN_YCOORD, &input.table.path)?;
                }
                rows.push(csv::StringRecord::from(fields));
            }
        }

        write_tsv(path_out, &headers, rows.iter())?;
        info!(
            "Wrote {} row(s) of {} tile(s) to {}",
            rows.len(),
            tables.len(),
            path_out.display()
        );

        Ok(StitchSummary {
            tables: tables.len(),
            rows: rows.len(),
            columns: headers.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileformat::DEFAULT_TILE_ID_REGEX;
    use std::path::PathBuf;

    fn runtime() -> params::Runtime {
        params::Runtime {
            tile_ids: None,
            tile_id_regex: DEFAULT_TILE_ID_REGEX.to_string(),
            tile_id_key: "tile_id".to_string(),
            reset_index: true,
            transform: true,
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_stitch_two_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let t1 = write(dir.path(), "s_L1_tile_1101.txt", "cell_bc\txcoord\tycoord\nAAA\t1\t2\n");
        let t2 = write(
            dir.path(),
            "s_L1_tile_1102.txt",
            "cell_bc\txcoord\tycoord\tumi\nCCC\t3\t4\t7\n",
        );
        let cs = write(
            dir.path(),
            "coords.csv",
            "tile_id,x_offset,y_offset\nL1_tile_1101,0,0\nL1_tile_1102,100.5,50\n",
        );
        let out = dir.path().join("stitched.txt");

        let params_io = params::IO {
            paths_in: vec![t1, t2],
            path_tile_coordinates: cs,
            path_out: out.clone(),
        };
        let summary = TileStitcher::run(&params_io, &runtime()).unwrap();
        assert_eq!(
            summary,
            StitchSummary {
                tables: 2,
                rows: 2,
                columns: 5
            }
        );

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            content,
            "cell_bc\txcoord\tycoord\tumi\ttile_id\n\
             AAA:L1_tile_1101\t1\t2\t\tL1_tile_1101\n\
             CCC:L1_tile_1102\t103.5\t54\t7\tL1_tile_1102\n"
        );
    }

    #[test]
    fn test_no_transform_no_reset() {
        let dir = tempfile::tempdir().unwrap();
        let t1 = write(dir.path(), "a.txt", "cell_bc\txcoord\tycoord\nAAA\t1\t2\n");
        let cs = write(dir.path(), "coords.csv", "tile_id,x_offset,y_offset\n");
        let out = dir.path().join("out.txt");

        let mut rt = runtime();
        rt.tile_ids = Some(vec!["L2_tile_2101".to_string()]);
        rt.reset_index = false;
        rt.transform = false;
        let params_io = params::IO {
            paths_in: vec![t1],
            path_tile_coordinates: cs,
            path_out: out.clone(),
        };
        TileStitcher::run(&params_io, &rt).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "cell_bc\txcoord\tycoord\ttile_id\nAAA\t1\t2\tL2_tile_2101\n"
        );
    }

    #[test]
    fn test_unknown_tile() {
        let dir = tempfile::tempdir().unwrap();
        let t1 = write(dir.path(), "L3_tile_2517.txt", "cell_bc\txcoord\tycoord\nAAA\t1\t2\n");
        let cs = write(dir.path(), "coords.csv", "tile_id,x_offset,y_offset\nL1_tile_1101,0,0\n");
        let params_io = params::IO {
            paths_in: vec![t1],
            path_tile_coordinates: cs,
            path_out: dir.path().join("out.txt"),
        };
        assert!(matches!(
            TileStitcher::run(&params_io, &runtime()),
            Err(Error::UnknownTile { tile_id }) if tile_id == "L3_tile_2517"
        ));
    }

    fn table(path: &str, headers: &[&str]) -> RawTileTable {
        RawTileTable {
            path: PathBuf::from(path),
            headers: csv::StringRecord::from(headers.to_vec()),
            rows: vec![],
        }
    }

    #[test]
    fn test_tile_id_resolution_errors() {
        let pattern = TileIdPattern::new(DEFAULT_TILE_ID_REGEX).unwrap();
        let tables = vec![table("x/no_tile_here.txt", &TILE_TABLE_HEADER)];
        assert!(matches!(
            resolve_tile_ids(&tables, None, &pattern, "tile_id"),
            Err(Error::ParseError { .. })
        ));

        let ids = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            resolve_tile_ids(&tables, Some(&ids), &pattern, "tile_id"),
            Err(Error::ParseError { .. })
        ));
    }

    #[test]
    fn test_existing_tile_id_column_wins() {
        let pattern = TileIdPattern::new(DEFAULT_TILE_ID_REGEX).unwrap();
        let tables = vec![
            table("x/no_tile_here.txt", &["cell_bc", "xcoord", "ycoord", "tile_id"]),
            table("x/L1_tile_1101.txt", &TILE_TABLE_HEADER),
        ];
        assert_eq!(
            resolve_tile_ids(&tables, None, &pattern, "tile_id").unwrap(),
            vec![None, Some("L1_tile_1101".to_string())]
        );

        let ids = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            resolve_tile_ids(&tables, Some(&ids), &pattern, "tile_id").unwrap(),
            vec![None, Some("b".to_string())]
        );
    }

    #[test]
    fn test_stitch_keeps_tile_id_column() {
        let dir = tempfile::tempdir().unwrap();
        let t1 = write(
            dir.path(),
            "merged.txt",
            "cell_bc\txcoord\tycoord\ttile_id\nAAA\t1\t2\tL1_tile_1101\nCCC\t3\t4\tL1_tile_1102\n",
        );
        let cs = write(
            dir.path(),
            "coords.csv",
            "tile_id,x_offset,y_offset\nL1_tile_1101,0,0\nL1_tile_1102,10,20\n",
        );
        let out = dir.path().join("out.txt");
        let params_io = params::IO {
            paths_in: vec![t1],
            path_tile_coordinates: cs,
            path_out: out.clone(),
        };
        TileStitcher::run(&params_io, &runtime()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "cell_bc\txcoord\tycoord\ttile_id\n\
             AAA:L1_tile_1101\t1\t2\tL1_tile_1101\n\
             CCC:L1_tile_1102\t13\t24\tL1_tile_1102\n"
        );
    }

    #[test]
    fn test_missing_output_parent() {
        let dir = tempfile::tempdir().unwrap();
        let params_io = params::IO {
            paths_in: vec![],
            path_tile_coordinates: dir.path().join("coords.csv"),
            path_out: dir.path().join("missing").join("out.txt"),
        };
        assert!(matches!(
            TileStitcher::run(&params_io, &runtime()),
            Err(Error::FileNotValid { .. })
        ));
    }
}
