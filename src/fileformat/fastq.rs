use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::runtime::{Error, Result};

///////////////////////////////
/////////////////////////////// Tile identity of a read
///////////////////////////////

/// A physical capture region on the flow cell, `(lane, tile)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub lane: u32,
    pub tile: u32,
}

impl TileKey {
    pub fn new(lane: u32, tile: u32) -> Self {
        TileKey { lane, tile }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane {} tile {}", self.lane, self.tile)
    }
}

///////////////////////////////
/////////////////////////////// One FASTQ read, reduced to what tile tables need
///////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencingRecord {
    pub key: TileKey,
    pub x: u32,
    pub y: u32,
    /// Sequence line without its line terminator
    pub sequence: String,
}

/// Extract `(lane, tile, x, y)` from an Illumina read name, e.g.
/// `@M03699:250:000000000-DT36J:1:1102:5914:5953 1:N:0:GACGAGATTA`.
/// The four values are the last colon separated fields of the first token.
pub fn parse_tile_info(header: &str) -> std::result::Result<(u32, u32, u32, u32), String> {
    let token = header
        .split_whitespace()
        .next()
        .ok_or_else(|| "empty read name".to_string())?;

    let fields: Vec<&str> = token.split(':').collect();
    if fields.len() < 4 {
        return Err(format!(
            "read name '{}' has {} colon separated field(s), need at least 4",
            token,
            fields.len()
        ));
    }

    let mut values = [0u32; 4];
    for (value, field) in values.iter_mut().zip(&fields[fields.len() - 4..]) {
        *value = field.parse::<u32>().map_err(|_| {
            format!(
                "read name '{}' does not end in lane:tile:x:y integers ('{}')",
                token, field
            )
        })?;
    }
    Ok((values[0], values[1], values[2], values[3]))
}

///////////////////////////////
/////////////////////////////// Streaming reader
///////////////////////////////

/// Single pass reader over a (possibly compressed) FASTQ file. Only the raw lines
/// of the current record are buffered, so memory use does not depend on file size.
pub struct TileFastqReader {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    line: u64,
    records_read: u64,
    lines: [Vec<u8>; 4],
    done: bool,
}

impl TileFastqReader {
    /// Open a FASTQ file, detecting the compression format from its magic bytes
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::file_not_valid(path, Some(format!("could not open fastq file: {}", e)))
        })?;
        match niffler::get_reader(Box::new(file)) {
            Ok((reader, compression)) => {
                debug!(
                    "Opened file {} with compression {:?}",
                    path.display(),
                    compression
                );
                Ok(Self::from_reader(reader, path))
            }
            // Too short to sniff, so it cannot be compressed; read it as plain text
            Err(niffler::Error::FileTooShort) => {
                debug!("Opened short file {} as plain text", path.display());
                Ok(Self::from_reader(File::open(path)?, path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Wrap an already decompressed stream; `path` is only used in error messages
    pub fn from_reader<R: Read + 'static, P: AsRef<Path>>(reader: R, path: P) -> Self {
        TileFastqReader {
            reader: Box::new(BufReader::new(reader)),
            path: path.as_ref().to_path_buf(),
            line: 0,
            records_read: 0,
            lines: Default::default(),
            done: false,
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next record. Returns `Ok(None)` at a clean end of stream.
    pub fn read_record(&mut self) -> Result<Option<SequencingRecord>> {
        if self.done {
            return Ok(None);
        }

        let first_line = self.line + 1;
        for i in 0..4 {
            let buf = &mut self.lines[i];
            buf.clear();
            if self.reader.read_until(b'\n', buf)? == 0 {
                self.done = true;
                if i == 0 {
                    return Ok(None);
                }
                return Err(Error::malformed_record(
                    &self.path,
                    first_line,
                    Some(format!("stream ended after {} of 4 lines of a record", i)),
                ));
            }
            self.line += 1;
        }

        // Only the name and sequence lines are decoded; the quality line is never looked at
        let text = |i: usize| {
            std::str::from_utf8(&self.lines[i]).map_err(|e| {
                Error::malformed_record(
                    &self.path,
                    first_line + i as u64,
                    Some(format!("line is not valid UTF-8: {}", e)),
                )
            })
        };
        let (lane, tile, x, y) = parse_tile_info(text(0)?)
            .map_err(|msg| Error::malformed_record(&self.path, first_line, Some(msg)))?;
        let sequence = text(1)?.trim_end_matches(['\n', '\r']).to_string();
        self.records_read += 1;

        Ok(Some(SequencingRecord {
            key: TileKey::new(lane, tile),
            x,
            y,
            sequence,
        }))
    }
}

impl Iterator for TileFastqReader {
    type Item = Result<SequencingRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
