use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Opens a text input, transparently decompressing GZIP and BGZF files.
///
/// Compression is detected from the magic bytes, not the file name, so
/// `depth.bed` that is secretly gzipped still reads correctly.
pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    // GZIP magic: 1f 8b
    let is_gzip = {
        let buf = reader.fill_buf()?;
        buf.len() >= 2 && buf[0] == 0x1f && buf[1] == 0x8b
    };

    if is_gzip {
        tracing::debug!(input = %path.display(), "detected GZIP/BGZF layer");
        // MultiGzDecoder also handles BGZF blocks and concatenated members
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}
