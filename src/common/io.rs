//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use flate2::bufread::MultiGzDecoder;

/// Leading bytes of any gzip (and thus BGZF) stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Transparently open a file with gzip decoder.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, std::io::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for reading", path.as_ref());
        let file = File::open(path)?;
        let bufreader = BufReader::new(file);
        let decoder = MultiGzDecoder::new(bufreader);
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path.as_ref());
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Check whether the file at `path` starts with the gzip magic bytes.
pub fn has_gzip_magic<P>(path: P) -> Result<bool, std::io::Error>
where
    P: AsRef<Path>,
{
    let mut buf = [0u8; 2];
    let mut file = File::open(path)?;
    let mut read = 0;
    while read < buf.len() {
        match file.read(&mut buf[read..])? {
            0 => break,
            n => read += n,
        }
    }
    Ok(read == buf.len() && buf == GZIP_MAGIC)
}
