// FASTA reader module using bio::io::fasta
//
// Used to load the control reference. Provides:
// - Automatic gzip/bgzip detection by file extension and magic bytes
// - Parallel BGZIP decompression for .gz files (if BGZIP format detected)
// - Selection of the control record by name

use bio::io::fasta;
use flate2::read::GzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{FilterError, Result};

/// FASTA reader with automatic gzip/bgzip detection
pub struct FastaReader {
    records: fasta::Records<BufReader<Box<dyn Read>>>,
}

/// Detect if a gzipped file is BGZIP format by checking for BGZIP-specific header
fn is_bgzip_format(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18]; // BGZIP header is at least 18 bytes

    if file.read(&mut header).unwrap_or(0) < 18 {
        return Ok(false);
    }

    // gzip magic
    if header[0] != 0x1f || header[1] != 0x8b {
        return Ok(false);
    }

    // BGZIP uses the extra field (FEXTRA flag = 0x04) with a 'BC' subfield
    if header[3] & 0x04 == 0 {
        return Ok(false);
    }

    Ok(header[12] == b'B' && header[13] == b'C')
}

impl FastaReader {
    /// Open a FASTA file (.fa, .fasta, .fa.gz, .fasta.gz)
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        const BUFFER_SIZE: usize = 1024 * 1024;

        let path = path.as_ref();
        let file = File::open(path)?;
        let is_gz = path.extension().and_then(|e| e.to_str()) == Some("gz");

        let reader: Box<dyn Read> = if is_gz {
            if is_bgzip_format(path)? {
                log::debug!("Detected BGZIP format for {}", path.display());
                let bgzf_reader = bgzf::MultithreadedReader::new(file);
                Box::new(BufReader::with_capacity(BUFFER_SIZE, bgzf_reader))
            } else {
                log::debug!("Detected standard gzip format for {}", path.display());
                Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file)))
            }
        } else {
            Box::new(BufReader::with_capacity(BUFFER_SIZE, file))
        };

        Ok(Self {
            records: fasta::Reader::new(reader).records(),
        })
    }

    /// Read the next FASTA record
    ///
    /// Returns `Ok(Some(record))` if a record is found, `Ok(None)` at EOF,
    /// and `Err(e)` on a parse error.
    pub fn read_record(&mut self) -> io::Result<Option<fasta::Record>> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }
}

/// Load the control sequence called `name` from a FASTA file.
///
/// The record id is matched case-insensitively. A file holding a single
/// record is accepted whatever its id, so a plain `phix.fa` works with any
/// control name.
///
/// # Returns
/// * `Ok((id, sequence))` - record id and its bases
/// * `Err(ControlNotFound)` - no matching record among several
/// * `Err(EmptyReference)` - the selected record has no bases
pub fn load_control_sequence<P: AsRef<Path>>(path: P, name: &str) -> Result<(String, Vec<u8>)> {
    let path = path.as_ref();
    let mut reader = FastaReader::new(path)?;

    let mut first: Option<fasta::Record> = None;
    let mut n_records = 0usize;

    while let Some(record) = reader.read_record()? {
        n_records += 1;
        if record.id().eq_ignore_ascii_case(name) {
            return finish(record);
        }
        if first.is_none() {
            first = Some(record);
        }
    }

    match first {
        Some(record) if n_records == 1 => {
            log::info!(
                "Using record '{}' from {} as control '{}'",
                record.id(),
                path.display(),
                name
            );
            finish(record)
        }
        _ => Err(FilterError::ControlNotFound(name.to_string())),
    }
}

fn finish(record: fasta::Record) -> Result<(String, Vec<u8>)> {
    if record.seq().is_empty() {
        return Err(FilterError::EmptyReference);
    }
    Ok((record.id().to_string(), record.seq().to_vec()))
}
