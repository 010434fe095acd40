// FASTQ reader module using bio::io::fastq
//
// This module provides a wrapper around bio::io::fastq with:
// - Automatic gzip/bgzip detection by file extension and magic bytes
// - Reading from stdin when the path is "-"
// - Batch reading to match the filter's processing pattern (512 reads at a time)

use bio::io::fastq;
use flate2::read::GzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Batch of FASTQ reads, stored column-wise
#[derive(Debug, Default)]
pub struct ReadBatch {
    pub names: Vec<String>,
    pub descs: Vec<Option<String>>,
    pub seqs: Vec<Vec<u8>>,
    pub quals: Vec<Vec<u8>>,
}

impl ReadBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reads in this batch
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Rebuild the i-th read as a bio record for writing.
    pub fn record(&self, i: usize) -> fastq::Record {
        fastq::Record::with_attrs(
            &self.names[i],
            self.descs[i].as_deref(),
            &self.seqs[i],
            &self.quals[i],
        )
    }
}

/// FASTQ reader with automatic gzip detection
pub struct FastqReader {
    records: fastq::Records<BufReader<Box<dyn Read>>>,
}

/// Detect if a gzipped file is BGZIP format by checking for BGZIP-specific header
fn is_bgzip_format(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18];

    if file.read(&mut header).unwrap_or(0) < 18 {
        return Ok(false);
    }

    if header[0] != 0x1f || header[1] != 0x8b || header[3] & 0x04 == 0 {
        return Ok(false);
    }

    Ok(header[12] == b'B' && header[13] == b'C')
}

impl FastqReader {
    /// Open a FASTQ file (.fq, .fastq, .fq.gz, .fastq.gz), or stdin for "-"
    ///
    /// # Returns
    /// * `Ok(FastqReader)` on success
    /// * `Err(io::Error)` if file cannot be opened
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

        let path = path.as_ref();
        if path.as_os_str() == "-" {
            return Ok(Self::from_reader(Box::new(io::stdin())));
        }

        let is_gz = path.extension().and_then(|e| e.to_str()) == Some("gz");
        let reader: Box<dyn Read> = if is_gz {
            let file = File::open(path)?;
            if is_bgzip_format(path)? {
                log::debug!("Detected BGZIP format, using parallel decompression");
                Box::new(BufReader::with_capacity(
                    BUFFER_SIZE,
                    bgzf::MultithreadedReader::new(file),
                ))
            } else {
                log::debug!("Detected standard gzip format, using single-threaded decompression");
                Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file)))
            }
        } else {
            Box::new(BufReader::with_capacity(BUFFER_SIZE, File::open(path)?))
        };

        Ok(Self::from_reader(reader))
    }

    /// Wrap an already opened stream.
    pub fn from_reader(reader: Box<dyn Read>) -> Self {
        Self {
            records: fastq::Reader::new(reader).records(),
        }
    }

    /// Read a batch of reads (up to batch_size)
    ///
    /// Returns an empty batch when EOF is reached.
    ///
    /// # Returns
    /// * `Ok(ReadBatch)` containing up to batch_size reads
    /// * `Err(io::Error)` on parse error
    pub fn read_batch(&mut self, batch_size: usize) -> io::Result<ReadBatch> {
        let mut batch = ReadBatch::new();

        for _ in 0..batch_size {
            match self.records.next() {
                Some(Ok(record)) => {
                    batch.names.push(record.id().to_string());
                    batch.descs.push(record.desc().map(str::to_string));
                    batch.seqs.push(record.seq().to_vec());
                    batch.quals.push(record.qual().to_vec());
                }
                Some(Err(e)) => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                }
                None => break, // EOF
            }
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_batch() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "@read1 lane=1").unwrap();
        writeln!(file, "ACGT").unwrap();
        writeln!(file, "+").unwrap();
        writeln!(file, "IIII").unwrap();
        writeln!(file, "@read2").unwrap();
        writeln!(file, "TGCA").unwrap();
        writeln!(file, "+").unwrap();
        writeln!(file, "JJJJ").unwrap();
        file.flush().unwrap();

        let mut reader = FastqReader::new(file.path()).unwrap();
        let batch = reader.read_batch(10).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.names[0], "read1");
        assert_eq!(batch.descs[0].as_deref(), Some("lane=1"));
        assert_eq!(batch.descs[1], None);
        assert_eq!(batch.seqs[1], b"TGCA");
        assert_eq!(batch.quals[1], b"JJJJ");

        let rec = batch.record(0);
        assert_eq!(rec.id(), "read1");
        assert_eq!(rec.seq(), b"ACGT");
    }

    #[test]
    fn test_batch_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..100 {
            writeln!(file, "@read{}", i).unwrap();
            writeln!(file, "ACGT").unwrap();
            writeln!(file, "+").unwrap();
            writeln!(file, "IIII").unwrap();
        }
        file.flush().unwrap();

        let mut reader = FastqReader::new(file.path()).unwrap();
        assert_eq!(reader.read_batch(30).unwrap().len(), 30);
        assert_eq!(reader.read_batch(30).unwrap().len(), 30);
        assert_eq!(reader.read_batch(30).unwrap().len(), 30);
        assert_eq!(reader.read_batch(30).unwrap().len(), 10);
        assert!(reader.read_batch(30).unwrap().is_empty());
    }
}
