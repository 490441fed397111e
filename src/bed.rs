//! Streaming BED file parser and interval writers.

use crate::interval::{Interval, Strand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during BED parsing.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid BED format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// A BED record: interval plus the optional name and strand fields used
/// by this crate (feature files, TSS tables, anchor files).
#[derive(Debug, Clone, PartialEq)]
pub struct BedRecord {
    pub interval: Interval,
    pub name: Option<String>,
    pub strand: Option<Strand>,
}

impl BedRecord {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            interval: Interval::new(chrom, start, end),
            name: None,
            strand: None,
        }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }
}

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next BED record.
    pub fn read_record(&mut self) -> Result<Option<BedRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            // Skip empty lines and comments
            let line = self.buffer.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &str) -> Result<BedRecord> {
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() < 3 {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!("Expected at least 3 fields, got {}", fields.len()),
            });
        }

        let chrom = fields[0].to_string();
        let start = self.parse_position(fields[1], "start")?;
        let end = self.parse_position(fields[2], "end")?;

        if start > end {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!("Start ({}) > end ({})", start, end),
            });
        }

        let mut record = BedRecord::new(chrom, start, end);

        if fields.len() > 3 {
            record.name = Some(fields[3].to_string());
        }
        if fields.len() > 5 {
            record.strand = fields[5].chars().next().map(Strand::from_char);
        }

        Ok(record)
    }

    fn parse_position(&self, s: &str, field_name: &str) -> Result<u64> {
        s.parse().map_err(|_| BedError::Parse {
            line: self.line_number,
            message: format!("Invalid {} position: '{}'", field_name, s),
        })
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedRecordIter<R> {
        BedRecordIter { reader: self }
    }
}

/// Iterator over BED records.
pub struct BedRecordIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedRecordIter<R> {
    type Item = Result<BedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read all intervals from a BED file.
pub fn read_intervals<P: AsRef<Path>>(path: P) -> Result<Vec<Interval>> {
    let reader = BedReader::from_path(path)?;
    reader
        .records()
        .map(|r| r.map(|rec| rec.interval))
        .collect()
}

/// Read all BED records from a file.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<BedRecord>> {
    let reader = BedReader::from_path(path)?;
    reader.records().collect()
}

/// Parse intervals from a string (useful for testing).
pub fn parse_intervals(content: &str) -> Result<Vec<Interval>> {
    let reader = BedReader::new(content.as_bytes());
    reader
        .records()
        .map(|r| r.map(|rec| rec.interval))
        .collect()
}

/// Write intervals as BED3 using itoa buffers to avoid formatting overhead.
pub fn write_intervals<W: io::Write>(writer: &mut W, intervals: &[Interval]) -> io::Result<()> {
    let mut buf = itoa::Buffer::new();
    for interval in intervals {
        writer.write_all(interval.chrom.as_bytes())?;
        writer.write_all(b"\t")?;
        writer.write_all(buf.format(interval.start).as_bytes())?;
        writer.write_all(b"\t")?;
        writer.write_all(buf.format(interval.end).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write intervals to a BED3 file, creating parent directories as needed.
pub fn write_intervals_to_path<P: AsRef<Path>>(path: P, intervals: &[Interval]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_intervals(&mut writer, intervals)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bed3() {
        let content = "chr1\t100\t200\nchr1\t300\t400\n";
        let intervals = parse_intervals(content).unwrap();

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].chrom, "chr1");
        assert_eq!(intervals[0].start, 100);
        assert_eq!(intervals[0].end, 200);
    }

    #[test]
    fn test_parse_bed6() {
        let content = "chr1\t100\t200\tgene1\t500\t+\n";
        let reader = BedReader::new(content.as_bytes());
        let records: Vec<_> = reader.records().collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, Some("gene1".to_string()));
        assert_eq!(records[0].strand, Some(Strand::Plus));
    }

    #[test]
    fn test_skip_comments_and_track_lines() {
        let content = "# comment\ntrack name=test\nchr1\t100\t200\n";
        let intervals = parse_intervals(content).unwrap();

        assert_eq!(intervals.len(), 1);
    }

    #[test]
    fn test_invalid_bed() {
        let content = "chr1\t100\n"; // Only 2 fields
        let result = parse_intervals(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_intervals() {
        let intervals = vec![
            Interval::new("chr1", 100, 200),
            Interval::new("chr2", 5, 10),
        ];
        let mut out = Vec::new();
        write_intervals(&mut out, &intervals).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\t100\t200\nchr2\t5\t10\n"
        );
    }
}
