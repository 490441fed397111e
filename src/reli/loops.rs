//! Chromatin loop representation and anchor file I/O.
//!
//! A loop is a pair of anchors on the same chromosome. Loops arrive
//! either as a six-column table (both anchors per row) or as two parallel
//! BED files carrying the left and right anchors separately.

use super::{ReliError, Result};
use crate::bed;
use crate::interval::Interval;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A two-anchor chromatin loop. Anchors are ordered: the left anchor ends
/// at or before the right anchor starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    pub chrom: String,
    pub left_start: u64,
    pub left_end: u64,
    pub right_start: u64,
    pub right_end: u64,
}

impl Loop {
    pub fn left_anchor(&self) -> Interval {
        Interval::new(self.chrom.clone(), self.left_start, self.left_end)
    }

    pub fn right_anchor(&self) -> Interval {
        Interval::new(self.chrom.clone(), self.right_start, self.right_end)
    }

    pub fn left_width(&self) -> u64 {
        self.left_end - self.left_start
    }

    pub fn right_width(&self) -> u64 {
        self.right_end - self.right_start
    }

    /// Inner span between the anchors. Kept signed so randomized
    /// placement arithmetic never wraps.
    pub fn distance(&self) -> i64 {
        self.right_start as i64 - self.left_end as i64
    }
}

/// Read loops from a six-column table: chrom, left start/end, chrom,
/// right start/end. The two chromosome columns must agree on every row.
pub fn read_loops<P: AsRef<Path>>(path: P) -> Result<Vec<Loop>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut loops = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() < 6 {
            return Err(ReliError::Parse {
                path: path.to_path_buf(),
                line: line_no + 1,
                message: format!("expected 6 columns, got {}", fields.len()),
            });
        }

        let parse = |raw: &str, what: &str| -> Result<u64> {
            raw.parse().map_err(|_| ReliError::Parse {
                path: path.to_path_buf(),
                line: line_no + 1,
                message: format!("invalid {} '{}'", what, raw),
            })
        };

        if fields[0] != fields[3] {
            return Err(ReliError::Parse {
                path: path.to_path_buf(),
                line: line_no + 1,
                message: format!(
                    "anchors on different chromosomes: '{}' vs '{}'",
                    fields[0], fields[3]
                ),
            });
        }

        loops.push(Loop {
            chrom: fields[0].to_string(),
            left_start: parse(fields[1], "left start")?,
            left_end: parse(fields[2], "left end")?,
            right_start: parse(fields[4], "right start")?,
            right_end: parse(fields[5], "right end")?,
        });
    }
    Ok(loops)
}

/// Write the left and right anchors as two parallel BED4 files. Row `i`
/// of each file belongs to loop `i`.
pub fn write_anchor_beds<P: AsRef<Path>>(left_path: P, right_path: P, loops: &[Loop]) -> Result<()> {
    write_anchor_bed(left_path.as_ref(), loops, "left", |l| {
        (l.left_start, l.left_end)
    })?;
    write_anchor_bed(right_path.as_ref(), loops, "right", |l| {
        (l.right_start, l.right_end)
    })
}

fn write_anchor_bed<F>(path: &Path, loops: &[Loop], side: &str, coords: F) -> Result<()>
where
    F: Fn(&Loop) -> (u64, u64),
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    let mut buf = itoa::Buffer::new();
    for (i, l) in loops.iter().enumerate() {
        let (start, end) = coords(l);
        w.write_all(l.chrom.as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(buf.format(start).as_bytes())?;
        w.write_all(b"\t")?;
        w.write_all(buf.format(end).as_bytes())?;
        writeln!(w, "\t{}_loop{}", side, i)?;
    }
    w.flush()?;
    Ok(())
}

/// Reassemble loops from two parallel anchor BED files. The files must
/// carry the same number of records, row-aligned.
pub fn loops_from_anchor_beds<P: AsRef<Path>>(left_path: P, right_path: P) -> Result<Vec<Loop>> {
    let left = bed::read_records(left_path)?;
    let right = bed::read_records(right_path)?;
    if left.len() != right.len() {
        return Err(ReliError::AnchorCountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    left.into_iter()
        .zip(right)
        .map(|(l, r)| {
            if l.chrom() != r.chrom() {
                return Err(ReliError::Parse {
                    path: Path::new("<anchor beds>").to_path_buf(),
                    line: 0,
                    message: format!(
                        "paired anchors on different chromosomes: '{}' vs '{}'",
                        l.chrom(),
                        r.chrom()
                    ),
                });
            }
            Ok(Loop {
                chrom: l.interval.chrom.clone(),
                left_start: l.interval.start,
                left_end: l.interval.end,
                right_start: r.interval.start,
                right_end: r.interval.end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, content: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_loop_geometry() {
        let l = Loop {
            chrom: "chr1".to_string(),
            left_start: 1000,
            left_end: 1200,
            right_start: 5000,
            right_end: 5300,
        };
        assert_eq!(l.left_width(), 200);
        assert_eq!(l.right_width(), 300);
        assert_eq!(l.distance(), 3800);
        assert_eq!(l.left_anchor(), Interval::new("chr1", 1000, 1200));
        assert_eq!(l.right_anchor(), Interval::new("chr1", 5000, 5300));
    }

    #[test]
    fn test_read_loops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loops.tsv");
        write_file(
            &path,
            "# header comment\nchr1\t1000\t1200\tchr1\t5000\t5300\nchr2\t10\t20\tchr2\t100\t120\n",
        );

        let loops = read_loops(&path).unwrap();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].chrom, "chr1");
        assert_eq!(loops[1].right_end, 120);
    }

    #[test]
    fn test_read_loops_rejects_trans_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loops.tsv");
        write_file(&path, "chr1\t1000\t1200\tchr2\t5000\t5300\n");

        let err = read_loops(&path).unwrap_err();
        assert!(matches!(err, ReliError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_anchor_bed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left.bed");
        let right = dir.path().join("right.bed");

        let loops = vec![
            Loop {
                chrom: "chr1".to_string(),
                left_start: 1000,
                left_end: 1200,
                right_start: 5000,
                right_end: 5300,
            },
            Loop {
                chrom: "chr2".to_string(),
                left_start: 10,
                left_end: 20,
                right_start: 100,
                right_end: 120,
            },
        ];
        write_anchor_beds(&left, &right, &loops).unwrap();

        let content = std::fs::read_to_string(&left).unwrap();
        assert!(content.starts_with("chr1\t1000\t1200\tleft_loop0\n"));

        let restored = loops_from_anchor_beds(&left, &right).unwrap();
        assert_eq!(restored, loops);
    }

    #[test]
    fn test_anchor_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("left.bed");
        let right = dir.path().join("right.bed");
        write_file(&left, "chr1\t100\t200\nchr1\t300\t400\n");
        write_file(&right, "chr1\t500\t600\n");

        let err = loops_from_anchor_beds(&left, &right).unwrap_err();
        assert!(matches!(
            err,
            ReliError::AnchorCountMismatch { left: 2, right: 1 }
        ));
    }
}
