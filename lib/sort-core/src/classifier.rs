//! Single-byte radix classification over a buffer of whole records.
//!
//! Implemented as a two-pass counting sort (count into 256 buckets, then
//! scatter into a same-sized output buffer) — the natural choice called
//! out by the spec, and stable on the classified byte since records are
//! scattered in the order they were encountered within each bucket.

use crate::record::{records, validate_record_buffer, RecordSchemaError, KEY_SIZE, RECORD_SIZE};

/// One contiguous, non-empty run of the output buffer sharing a category id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryRange {
    pub category_id: u8,
    pub start: usize,
    pub end: usize,
}

/// Errors that can occur while classifying a buffer.
#[derive(Debug, snafu::Snafu)]
pub enum ClassifyError {
    #[snafu(display("{source}"))]
    Schema { source: RecordSchemaError },
    #[snafu(display("byte index {index} is outside the 0..{key_size} key range"))]
    ByteIndexOutOfRange { index: usize, key_size: usize },
    #[snafu(display("values_per_category must be a power of two in 1..=256, got {value}"))]
    InvalidCollapseFactor { value: u32 },
}

/// Classifies `buf` (a whole number of records) by key byte `byte_index`
/// under collapse factor `v`, returning a newly-ordered buffer plus the
/// category ranges it covers, in ascending category-id order.
///
/// `buf.len()` must be a multiple of [`RECORD_SIZE`]; `byte_index` must be
/// in `0..KEY_SIZE`; `v` must be one of `1, 2, 4, ..., 256`.
pub fn classify(
    buf: &[u8],
    byte_index: usize,
    v: u32,
) -> Result<(Vec<u8>, Vec<CategoryRange>), ClassifyError> {
    validate_record_buffer(buf).context(SchemaSnafu)?;
    if byte_index >= KEY_SIZE {
        return Err(ClassifyError::ByteIndexOutOfRange {
            index: byte_index,
            key_size: KEY_SIZE,
        });
    }
    if v == 0 || v > 256 || !v.is_power_of_two() {
        return Err(ClassifyError::InvalidCollapseFactor { value: v });
    }

    let num_categories = (256 / v).max(1) as usize;
    let mut counts = vec![0usize; num_categories];

    for record in records(buf) {
        let cat = record.category_of(byte_index, v) as usize;
        counts[cat] += 1;
    }

    // Prefix sums give each category's starting offset in the output.
    let mut offsets = vec![0usize; num_categories + 1];
    for cat in 0..num_categories {
        offsets[cat + 1] = offsets[cat] + counts[cat];
    }

    let mut out = vec![0u8; buf.len()];
    let mut cursor = offsets.clone();
    for record in records(buf) {
        let cat = record.category_of(byte_index, v) as usize;
        let dst = cursor[cat] * RECORD_SIZE;
        out[dst..dst + RECORD_SIZE].copy_from_slice(record.as_bytes());
        cursor[cat] += 1;
    }

    let mut ranges = Vec::new();
    for cat in 0..num_categories {
        let start = offsets[cat];
        let end = offsets[cat + 1];
        if start != end {
            ranges.push(CategoryRange {
                category_id: cat as u8,
                start,
                end,
            });
        }
    }

    Ok((out, ranges))
}

use snafu::ResultExt;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RECORD_SIZE;

    fn record(key0: u8, tag: u8) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0] = key0;
        buf[10] = tag; // payload marker so we can trace record identity
        buf
    }

    #[test]
    fn ranges_cover_buffer_exactly_once_in_ascending_order() {
        let mut buf = Vec::new();
        for key in [5u8, 1, 1, 0, 255, 5] {
            buf.extend_from_slice(&record(key, 0));
        }
        let (out, ranges) = classify(&buf, 0, 1).unwrap();
        assert_eq!(out.len(), buf.len());

        let mut prev_end = 0;
        let mut prev_cat: Option<u8> = None;
        for r in &ranges {
            assert_eq!(r.start, prev_end);
            assert!(r.end > r.start);
            if let Some(p) = prev_cat {
                assert!(p < r.category_id);
            }
            prev_cat = Some(r.category_id);
            prev_end = r.end;
        }
        assert_eq!(prev_end, 6);
    }

    #[test]
    fn sparse_categories_are_absent() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0));
        buf.extend_from_slice(&record(200, 0));
        let (_out, ranges) = classify(&buf, 0, 1).unwrap();
        let ids: Vec<u8> = ranges.iter().map(|r| r.category_id).collect();
        assert_eq!(ids, vec![0, 200]);
    }

    #[test]
    fn classify_is_stable_on_the_classified_byte() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(3, 1));
        buf.extend_from_slice(&record(3, 2));
        buf.extend_from_slice(&record(3, 3));
        let (out, _ranges) = classify(&buf, 0, 1).unwrap();
        let tags: Vec<u8> = out.chunks_exact(RECORD_SIZE).map(|r| r[10]).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn collapse_factor_groups_adjacent_values() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record(0, 0));
        buf.extend_from_slice(&record(1, 0));
        buf.extend_from_slice(&record(2, 0));
        buf.extend_from_slice(&record(3, 0));
        let (_out, ranges) = classify(&buf, 0, 4).unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0], CategoryRange { category_id: 0, start: 0, end: 4 });
    }

    #[test]
    fn rejects_misaligned_buffer() {
        assert!(classify(&[0u8; RECORD_SIZE + 1], 0, 1).is_err());
    }

    #[test]
    fn rejects_byte_index_out_of_range() {
        assert!(classify(&[0u8; RECORD_SIZE], 10, 1).is_err());
    }

    #[test]
    fn rejects_non_power_of_two_collapse_factor() {
        assert!(classify(&[0u8; RECORD_SIZE], 0, 3).is_err());
    }

    #[test]
    fn empty_buffer_yields_no_ranges() {
        let (out, ranges) = classify(&[], 0, 1).unwrap();
        assert!(out.is_empty());
        assert!(ranges.is_empty());
    }
}
