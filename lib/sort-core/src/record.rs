//! The fixed 100-byte record format: a 10-byte unsigned-lexicographic key
//! followed by 90 bytes of opaque payload.

use std::fmt;

/// Width of one record, in bytes.
pub const RECORD_SIZE: usize = 100;

/// Width of the key prefix of a record, in bytes.
pub const KEY_SIZE: usize = 10;

/// Number of distinct values a single key byte can take, and therefore the
/// maximum number of categories a single radix pass can produce.
pub const MAX_NUM_CATEGORIES: usize = 256;

/// A borrowed view over one 100-byte record inside a larger buffer.
///
/// `Record` never copies; it is only ever a window into a buffer owned by
/// the caller (the worker's scratch buffer, or a loaded category's
/// in-memory concatenation).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Record<'a>(&'a [u8; RECORD_SIZE]);

impl<'a> Record<'a> {
    /// Wraps a byte slice of exactly `RECORD_SIZE` bytes as a record.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len() != RECORD_SIZE`. Callers are expected to have
    /// already validated buffer lengths against `RECORD_SIZE` (see
    /// [`validate_record_buffer`]) before slicing out individual records.
    pub fn new(bytes: &'a [u8]) -> Self {
        Record(bytes.try_into().expect("record must be exactly RECORD_SIZE bytes"))
    }

    /// The raw 100 bytes of this record.
    pub fn as_bytes(&self) -> &'a [u8; RECORD_SIZE] {
        self.0
    }

    /// The 10-byte key prefix.
    pub fn key(&self) -> &'a [u8] {
        &self.0[..KEY_SIZE]
    }

    /// The 90-byte opaque payload.
    pub fn payload(&self) -> &'a [u8] {
        &self.0[KEY_SIZE..]
    }

    /// Byte `i` of the key, `0` is the most-significant byte.
    ///
    /// # Panics
    ///
    /// Panics if `i >= KEY_SIZE`.
    pub fn key_byte(&self, i: usize) -> u8 {
        self.0[i]
    }

    /// The category this record falls into at pass `i` under collapse
    /// factor `v`: `key_byte(i) / v`, integer division.
    pub fn category_of(&self, i: usize, v: u32) -> u8 {
        (u32::from(self.key_byte(i)) / v) as u8
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("key", &hex(self.key()))
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Unsigned lexicographic comparison over the 10-byte key.
pub fn compare(a: Record<'_>, b: Record<'_>) -> std::cmp::Ordering {
    a.key().cmp(b.key())
}

/// Returns `Err` if `buf.len()` is not a whole multiple of `RECORD_SIZE`.
///
/// A non-aligned buffer indicates a corrupt or truncated input object; the
/// caller should treat this as a fatal schema error (spec §7).
pub fn validate_record_buffer(buf: &[u8]) -> Result<usize, RecordSchemaError> {
    if buf.len() % RECORD_SIZE != 0 {
        return Err(RecordSchemaError {
            len: buf.len(),
            record_size: RECORD_SIZE,
        });
    }
    Ok(buf.len() / RECORD_SIZE)
}

/// An object's byte length was not a multiple of [`RECORD_SIZE`].
#[derive(Debug, snafu::Snafu)]
#[snafu(display(
    "object size {len} is not a multiple of the {record_size}-byte record format"
))]
pub struct RecordSchemaError {
    len: usize,
    record_size: usize,
}

/// Iterates whole records out of a byte buffer, in order.
pub fn records(buf: &[u8]) -> impl Iterator<Item = Record<'_>> {
    buf.chunks_exact(RECORD_SIZE).map(Record::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_key(key0: u8) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0] = key0;
        buf
    }

    #[test]
    fn category_of_is_integer_division() {
        let buf = record_with_key(0xFF);
        let r = Record::new(&buf);
        assert_eq!(r.category_of(0, 1), 0xFF);
        assert_eq!(r.category_of(0, 2), 0x7F);
        assert_eq!(r.category_of(0, 256), 0);
    }

    #[test]
    fn compare_is_unsigned_lexicographic() {
        let low = record_with_key(0x00);
        let high = record_with_key(0xFF);
        assert_eq!(compare(Record::new(&low), Record::new(&high)), std::cmp::Ordering::Less);
    }

    #[test]
    fn validate_rejects_misaligned_buffers() {
        assert!(validate_record_buffer(&[0u8; RECORD_SIZE]).is_ok());
        assert!(validate_record_buffer(&[0u8; RECORD_SIZE + 1]).is_err());
    }

    #[test]
    fn records_iterates_in_order() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&record_with_key(1));
        buf.extend_from_slice(&record_with_key(2));
        let keys: Vec<u8> = records(&buf).map(|r| r.key_byte(0)).collect();
        assert_eq!(keys, vec![1, 2]);
    }
}
