// Copyright @yucwang 2026

use crate::core::error::{Result, TracerError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::ops::RangeInclusive;

/// Contiguous, inclusive block of particle indices handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    start: u64,
    end: u64,
}

impl WorkRange {
    /// `end` is inclusive and must not precede `start`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end >= start, "empty work range [{}, {}]", start, end);
        Self { start, end }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn indices(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }

    pub fn serialize<W: Write>(&self, stream: &mut W) -> Result<()> {
        stream.write_u64::<BigEndian>(self.start)?;
        stream.write_u64::<BigEndian>(self.end)?;
        Ok(())
    }

    pub fn deserialize<R: Read>(stream: &mut R) -> Result<Self> {
        let start = stream.read_u64::<BigEndian>()?;
        let end = stream.read_u64::<BigEndian>()?;
        if end < start {
            return Err(TracerError::Malformed(format!("work range end {} precedes start {}", end, start)));
        }
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::WorkRange;
    use crate::core::error::TracerError;

    #[test]
    fn test_len_and_indices() {
        let range = WorkRange::new(4, 9);
        assert_eq!(range.len(), 6);
        assert_eq!(range.indices().collect::<Vec<u64>>(), vec![4, 5, 6, 7, 8, 9]);
        assert_eq!(WorkRange::new(3, 3).len(), 1);
    }

    #[test]
    fn test_wire_format() {
        let mut buf = Vec::new();
        WorkRange::new(1, 258).serialize(&mut buf).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 2]);
        let decoded = WorkRange::deserialize(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, WorkRange::new(1, 258));
    }

    #[test]
    fn test_truncated_or_inverted_input_is_rejected() {
        let mut short: &[u8] = &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0];
        assert!(matches!(WorkRange::deserialize(&mut short), Err(TracerError::Io(_))));

        let mut inverted: &[u8] = &[0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0, 2];
        assert!(matches!(WorkRange::deserialize(&mut inverted), Err(TracerError::Malformed(_))));
    }
}
