//! Body of ACK/NACK datagrams: a record count followed by singles and ranges.

use bytes::{Buf, BufMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, RaknetEncodable},
    types::Sequence24,
};

/// Inclusive range of datagram sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceRange {
    pub start: Sequence24,
    pub end: Sequence24,
}

impl SequenceRange {
    pub fn single(seq: Sequence24) -> Self {
        Self {
            start: seq,
            end: seq,
        }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Sequence numbers covered, counting across the wrap.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.start.distance_to(self.end) as usize + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AckNackPayload {
    pub ranges: Vec<SequenceRange>,
}

impl AckNackPayload {
    pub fn single(seq: Sequence24) -> Self {
        Self {
            ranges: vec![SequenceRange::single(seq)],
        }
    }

    /// Number of sequence numbers covered by all records.
    pub fn len(&self) -> usize {
        self.ranges.iter().map(SequenceRange::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl RaknetEncodable for AckNackPayload {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        u16::try_from(self.ranges.len())
            .map_err(|_| EncodeError::TooManyRanges(self.ranges.len()))?
            .encode_raknet(dst)?;
        for range in &self.ranges {
            range.is_single().encode_raknet(dst)?;
            range.start.encode_raknet(dst)?;
            if !range.is_single() {
                range.end.encode_raknet(dst)?;
            }
        }
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let count = u16::decode_raknet(src)?;
        let mut ranges = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let single = bool::decode_raknet(src)?;
            let start = Sequence24::decode_raknet(src)?;
            let end = if single {
                start
            } else {
                Sequence24::decode_raknet(src)?
            };
            ranges.push(SequenceRange { start, end });
        }
        Ok(Self { ranges })
    }
}
