use bytes::{Buf, BufMut, Bytes};

use crate::protocol::{
    packet::{DecodeError, EncodeError, RaknetEncodable},
    reliability::Reliability,
    types::{EncapsulatedPacketHeader, Sequence24},
};

/// Ordering index and the channel it counts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub index: Sequence24,
    pub channel: u8,
}

impl RaknetEncodable for Ordering {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.index.encode_raknet(dst)?;
        self.channel.encode_raknet(dst)
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            index: Sequence24::decode_raknet(src)?,
            channel: u8::decode_raknet(src)?,
        })
    }
}

/// Split header of a fragment. Fragments are never reassembled, so
/// its contents are carried as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitHeader(pub [u8; SplitHeader::SIZE]);

impl SplitHeader {
    pub const SIZE: usize = 12;
}

impl RaknetEncodable for SplitHeader {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_slice(&self.0);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < Self::SIZE {
            return Err(DecodeError::UnexpectedEof);
        }
        let mut raw = [0u8; Self::SIZE];
        src.copy_to_slice(&mut raw);
        Ok(Self(raw))
    }
}

/// One message inside a frame datagram.
///
/// After the flags byte and the bit length come a 3-byte reliable index
/// (type 2 and up), a 4-byte ordering block (type 3 and up) and a
/// 12-byte split header when the split bit is set. The payload follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedPacket {
    pub header: EncapsulatedPacketHeader,
    pub bit_length: u16,
    pub reliable_index: Option<Sequence24>,
    pub ordering: Option<Ordering>,
    pub split: Option<SplitHeader>,
    pub payload: Bytes,
}

impl EncapsulatedPacket {
    /// Unsplit reliable-ordered message whose reliable and ordering
    /// indexes are both `index`.
    pub fn reliable_ordered(
        index: Sequence24,
        channel: u8,
        payload: Bytes,
    ) -> Result<Self, EncodeError> {
        let bit_length = u16::try_from(payload.len() * 8)
            .map_err(|_| EncodeError::PayloadTooLarge(payload.len()))?;
        Ok(Self {
            header: EncapsulatedPacketHeader {
                reliability: Reliability::ReliableOrdered,
                is_split: false,
            },
            bit_length,
            reliable_index: Some(index),
            ordering: Some(Ordering { index, channel }),
            split: None,
            payload,
        })
    }

    /// Payload size in whole bytes.
    pub fn payload_len(&self) -> usize {
        usize::from(self.bit_length).div_ceil(8)
    }
}

fn encode_present<T: RaknetEncodable>(
    present: bool,
    value: Option<&T>,
    dst: &mut impl BufMut,
) -> Result<(), EncodeError> {
    match (present, value) {
        (true, Some(v)) => v.encode_raknet(dst),
        (true, None) => Err(EncodeError::MissingField),
        (false, _) => Ok(()),
    }
}

fn decode_present<T: RaknetEncodable>(
    present: bool,
    src: &mut impl Buf,
) -> Result<Option<T>, DecodeError> {
    present.then(|| T::decode_raknet(src)).transpose()
}

impl RaknetEncodable for EncapsulatedPacket {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        let rel = self.header.reliability;
        self.header.encode_raknet(dst)?;
        self.bit_length.encode_raknet(dst)?;
        encode_present(rel.has_reliable_index(), self.reliable_index.as_ref(), dst)?;
        encode_present(rel.has_ordering(), self.ordering.as_ref(), dst)?;
        encode_present(self.header.is_split, self.split.as_ref(), dst)?;
        dst.put_slice(&self.payload);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let header = EncapsulatedPacketHeader::decode_raknet(src)?;
        let rel = header.reliability;
        let bit_length = u16::decode_raknet(src)?;
        let reliable_index = decode_present(rel.has_reliable_index(), src)?;
        let ordering = decode_present(rel.has_ordering(), src)?;
        let split = decode_present(header.is_split, src)?;

        let needed = usize::from(bit_length).div_ceil(8);
        if src.remaining() < needed {
            return Err(DecodeError::BitLengthMismatch {
                bit_length,
                needed,
                available: src.remaining(),
            });
        }

        Ok(Self {
            header,
            bit_length,
            reliable_index,
            ordering,
            split,
            payload: src.copy_to_bytes(needed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn reliable_ordered_layout() {
        let pkt =
            EncapsulatedPacket::reliable_ordered(Sequence24::new(5), 0, Bytes::from_static(b"ab"))
                .unwrap();
        let mut buf = BytesMut::new();
        pkt.encode_raknet(&mut buf).unwrap();
        assert_eq!(
            &buf[..],
            &[0x60, 0x00, 0x10, 5, 0, 0, 5, 0, 0, 0x00, b'a', b'b']
        );
    }

    #[test]
    fn unreliable_has_no_indexes() {
        let raw: &[u8] = &[0x00, 0x00, 0x08, 0xAB];
        let mut src = raw;
        let pkt = EncapsulatedPacket::decode_raknet(&mut src).unwrap();
        assert_eq!(pkt.reliable_index, None);
        assert_eq!(pkt.ordering, None);
        assert_eq!(&pkt.payload[..], &[0xAB]);
    }

    #[test]
    fn unreliable_sequenced_has_no_indexes() {
        let raw: &[u8] = &[0x20, 0x00, 0x08, 0xAB];
        let mut src = raw;
        let pkt = EncapsulatedPacket::decode_raknet(&mut src).unwrap();
        assert_eq!(pkt.header.reliability, Reliability::UnreliableSequenced);
        assert_eq!(pkt.reliable_index, None);
        assert_eq!(&pkt.payload[..], &[0xAB]);
        assert!(src.is_empty());
    }

    #[test]
    fn reliable_has_only_reliable_index() {
        let raw: &[u8] = &[0x40, 0x00, 0x08, 1, 0, 0, 0xCD];
        let mut src = raw;
        let pkt = EncapsulatedPacket::decode_raknet(&mut src).unwrap();
        assert_eq!(pkt.reliable_index, Some(Sequence24::new(1)));
        assert_eq!(pkt.ordering, None);
        assert_eq!(&pkt.payload[..], &[0xCD]);
    }

    #[test]
    fn higher_types_carry_index_and_ordering() {
        // types 4..=7: reliable index (3) + ordering block (4)
        for flags in [0x80u8, 0xA0, 0xC0, 0xE0] {
            let raw = [flags, 0x00, 0x08, 1, 0, 0, 3, 0, 0, 4, 0xCD, 0xFF];
            let mut src = &raw[..];
            let pkt = EncapsulatedPacket::decode_raknet(&mut src).unwrap();
            assert_eq!(pkt.reliable_index, Some(Sequence24::new(1)));
            assert_eq!(
                pkt.ordering,
                Some(Ordering {
                    index: Sequence24::new(3),
                    channel: 4
                })
            );
            assert_eq!(&pkt.payload[..], &[0xCD]);
            assert_eq!(src, &[0xFF]);
        }
    }

    #[test]
    fn split_header_is_skipped() {
        let mut raw = vec![0x70, 0x00, 0x08, 1, 0, 0, 1, 0, 0, 0];
        raw.extend_from_slice(&[0, 0, 0, 2, 0, 7, 0, 0, 0, 1, 0, 0]);
        raw.push(0xEE);
        let mut src = &raw[..];
        let pkt = EncapsulatedPacket::decode_raknet(&mut src).unwrap();
        assert_eq!(
            pkt.split,
            Some(SplitHeader([0, 0, 0, 2, 0, 7, 0, 0, 0, 1, 0, 0]))
        );
        assert_eq!(&pkt.payload[..], &[0xEE]);
    }

    #[test]
    fn short_split_header_is_eof() {
        let raw: &[u8] = &[0x10, 0x00, 0x08, 0, 0, 0];
        let mut src = raw;
        assert_eq!(
            EncapsulatedPacket::decode_raknet(&mut src),
            Err(DecodeError::UnexpectedEof)
        );
    }

    #[test]
    fn bit_length_rounds_up() {
        // 9 bits -> 2 bytes
        let raw: &[u8] = &[0x00, 0x00, 0x09, 0x11, 0x22, 0x33];
        let mut src = raw;
        let pkt = EncapsulatedPacket::decode_raknet(&mut src).unwrap();
        assert_eq!(pkt.payload_len(), 2);
        assert_eq!(&pkt.payload[..], &[0x11, 0x22]);
        assert_eq!(src, &[0x33]);
    }

    #[test]
    fn overlong_bit_length_is_rejected() {
        let raw: &[u8] = &[0x00, 0x00, 0x40, 0x01];
        let mut src = raw;
        assert!(matches!(
            EncapsulatedPacket::decode_raknet(&mut src),
            Err(DecodeError::BitLengthMismatch {
                bit_length: 64,
                needed: 8,
                available: 1
            })
        ));
    }

    #[test]
    fn oversized_payload_cannot_be_framed() {
        let payload = Bytes::from(vec![0u8; 8192]);
        assert!(matches!(
            EncapsulatedPacket::reliable_ordered(Sequence24::new(0), 0, payload),
            Err(EncodeError::PayloadTooLarge(8192))
        ));
    }

    #[test]
    fn flags_without_matching_field_fail_to_encode() {
        let mut pkt =
            EncapsulatedPacket::reliable_ordered(Sequence24::new(0), 0, Bytes::from_static(b"a"))
                .unwrap();
        pkt.ordering = None;
        let mut buf = BytesMut::new();
        assert_eq!(pkt.encode_raknet(&mut buf), Err(EncodeError::MissingField));
    }
}
