use bytes::{Buf, BufMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, RaknetEncodable},
    reliability::Reliability,
};

const RELIABILITY_SHIFT: u8 = 5;
const SPLIT_FLAG: u8 = 0b0001_0000;

/// Flags byte of an encapsulated packet: reliability in the top three
/// bits, the split flag below it. The low nibble is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncapsulatedPacketHeader {
    pub reliability: Reliability,
    pub is_split: bool,
}

impl EncapsulatedPacketHeader {
    pub fn to_byte(self) -> u8 {
        let mut b = (self.reliability as u8) << RELIABILITY_SHIFT;
        if self.is_split {
            b |= SPLIT_FLAG;
        }
        b
    }

    pub fn from_byte(b: u8) -> Self {
        Self {
            reliability: Reliability::from_bits(b >> RELIABILITY_SHIFT),
            is_split: b & SPLIT_FLAG != 0,
        }
    }
}

impl RaknetEncodable for EncapsulatedPacketHeader {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_u8(self.to_byte());
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self::from_byte(u8::decode_raknet(src)?))
    }
}
