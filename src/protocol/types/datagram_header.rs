use bytes::{Buf, BufMut};

use crate::protocol::{
    constants::DatagramFlags,
    packet::{DecodeError, EncodeError, RaknetEncodable},
    types::Sequence24,
};

/// Flags byte and 3-byte sequence number opening every frame datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramHeader {
    pub flags: DatagramFlags,
    pub sequence: Sequence24,
}

impl DatagramHeader {
    pub const ENCODED_SIZE: usize = 4;

    /// Header of a plain data frame, as this client sends them.
    pub fn frame(sequence: Sequence24) -> Self {
        Self {
            flags: DatagramFlags::FRAME,
            sequence,
        }
    }

    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.flags.bits().encode_raknet(dst)?;
        self.sequence.encode_raknet(dst)
    }

    /// Unknown flag bits are dropped rather than rejected.
    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < Self::ENCODED_SIZE {
            return Err(DecodeError::UnexpectedEof);
        }
        let flags = DatagramFlags::from_bits_truncate(u8::decode_raknet(src)?);
        Ok(Self {
            flags,
            sequence: Sequence24::decode_raknet(src)?,
        })
    }
}
