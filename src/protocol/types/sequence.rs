use std::fmt;

use bytes::{Buf, BufMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, RaknetEncodable},
    types::U24LE,
};

const MASK: u32 = 0x00FF_FFFF;

/// 24-bit datagram/message counter that wraps to zero after 0xFFFFFF.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Sequence24(u32);

impl Sequence24 {
    pub fn new(v: u32) -> Sequence24 {
        Sequence24(v & MASK)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Sequence24 {
        Sequence24::new(self.0.wrapping_add(1))
    }

    /// Steps needed to walk forward from `self` to `other`, wrapping.
    pub fn distance_to(&self, other: Sequence24) -> u32 {
        other.0.wrapping_sub(self.0) & MASK
    }
}

impl fmt::Display for Sequence24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl RaknetEncodable for Sequence24 {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        U24LE(self.0).encode_raknet(dst)
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        U24LE::decode_raknet(src).map(|raw| Sequence24::new(raw.0))
    }
}
