use crate::protocol::packet::{DecodeError, EncodeError, RaknetEncodable};
use bytes::{Buf, BufMut};
use std::mem;
use std::time::{SystemTime, UNIX_EPOCH};

mod address;
mod datagram_header;
mod encapsulated_header;
mod primitives;
mod sequence;
mod string;

pub use datagram_header::DatagramHeader;
pub use encapsulated_header::EncapsulatedPacketHeader;
pub use sequence::Sequence24;
pub use string::RakString;

/// Offline message cookie.
pub type Magic = [u8; 16];

/// Big-endian, RakNet's default byte order.
macro_rules! impl_be_int {
    ($($ty:ty => $put:ident, $get:ident;)+) => {$(
        impl RaknetEncodable for $ty {
            fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
                dst.$put(*self);
                Ok(())
            }

            fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
                if src.remaining() < mem::size_of::<$ty>() {
                    return Err(DecodeError::UnexpectedEof);
                }
                Ok(src.$get())
            }
        }
    )+};
}

impl_be_int! {
    u16 => put_u16, get_u16;
    u32 => put_u32, get_u32;
    u64 => put_u64, get_u64;
}

/// Little-endian newtypes. The game layer writes its ids little-endian
/// while RakNet itself is big-endian, so the wrapper picks the order.
macro_rules! le_newtype {
    ($($name:ident($ty:ty) => $put:ident, $get:ident;)+) => {$(
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub $ty);

        impl RaknetEncodable for $name {
            fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
                dst.$put(self.0);
                Ok(())
            }

            fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
                if src.remaining() < mem::size_of::<$ty>() {
                    return Err(DecodeError::UnexpectedEof);
                }
                Ok($name(src.$get()))
            }
        }
    )+};
}

le_newtype! {
    U16LE(u16) => put_u16_le, get_u16_le;
    U32LE(u32) => put_u32_le, get_u32_le;
    I32LE(i32) => put_i32_le, get_i32_le;
    U64LE(u64) => put_u64_le, get_u64_le;
    I64LE(i64) => put_i64_le, get_i64_le;
}

/// 3-byte little-endian integer used for sequence and message indexes.
/// Bits above 24 are dropped on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U24LE(pub u32);

impl RaknetEncodable for U24LE {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_uint_le(u64::from(self.0 & 0x00FF_FFFF), 3);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < 3 {
            return Err(DecodeError::UnexpectedEof);
        }
        Ok(U24LE(src.get_uint_le(3) as u32))
    }
}

/// 3-byte big-endian integer. Bits above 24 are dropped on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U24BE(pub u32);

impl RaknetEncodable for U24BE {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_uint(u64::from(self.0 & 0x00FF_FFFF), 3);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        if src.remaining() < 3 {
            return Err(DecodeError::UnexpectedEof);
        }
        Ok(U24BE(src.get_uint(3) as u32))
    }
}

/// Wall-clock milliseconds, big-endian u64 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaknetTime(pub u64);

impl RaknetTime {
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        RaknetTime(ms)
    }
}

impl RaknetEncodable for RaknetTime {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.0.encode_raknet(dst)
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        u64::decode_raknet(src).map(RaknetTime)
    }
}

/// Zero bytes filling the rest of a datagram. Decoding swallows
/// whatever is left and records its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EoBPadding(pub usize);

impl RaknetEncodable for EoBPadding {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_bytes(0, self.0);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let len = src.remaining();
        src.advance(len);
        Ok(EoBPadding(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u24le_layout_and_truncation() {
        let mut buf = Vec::new();
        U24LE(0x0123_4567).encode_raknet(&mut buf).unwrap();
        assert_eq!(buf, [0x67, 0x45, 0x23]);
        assert_eq!(U24LE::decode_raknet(&mut &buf[..]).unwrap().0, 0x23_4567);
    }

    #[test]
    fn u24_byte_orders_mirror_each_other() {
        let mut le = Vec::new();
        let mut be = Vec::new();
        U24LE(0x0A0B0C).encode_raknet(&mut le).unwrap();
        U24BE(0x0A0B0C).encode_raknet(&mut be).unwrap();
        assert_eq!(be, [0x0A, 0x0B, 0x0C]);
        le.reverse();
        assert_eq!(le, be);
        assert_eq!(U24BE::decode_raknet(&mut &be[..]).unwrap().0, 0x0A0B0C);
    }

    #[test]
    fn short_widths_in_both_orders() {
        let mut buf = Vec::new();
        0x0102u16.encode_raknet(&mut buf).unwrap();
        U16LE(0x0102).encode_raknet(&mut buf).unwrap();
        0x01020304u32.encode_raknet(&mut buf).unwrap();
        U32LE(0x01020304).encode_raknet(&mut buf).unwrap();
        I32LE(-1).encode_raknet(&mut buf).unwrap();
        assert_eq!(
            buf,
            [1, 2, 2, 1, 1, 2, 3, 4, 4, 3, 2, 1, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn mixed_endianness_fields() {
        let mut buf = Vec::new();
        0x0102u16.encode_raknet(&mut buf).unwrap();
        I64LE(-2).encode_raknet(&mut buf).unwrap();
        U64LE(1).encode_raknet(&mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x01, 0x02]);
        assert_eq!(&buf[2..10], &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&buf[10..], &[0x01, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn padding_consumes_the_rest() {
        let mut src: &[u8] = &[0, 0, 0, 0, 0];
        assert_eq!(EoBPadding::decode_raknet(&mut src).unwrap(), EoBPadding(5));
        assert!(src.is_empty());
    }

    #[test]
    fn short_buffer_is_eof() {
        let mut slice: &[u8] = &[0x01];
        assert_eq!(u16::decode_raknet(&mut slice), Err(DecodeError::UnexpectedEof));
        let mut slice: &[u8] = &[0x01, 0x02];
        assert_eq!(U24LE::decode_raknet(&mut slice), Err(DecodeError::UnexpectedEof));
    }
}
