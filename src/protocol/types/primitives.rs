use bytes::{Buf, BufMut};

use crate::protocol::packet::{DecodeError, EncodeError, RaknetEncodable};
use crate::protocol::types::Magic;

fn ensure(src: &impl Buf, len: usize) -> Result<(), DecodeError> {
    if src.remaining() < len {
        Err(DecodeError::UnexpectedEof)
    } else {
        Ok(())
    }
}

impl RaknetEncodable for u8 {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_u8(*self);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        ensure(src, 1)?;
        Ok(src.get_u8())
    }
}

/// One byte; only `1` reads back as true.
impl RaknetEncodable for bool {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        u8::from(*self).encode_raknet(dst)
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        u8::decode_raknet(src).map(|b| b == 1)
    }
}

impl RaknetEncodable for Magic {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        dst.put_slice(self);
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let mut magic: Magic = [0; 16];
        ensure(src, magic.len())?;
        src.copy_to_slice(&mut magic);
        Ok(magic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::DEFAULT_UNCONNECTED_MAGIC;

    #[test]
    fn bool_decodes_only_one_as_true() {
        let mut slice: &[u8] = &[0x01, 0x00, 0x02];
        assert!(bool::decode_raknet(&mut slice).unwrap());
        assert!(!bool::decode_raknet(&mut slice).unwrap());
        assert!(!bool::decode_raknet(&mut slice).unwrap());
        assert_eq!(bool::decode_raknet(&mut slice), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn magic_is_the_offline_cookie() {
        let mut buf = Vec::new();
        DEFAULT_UNCONNECTED_MAGIC.encode_raknet(&mut buf).unwrap();
        assert_eq!(
            buf,
            [
                0x00, 0xFF, 0xFF, 0x00, 0xFE, 0xFE, 0xFE, 0xFE, 0xFD, 0xFD, 0xFD, 0xFD, 0x12, 0x34,
                0x56, 0x78
            ]
        );
        assert_eq!(Magic::decode_raknet(&mut &buf[..]).unwrap(), DEFAULT_UNCONNECTED_MAGIC);
    }

    #[test]
    fn truncated_magic_is_eof() {
        let mut slice: &[u8] = &DEFAULT_UNCONNECTED_MAGIC[..15];
        assert_eq!(Magic::decode_raknet(&mut slice), Err(DecodeError::UnexpectedEof));
    }
}
