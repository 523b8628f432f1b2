use bytes::{Buf, BufMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, RaknetEncodable},
    types::I32LE,
};

/// Length-prefixed string used by the game layer: a 4-byte little-endian
/// signed length followed by UTF-8 bytes. `None` is written as length -1
/// with no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RakString(pub Option<String>);

impl RakString {
    pub fn new(s: impl Into<String>) -> Self {
        RakString(Some(s.into()))
    }

    pub fn null() -> Self {
        RakString(None)
    }
}

impl From<&str> for RakString {
    fn from(s: &str) -> Self {
        RakString::new(s)
    }
}

impl RaknetEncodable for RakString {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        match &self.0 {
            None => I32LE(-1).encode_raknet(dst)?,
            Some(s) => {
                let len =
                    i32::try_from(s.len()).map_err(|_| EncodeError::StringTooLong(s.len()))?;
                I32LE(len).encode_raknet(dst)?;
                dst.put_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let len = I32LE::decode_raknet(src)?.0;
        if len == -1 {
            return Ok(RakString(None));
        }
        let n = usize::try_from(len).map_err(|_| DecodeError::InvalidStringLength(len))?;
        if src.remaining() < n {
            return Err(DecodeError::UnexpectedEof);
        }
        let raw = src.copy_to_bytes(n);
        let s = String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(RakString(Some(s)))
    }
}
