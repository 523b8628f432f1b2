//! Game-layer messages exchanged once the RakNet session is up.
//!
//! The server challenges every new connection with a verify-player
//! request that carries an owner connection id; the client must echo that
//! id back in its verify-player message along with its identity.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::{
    constants::{
        CHANNEL_GENERAL_TRAFFIC, MSG_VERIFY_PLAYER, MSG_VERIFY_PLAYER_REQUEST,
        VERIFY_REQUEST_MIN_LEN, VERIFY_REQUEST_OWNER_ID_OFFSET,
    },
    packet::{DecodeError, EncodeError, RaknetEncodable},
    types::{I64LE, RakString, U64LE},
};

/// How the client claims to have reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionMethod {
    #[default]
    RocketNet = 0,
}

/// Server challenge. Only the owner connection id is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyPlayerRequest {
    pub owner_connection_id: i64,
}

impl VerifyPlayerRequest {
    /// Returns `None` when the payload is not a verify-player request.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < VERIFY_REQUEST_MIN_LEN
            || payload[0] != CHANNEL_GENERAL_TRAFFIC
            || payload[1] != MSG_VERIFY_PLAYER_REQUEST
        {
            return None;
        }
        let mut src = &payload[VERIFY_REQUEST_OWNER_ID_OFFSET..];
        I64LE::decode_raknet(&mut src)
            .ok()
            .map(|id| VerifyPlayerRequest {
                owner_connection_id: id.0,
            })
    }
}

/// Client response to the challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPlayer {
    pub owner_connection_id: i64,
    pub client_id: u64,
    pub name: String,
    pub password: String,
    pub version: String,
    pub connection_method: ConnectionMethod,
}

impl VerifyPlayer {
    pub fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::new();
        buf.put_u8(CHANNEL_GENERAL_TRAFFIC);
        buf.put_u8(MSG_VERIFY_PLAYER);
        I64LE(self.owner_connection_id).encode_raknet(&mut buf)?;
        U64LE(self.client_id).encode_raknet(&mut buf)?;
        RakString::new(self.name.as_str()).encode_raknet(&mut buf)?;
        RakString::new(self.password.as_str()).encode_raknet(&mut buf)?;
        RakString::new(self.version.as_str()).encode_raknet(&mut buf)?;
        buf.put_u8(self.connection_method as u8);
        Ok(buf.freeze())
    }

    /// Inverse of `to_bytes`, used to inspect what was sent.
    pub fn parse(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut src = payload;
        let channel = u8::decode_raknet(&mut src)?;
        let id = u8::decode_raknet(&mut src)?;
        if channel != CHANNEL_GENERAL_TRAFFIC || id != MSG_VERIFY_PLAYER {
            return Err(DecodeError::UnknownId(id));
        }
        let owner_connection_id = I64LE::decode_raknet(&mut src)?.0;
        let client_id = U64LE::decode_raknet(&mut src)?.0;
        let name = RakString::decode_raknet(&mut src)?.0.unwrap_or_default();
        let password = RakString::decode_raknet(&mut src)?.0.unwrap_or_default();
        let version = RakString::decode_raknet(&mut src)?.0.unwrap_or_default();
        let _method = u8::decode_raknet(&mut src)?;
        Ok(Self {
            owner_connection_id,
            client_id,
            name,
            password,
            version,
            connection_method: ConnectionMethod::RocketNet,
        })
    }
}
