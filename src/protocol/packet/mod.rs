pub mod connected;
mod error;
pub mod open_connection;
mod utils;

pub use connected::*;
pub use error::{DecodeError, EncodeError};
pub use open_connection::*;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use utils::define_raknet_packets;

/// A RakNet message with a fixed id byte. Implementors only deal with
/// the body; `to_bytes` prepends the id.
pub trait Packet: Sized {
    const ID: u8;

    /// Encode the body of this packet into the destination buffer.
    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError>;

    /// Decodes what follows the id byte.
    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError>;

    fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::new();
        buf.put_u8(Self::ID);
        self.encode_body(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Field-level wire codec shared by packets, frames and game messages.
pub trait RaknetEncodable: Sized {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError>;

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError>;
}

define_raknet_packets! {
    ConnectedPing,
    ConnectedPong,
    OpenConnectionRequest1,
    OpenConnectionReply1,
    OpenConnectionRequest2,
    OpenConnectionReply2,
    ConnectionRequest,
    ConnectionRequestAccepted,
    NewIncomingConnection,
    DisconnectionNotification,
    IncompatibleProtocolVersion,
}
