/// Builds `RaknetPacket`, the sum of every connected/offline message the
/// session understands, plus a `Game` arm for payloads whose first byte
/// is a game channel (0x80 and up) rather than a RakNet message id.
macro_rules! define_raknet_packets {
    ($($name:ident,)+) => {
        #[derive(Debug, Clone)]
        pub enum RaknetPacket {
            $($name($name),)+
            Game { channel: u8, body: bytes::Bytes },
        }

        impl RaknetPacket {
            /// First id byte reserved for the game layer.
            pub const FIRST_GAME_CHANNEL: u8 = 0x80;

            pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
                let id = u8::decode_raknet(src)?;
                $(
                    if id == <$name as Packet>::ID {
                        return <$name as Packet>::decode_body(src).map(RaknetPacket::$name);
                    }
                )+
                if id < Self::FIRST_GAME_CHANNEL {
                    return Err(DecodeError::UnknownId(id));
                }
                let len = src.remaining();
                Ok(RaknetPacket::Game {
                    channel: id,
                    body: src.copy_to_bytes(len),
                })
            }

            pub fn id(&self) -> u8 {
                match self {
                    $(RaknetPacket::$name(_) => <$name as Packet>::ID,)+
                    RaknetPacket::Game { channel, .. } => *channel,
                }
            }

            pub fn to_bytes(&self) -> Result<Bytes, EncodeError> {
                match self {
                    $(RaknetPacket::$name(inner) => inner.to_bytes(),)+
                    RaknetPacket::Game { channel, body } => {
                        let mut buf = BytesMut::with_capacity(1 + body.len());
                        buf.put_u8(*channel);
                        buf.put_slice(body);
                        Ok(buf.freeze())
                    }
                }
            }
        }
    };
}

pub(crate) use define_raknet_packets;
