//! Control packets exchanged inside frames once the session is online.

use bytes::{Buf, BufMut};

use crate::protocol::{
    packet::{DecodeError, EncodeError, Packet, RaknetEncodable},
    types::RaknetTime,
};

/// Keepalive. Sent by us whenever a receive times out, and by the
/// server at its own pace.
#[derive(Debug, Clone)]
pub struct ConnectedPing {
    pub ping_time: RaknetTime,
}

impl Packet for ConnectedPing {
    const ID: u8 = 0x00;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.ping_time.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            ping_time: RaknetTime::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConnectedPong {
    pub ping_time: RaknetTime,
    pub pong_time: RaknetTime,
}

impl Packet for ConnectedPong {
    const ID: u8 = 0x03;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.ping_time.encode_raknet(dst)?;
        self.pong_time.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            ping_time: RaknetTime::decode_raknet(src)?,
            pong_time: RaknetTime::decode_raknet(src)?,
        })
    }
}

/// A single tag byte with no body.
#[derive(Debug, Clone)]
pub struct DisconnectionNotification;

impl Packet for DisconnectionNotification {
    const ID: u8 = 0x15;

    fn encode_body(&self, _dst: &mut impl BufMut) -> Result<(), EncodeError> {
        Ok(())
    }

    fn decode_body(_src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::RaknetPacket;

    #[test]
    fn ping_is_tag_plus_be_time() {
        let bytes = ConnectedPing {
            ping_time: RaknetTime(0x0102),
        }
        .to_bytes()
        .unwrap();
        assert_eq!(&bytes[..], &[0x00, 0, 0, 0, 0, 0, 0, 0x01, 0x02]);
    }

    #[test]
    fn disconnect_is_a_single_byte() {
        let bytes = DisconnectionNotification.to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0x15]);
    }

    #[test]
    fn registry_dispatches_on_id() {
        let mut src: &[u8] = &[0x00, 0, 0, 0, 0, 0, 0, 0, 9];
        match RaknetPacket::decode(&mut src).unwrap() {
            RaknetPacket::ConnectedPing(p) => assert_eq!(p.ping_time.0, 9),
            other => panic!("unexpected packet 0x{:02x}", other.id()),
        }

        let mut src: &[u8] = &[0x86, 0x71, 0xAA];
        match RaknetPacket::decode(&mut src).unwrap() {
            RaknetPacket::Game { channel, body } => {
                assert_eq!(channel, 0x86);
                assert_eq!(&body[..], &[0x71, 0xAA]);
            }
            other => panic!("unexpected packet 0x{:02x}", other.id()),
        }

        let mut src: &[u8] = &[0x42];
        assert!(matches!(
            RaknetPacket::decode(&mut src),
            Err(DecodeError::UnknownId(0x42))
        ));
    }

    #[test]
    fn game_payload_survives_reencode() {
        let raw: &[u8] = &[0x86, 0x70, 0x01, 0x02];
        let pkt = RaknetPacket::decode(&mut &raw[..]).unwrap();
        assert_eq!(pkt.id(), 0x86);
        assert_eq!(&pkt.to_bytes().unwrap()[..], raw);

        let pong = RaknetPacket::ConnectedPong(ConnectedPong {
            ping_time: RaknetTime(1),
            pong_time: RaknetTime(2),
        });
        assert_eq!(pong.to_bytes().unwrap()[0], 0x03);
    }
}
