use std::net::SocketAddr;

use bytes::{Buf, BufMut};

use crate::protocol::{
    constants::{self, SYSTEM_ADDRESS_COUNT},
    packet::{DecodeError, EncodeError, Packet, RaknetEncodable},
    types::{EoBPadding, Magic, RaknetTime},
};

/// Size of the ID, magic and protocol version at the front of
/// OpenConnectionRequest1. The rest of the datagram is padding.
const REQUEST1_HEADER_SIZE: usize = 1 + 16 + 1;

#[derive(Debug, Clone)]
pub struct OpenConnectionRequest1 {
    pub magic: Magic,
    pub protocol_version: u8,
    pub padding: EoBPadding,
}

impl OpenConnectionRequest1 {
    /// Request padded so the whole datagram is exactly `mtu` bytes.
    pub fn padded_to(mtu: u16, protocol_version: u8) -> Self {
        Self {
            magic: constants::DEFAULT_UNCONNECTED_MAGIC,
            protocol_version,
            padding: EoBPadding((mtu as usize).saturating_sub(REQUEST1_HEADER_SIZE)),
        }
    }
}

impl Packet for OpenConnectionRequest1 {
    const ID: u8 = 0x05;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.magic.encode_raknet(dst)?;
        self.protocol_version.encode_raknet(dst)?;
        self.padding.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            magic: Magic::decode_raknet(src)?,
            protocol_version: u8::decode_raknet(src)?,
            padding: EoBPadding::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenConnectionReply1 {
    pub magic: Magic,
    pub server_guid: u64,
    pub cookie: Option<u32>,
    pub mtu: u16,
}

impl Packet for OpenConnectionReply1 {
    const ID: u8 = 0x06;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.magic.encode_raknet(dst)?;
        self.server_guid.encode_raknet(dst)?;
        self.cookie.is_some().encode_raknet(dst)?; // security bool
        if let Some(cookie) = self.cookie {
            cookie.encode_raknet(dst)?;
        }
        self.mtu.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            magic: Magic::decode_raknet(src)?,
            server_guid: u64::decode_raknet(src)?,
            cookie: if u8::decode_raknet(src)? != 0 {
                Some(u32::decode_raknet(src)?)
            } else {
                None
            },
            mtu: u16::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenConnectionRequest2 {
    pub magic: Magic,
    pub server_addr: SocketAddr,
    pub mtu: u16,
    pub client_guid: u64,
}

impl Packet for OpenConnectionRequest2 {
    const ID: u8 = 0x07;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.magic.encode_raknet(dst)?;
        self.server_addr.encode_raknet(dst)?;
        self.mtu.encode_raknet(dst)?;
        self.client_guid.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            magic: Magic::decode_raknet(src)?,
            server_addr: SocketAddr::decode_raknet(src)?,
            mtu: u16::decode_raknet(src)?,
            client_guid: u64::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenConnectionReply2 {
    pub magic: Magic,
    pub server_guid: u64,
    pub client_addr: SocketAddr,
    pub mtu: u16,
    pub security: bool,
}

impl Packet for OpenConnectionReply2 {
    const ID: u8 = 0x08;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.magic.encode_raknet(dst)?;
        self.server_guid.encode_raknet(dst)?;
        self.client_addr.encode_raknet(dst)?;
        self.mtu.encode_raknet(dst)?;
        self.security.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            magic: Magic::decode_raknet(src)?,
            server_guid: u64::decode_raknet(src)?,
            client_addr: SocketAddr::decode_raknet(src)?,
            mtu: u16::decode_raknet(src)?,
            security: bool::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IncompatibleProtocolVersion {
    pub protocol: u8,
    pub magic: Magic,
    pub server_guid: u64,
}

impl Packet for IncompatibleProtocolVersion {
    const ID: u8 = 0x19;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.protocol.encode_raknet(dst)?;
        self.magic.encode_raknet(dst)?;
        self.server_guid.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            protocol: u8::decode_raknet(src)?,
            magic: Magic::decode_raknet(src)?,
            server_guid: u64::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    pub client_guid: u64,
    pub timestamp: RaknetTime,
    pub secure: bool,
}

impl Packet for ConnectionRequest {
    const ID: u8 = 0x09;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.client_guid.encode_raknet(dst)?;
        self.timestamp.encode_raknet(dst)?;
        self.secure.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            client_guid: u64::decode_raknet(src)?,
            timestamp: RaknetTime::decode_raknet(src)?,
            secure: bool::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionRequestAccepted {
    pub address: SocketAddr,
    pub system_index: u16,
    pub system_addresses: [SocketAddr; SYSTEM_ADDRESS_COUNT],
    pub request_timestamp: RaknetTime,
    pub accepted_timestamp: RaknetTime,
}

impl Packet for ConnectionRequestAccepted {
    const ID: u8 = 0x10;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.address.encode_raknet(dst)?;
        self.system_index.encode_raknet(dst)?;
        self.system_addresses.encode_raknet(dst)?;
        self.request_timestamp.encode_raknet(dst)?;
        self.accepted_timestamp.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            address: SocketAddr::decode_raknet(src)?,
            system_index: u16::decode_raknet(src)?,
            system_addresses: RaknetEncodable::decode_raknet(src)?,
            request_timestamp: RaknetTime::decode_raknet(src)?,
            accepted_timestamp: RaknetTime::decode_raknet(src)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewIncomingConnection {
    pub server_address: SocketAddr,
    pub system_addresses: [SocketAddr; SYSTEM_ADDRESS_COUNT],
    pub request_timestamp: RaknetTime,
    pub accepted_timestamp: RaknetTime,
}

impl Packet for NewIncomingConnection {
    const ID: u8 = 0x13;

    fn encode_body(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.server_address.encode_raknet(dst)?;
        self.system_addresses.encode_raknet(dst)?;
        self.request_timestamp.encode_raknet(dst)?;
        self.accepted_timestamp.encode_raknet(dst)
    }

    fn decode_body(src: &mut impl Buf) -> Result<Self, DecodeError> {
        Ok(Self {
            server_address: SocketAddr::decode_raknet(src)?,
            system_addresses: RaknetEncodable::decode_raknet(src)?,
            request_timestamp: RaknetTime::decode_raknet(src)?,
            accepted_timestamp: RaknetTime::decode_raknet(src)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{DEFAULT_UNCONNECTED_MAGIC, MAXIMUM_MTU_SIZE};

    #[test]
    fn request1_fills_the_mtu() {
        let bytes = OpenConnectionRequest1::padded_to(MAXIMUM_MTU_SIZE, 6)
            .to_bytes()
            .unwrap();
        assert_eq!(bytes.len(), MAXIMUM_MTU_SIZE as usize);
        assert_eq!(bytes[0], 0x05);
        assert_eq!(&bytes[1..17], &DEFAULT_UNCONNECTED_MAGIC[..]);
        assert_eq!(bytes[17], 6);
        assert!(bytes[18..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reply1_mtu_sits_at_offset_26() {
        let reply = OpenConnectionReply1 {
            magic: DEFAULT_UNCONNECTED_MAGIC,
            server_guid: 0xDEAD_BEEF,
            cookie: None,
            mtu: 1200,
        };
        let bytes = reply.to_bytes().unwrap();
        assert_eq!(&bytes[26..28], &1200u16.to_be_bytes());

        let mut body = bytes.slice(1..);
        let decoded = OpenConnectionReply1::decode_body(&mut body).unwrap();
        assert_eq!(decoded.mtu, 1200);
        assert_eq!(decoded.cookie, None);
    }

    #[test]
    fn request2_layout() {
        let req = OpenConnectionRequest2 {
            magic: DEFAULT_UNCONNECTED_MAGIC,
            server_addr: "127.0.0.1:27016".parse().unwrap(),
            mtu: 1400,
            client_guid: 0x0102_0304_0506_0708,
        };
        let bytes = req.to_bytes().unwrap();
        // id + magic + addr + mtu + guid
        assert_eq!(bytes.len(), 1 + 16 + 7 + 2 + 8);
        assert_eq!(bytes[17], 4);
        assert_eq!(&bytes[24..26], &1400u16.to_be_bytes());
        assert_eq!(&bytes[26..], &0x0102_0304_0506_0708u64.to_be_bytes());
    }

    #[test]
    fn connection_request_is_guid_time_flag() {
        let req = ConnectionRequest {
            client_guid: 42,
            timestamp: RaknetTime(7),
            secure: false,
        };
        let bytes = req.to_bytes().unwrap();
        assert_eq!(bytes.len(), 1 + 8 + 8 + 1);
        assert_eq!(bytes[0], 0x09);
        assert_eq!(&bytes[1..9], &42u64.to_be_bytes());
        assert_eq!(&bytes[9..17], &7u64.to_be_bytes());
        assert_eq!(bytes[17], 0);
    }

    #[test]
    fn new_incoming_connection_has_ten_slots() {
        let server: SocketAddr = "127.0.0.1:27016".parse().unwrap();
        let nic = NewIncomingConnection {
            server_address: server,
            system_addresses: [server; SYSTEM_ADDRESS_COUNT],
            request_timestamp: RaknetTime(1),
            accepted_timestamp: RaknetTime(1),
        };
        let bytes = nic.to_bytes().unwrap();
        assert_eq!(bytes.len(), 1 + 7 * 11 + 16);

        let mut body = bytes.slice(1..);
        let decoded = NewIncomingConnection::decode_body(&mut body).unwrap();
        assert!(decoded.system_addresses.iter().all(|a| *a == server));
        assert_eq!(decoded.request_timestamp, decoded.accepted_timestamp);
    }
}
