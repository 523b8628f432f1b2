use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use bytes::{Buf, BufMut};

use crate::protocol::{
    constants::{IPV4_MESSAGE_SIZE, IPV6_MESSAGE_SIZE},
    packet::{DecodeError, EncodeError, RaknetEncodable},
};

/// sin6_family value RakNet peers put in the IPv6 form.
const AF_INET6: u16 = 23;

/// IPv4 is a version tag, the address with every bit inverted and a
/// big-endian port. IPv6 is a version tag and a `sockaddr_in6` image.
impl RaknetEncodable for SocketAddr {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        match self {
            SocketAddr::V4(addr) => {
                dst.put_u8(4);
                dst.put_u32(!u32::from(*addr.ip()));
                dst.put_u16(addr.port());
            }
            SocketAddr::V6(addr) => {
                dst.put_u8(6);
                dst.put_u16_le(AF_INET6);
                dst.put_u16(addr.port());
                dst.put_u32(addr.flowinfo());
                dst.put_slice(&addr.ip().octets());
                dst.put_u32(addr.scope_id());
            }
        }
        Ok(())
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let version = u8::decode_raknet(src)?;
        let body_len = match version {
            4 => IPV4_MESSAGE_SIZE - 1,
            6 => IPV6_MESSAGE_SIZE - 1,
            other => return Err(DecodeError::InvalidAddrVersion(other)),
        };
        if src.remaining() < body_len {
            return Err(DecodeError::UnexpectedEof);
        }

        if version == 4 {
            let ip = Ipv4Addr::from(!src.get_u32());
            return Ok(SocketAddrV4::new(ip, src.get_u16()).into());
        }

        let _family = src.get_u16_le();
        let port = src.get_u16();
        let flowinfo = src.get_u32();
        let ip = Ipv6Addr::from(src.get_u128());
        let scope_id = src.get_u32();
        Ok(SocketAddrV6::new(ip, port, flowinfo, scope_id).into())
    }
}

/// Fixed-size address lists, as carried by the connection handshake.
impl<const N: usize> RaknetEncodable for [SocketAddr; N] {
    fn encode_raknet(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.iter().try_for_each(|addr| addr.encode_raknet(dst))
    }

    fn decode_raknet(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let mut out = [SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)); N];
        for slot in &mut out {
            *slot = SocketAddr::decode_raknet(src)?;
        }
        Ok(out)
    }
}
