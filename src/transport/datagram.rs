use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    protocol::{
        ack::AckNackPayload,
        constants::DatagramFlags,
        packet::{DecodeError, EncodeError, RaknetEncodable},
        types::{DatagramHeader, Sequence24},
    },
    transport::encapsulated_packet::EncapsulatedPacket,
};

/// Ordering channel used for every frame this client sends.
pub const DEFAULT_ORDERING_CHANNEL: u8 = 0;

/// A frame-bearing datagram: header plus one or more encapsulated packets.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub header: DatagramHeader,
    pub packets: Vec<EncapsulatedPacket>,
}

impl Datagram {
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<(), EncodeError> {
        self.header.encode(dst)?;
        for pkt in &self.packets {
            pkt.encode_raknet(dst)?;
        }
        Ok(())
    }

    pub fn decode(src: &mut impl Buf) -> Result<Self, DecodeError> {
        let header = DatagramHeader::decode(src)?;
        let packets = Self::decode_packets(src)?;
        Ok(Self { header, packets })
    }

    /// Decodes the packets that follow an already consumed header.
    pub fn decode_packets(src: &mut impl Buf) -> Result<Vec<EncapsulatedPacket>, DecodeError> {
        let mut packets = Vec::new();
        while src.has_remaining() {
            packets.push(EncapsulatedPacket::decode_raknet(src)?);
        }
        Ok(packets)
    }
}

/// Builds the simplest reliable frame: frame marker, 3-byte LE sequence,
/// then one reliable-ordered packet whose indexes both equal `sequence`.
pub fn build_frame(sequence: Sequence24, payload: Bytes) -> Result<Bytes, EncodeError> {
    let packet = EncapsulatedPacket::reliable_ordered(sequence, DEFAULT_ORDERING_CHANNEL, payload)?;
    let datagram = Datagram {
        header: DatagramHeader::frame(sequence),
        packets: vec![packet],
    };
    let mut buf = BytesMut::with_capacity(DatagramHeader::ENCODED_SIZE + datagram.packets[0].payload.len() + 10);
    datagram.encode(&mut buf)?;
    Ok(buf.freeze())
}

/// Builds an ACK datagram for a single sequence number.
pub fn build_ack(sequence: Sequence24) -> Result<Bytes, EncodeError> {
    encode_ack_nack(DatagramFlags::ACK_MARKER, &AckNackPayload::single(sequence))
}

fn encode_ack_nack(flags: DatagramFlags, payload: &AckNackPayload) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::with_capacity(1 + 2 + payload.ranges.len() * 7);
    buf.put_u8(flags.bits());
    payload.encode_raknet(&mut buf)?;
    Ok(buf.freeze())
}

/// Returns the payload of the first packet in a frame datagram. Any other
/// datagram (offline message, ACK, NACK) is handed back untouched.
pub fn extract_payload(datagram: Bytes) -> Result<Bytes, DecodeError> {
    match datagram.first() {
        Some(&b) if DatagramFlags::is_frame(b) => {
            let mut src = datagram;
            let _header = DatagramHeader::decode(&mut src)?;
            Ok(EncapsulatedPacket::decode_raknet(&mut src)?.payload)
        }
        _ => Ok(datagram),
    }
}
