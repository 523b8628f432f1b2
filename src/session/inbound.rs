use std::time::Duration;

use bytes::Bytes;

use crate::{
    error::RaknetError,
    protocol::{
        ack::AckNackPayload,
        constants::DatagramFlags,
        packet::{
            ConnectedPong, ConnectionRequestAccepted, DecodeError, Packet, RaknetEncodable,
            RaknetPacket,
        },
        types::{DatagramHeader, RaknetTime, Sequence24},
    },
    transport::{DatagramTransport, build_ack, datagram::Datagram},
};

use super::Session;

pub(super) fn is_connection_accepted(payload: &[u8]) -> bool {
    payload.first() == Some(&ConnectionRequestAccepted::ID)
}

/// Only the tag byte matters; the body is decoded for the log alone.
pub(super) fn log_connection_accepted(payload: &Bytes) {
    match ConnectionRequestAccepted::decode_body(&mut payload.slice(1..)) {
        Ok(accepted) => tracing::info!(
            client_addr = %accepted.address,
            system_index = accepted.system_index,
            request_time = accepted.request_timestamp.0,
            accepted_time = accepted.accepted_timestamp.0,
            "connection request accepted"
        ),
        Err(e) => tracing::info!(error = %e, "connection request accepted (body not decoded)"),
    }
}

impl<T: DatagramTransport> Session<T> {
    /// Receive one datagram, or `None` when `timeout` elapses first.
    pub(super) async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Bytes>, RaknetError> {
        match tokio::time::timeout(timeout, self.transport.recv(&mut self.recv_buf)).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok(len)) => {
                let datagram = Bytes::copy_from_slice(&self.recv_buf[..len]);
                tracing::trace!(phase = %self.state, len, "recv");
                Ok(Some(datagram))
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    pub(super) fn malformed(&self, source: DecodeError) -> RaknetError {
        RaknetError::MalformedFrame {
            phase: self.state,
            source,
        }
    }

    /// Handle one inbound datagram and return the payloads it carried.
    ///
    /// Frame datagrams are acknowledged before their packets are parsed.
    /// ACK/NACK datagrams are recorded and yield nothing, as do stray
    /// offline messages.
    pub(super) async fn handle_datagram(
        &mut self,
        datagram: Bytes,
    ) -> Result<Vec<Bytes>, RaknetError> {
        let Some(&first) = datagram.first() else {
            return Ok(Vec::new());
        };

        if DatagramFlags::is_frame(first) {
            let mut src = datagram;
            let header = DatagramHeader::decode(&mut src).map_err(|e| self.malformed(e))?;
            self.send_ack(header.sequence).await?;

            let packets = Datagram::decode_packets(&mut src).map_err(|e| self.malformed(e))?;
            let mut payloads = Vec::with_capacity(packets.len());
            for pkt in packets {
                if pkt.header.is_split {
                    tracing::debug!(
                        seq = header.sequence.value(),
                        split = ?pkt.split,
                        "dropping split fragment"
                    );
                    continue;
                }
                payloads.push(pkt.payload);
            }
            return Ok(payloads);
        }

        if DatagramFlags::is_ack(first) {
            let payload = AckNackPayload::decode_raknet(&mut datagram.slice(1..))
                .map_err(|e| self.malformed(e))?;
            self.frames_acked += payload.len();
            tracing::debug!(records = payload.ranges.len(), acked = payload.len(), "ack received");
        } else if DatagramFlags::is_nack(first) {
            let payload = AckNackPayload::decode_raknet(&mut datagram.slice(1..))
                .map_err(|e| self.malformed(e))?;
            tracing::debug!(missing = payload.len(), "nack received, not retransmitting");
        } else {
            tracing::debug!(
                phase = %self.state,
                id = format_args!("0x{:02x}", first),
                "ignoring unconnected datagram"
            );
        }
        Ok(Vec::new())
    }

    /// React to connected control messages that can arrive in any online
    /// phase. Anything else is ignored.
    pub(super) async fn handle_control(&mut self, payload: &Bytes) -> Result<(), RaknetError> {
        match RaknetPacket::decode(&mut payload.clone()) {
            Ok(RaknetPacket::ConnectedPing(ping)) => {
                self.send_packet(&ConnectedPong {
                    ping_time: ping.ping_time,
                    pong_time: RaknetTime::now(),
                })
                .await
            }
            Ok(RaknetPacket::DisconnectionNotification(_)) => {
                tracing::warn!(phase = %self.state, "server sent disconnect");
                Err(RaknetError::Disconnected { phase: self.state })
            }
            Ok(pkt) => {
                tracing::trace!(id = format_args!("0x{:02x}", pkt.id()), "unhandled packet");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "undecodable payload ignored");
                Ok(())
            }
        }
    }

    async fn send_ack(&mut self, seq: Sequence24) -> Result<(), RaknetError> {
        self.transport.send(&build_ack(seq)?).await?;
        self.acks_sent += 1;
        tracing::trace!(seq = seq.value(), "ack sent");
        Ok(())
    }
}
