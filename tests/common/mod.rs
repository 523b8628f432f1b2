#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::{BufMut, Bytes, BytesMut};
use raknet_autopause::{
    SessionConfig,
    protocol::{
        constants::{
            CHANNEL_GENERAL_TRAFFIC, DEFAULT_UNCONNECTED_MAGIC, MSG_VERIFY_PLAYER_REQUEST,
        },
        packet::{
            ConnectedPing, ConnectionRequestAccepted, DisconnectionNotification,
            OpenConnectionReply1, OpenConnectionReply2, Packet,
        },
        types::{RaknetTime, Sequence24},
    },
    transport::{DatagramTransport, build_frame, extract_payload},
};

pub const SERVER_GUID: u64 = 0x5E5E_5E5E;
pub const SERVER_MTU: u16 = 1200;

pub fn server_addr() -> SocketAddr {
    "127.0.0.1:27016".parse().unwrap()
}

pub fn test_config(server: SocketAddr) -> SessionConfig {
    let mut config = SessionConfig::new(server, "0.2.5954.26174");
    config.password = "hunter2".into();
    config
}

/// Transport that records every datagram sent and answers through a
/// responder closure. With nothing queued, `recv` never completes, so
/// only the caller's timeout ends it.
pub struct MockTransport {
    peer: SocketAddr,
    sent: Arc<Mutex<Vec<Bytes>>>,
    inbox: VecDeque<Bytes>,
    responder: Box<dyn FnMut(&[u8]) -> Vec<Bytes> + Send>,
}

impl MockTransport {
    pub fn new(
        responder: impl FnMut(&[u8]) -> Vec<Bytes> + Send + 'static,
    ) -> (Self, Arc<Mutex<Vec<Bytes>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = Self {
            peer: server_addr(),
            sent: sent.clone(),
            inbox: VecDeque::new(),
            responder: Box::new(responder),
        };
        (transport, sent)
    }
}

impl DatagramTransport for MockTransport {
    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sent.lock().unwrap().push(Bytes::copy_from_slice(buf));
        let replies = (self.responder)(buf);
        self.inbox.extend(replies);
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbox.pop_front() {
            Some(datagram) => {
                buf[..datagram.len()].copy_from_slice(&datagram);
                Ok(datagram.len())
            }
            None => std::future::pending().await,
        }
    }
}

pub fn reply1() -> Bytes {
    OpenConnectionReply1 {
        magic: DEFAULT_UNCONNECTED_MAGIC,
        server_guid: SERVER_GUID,
        cookie: None,
        mtu: SERVER_MTU,
    }
    .to_bytes()
    .unwrap()
}

pub fn reply2(client: SocketAddr) -> Bytes {
    OpenConnectionReply2 {
        magic: DEFAULT_UNCONNECTED_MAGIC,
        server_guid: SERVER_GUID,
        client_addr: client,
        mtu: SERVER_MTU,
        security: false,
    }
    .to_bytes()
    .unwrap()
}

pub fn accepted(client: SocketAddr) -> Bytes {
    ConnectionRequestAccepted {
        address: client,
        system_index: 0,
        system_addresses: [server_addr(); 10],
        request_timestamp: RaknetTime(1),
        accepted_timestamp: RaknetTime(2),
    }
    .to_bytes()
    .unwrap()
}

/// Verify-player challenge with `owner` at byte 10, surrounded by noise.
pub fn challenge(owner: i64) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(CHANNEL_GENERAL_TRAFFIC);
    buf.put_u8(MSG_VERIFY_PLAYER_REQUEST);
    buf.put_slice(&[0xAB; 8]);
    buf.put_i64_le(owner);
    buf.put_slice(&[0xCD; 6]);
    buf.freeze()
}

pub fn server_ping() -> Bytes {
    ConnectedPing {
        ping_time: RaknetTime(777),
    }
    .to_bytes()
    .unwrap()
}

pub fn server_disconnect() -> Bytes {
    DisconnectionNotification.to_bytes().unwrap()
}

/// What the scripted server does once the verify-player message arrives.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum AfterVerify {
    Nothing,
    Ping,
}

/// Plays the server side of a successful handshake.
pub struct ServerScript {
    pub owner: i64,
    pub after_verify: AfterVerify,
    /// Replace the challenge with a disconnect notification.
    pub reject_after_notify: bool,
    seq: u32,
}

impl ServerScript {
    pub fn new(owner: i64) -> Self {
        Self {
            owner,
            after_verify: AfterVerify::Nothing,
            reject_after_notify: false,
            seq: 0,
        }
    }

    fn frame(&mut self, payload: Bytes) -> Bytes {
        let f = build_frame(Sequence24::new(self.seq), payload).unwrap();
        self.seq += 1;
        f
    }

    pub fn respond(&mut self, client: SocketAddr, datagram: &[u8]) -> Vec<Bytes> {
        match datagram[0] {
            0x05 => vec![reply1()],
            0x07 => vec![reply2(client)],
            0x84 => {
                let payload = extract_payload(Bytes::copy_from_slice(datagram)).unwrap();
                match payload.first() {
                    Some(0x09) => vec![self.frame(accepted(client))],
                    Some(0x13) if self.reject_after_notify => {
                        vec![self.frame(server_disconnect())]
                    }
                    Some(0x13) => {
                        let owner = self.owner;
                        vec![self.frame(challenge(owner))]
                    }
                    Some(&CHANNEL_GENERAL_TRAFFIC) if self.after_verify == AfterVerify::Ping => {
                        vec![self.frame(server_ping())]
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

/// Payloads of every frame datagram the client sent, with their sequence.
pub fn sent_frames(sent: &[Bytes]) -> Vec<(u32, Bytes)> {
    sent.iter()
        .filter(|d| d.first() == Some(&0x84))
        .map(|d| {
            let seq = u32::from_le_bytes([d[1], d[2], d[3], 0]);
            (seq, extract_payload(d.clone()).unwrap())
        })
        .collect()
}

/// Sequence numbers acknowledged by the client's ACK datagrams.
pub fn sent_acks(sent: &[Bytes]) -> Vec<u32> {
    sent.iter()
        .filter(|d| d.first() == Some(&0xC0))
        .map(|d| u32::from_le_bytes([d[4], d[5], d[6], 0]))
        .collect()
}
