//! Client session: walks the offline handshake, the online handshake,
//! player verification, a keepalive hold, and a clean disconnect.
//!
//! Everything is sequential. The session owns its transport, so the
//! socket is closed on every exit path when `run` returns.

mod inbound;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::{
    error::RaknetError,
    game::{ConnectionMethod, VerifyPlayer},
    protocol::{
        constants::{
            self, DEFAULT_UNCONNECTED_MAGIC, MAXIMUM_DATAGRAM_SIZE, RAKNET_PROTOCOL_VERSION,
            SYSTEM_ADDRESS_COUNT,
        },
        packet::{
            ConnectedPing, ConnectionRequest, DisconnectionNotification,
            IncompatibleProtocolVersion, NewIncomingConnection, OpenConnectionReply1,
            OpenConnectionReply2, OpenConnectionRequest1, OpenConnectionRequest2, Packet,
        },
        state::SessionState,
        types::{RaknetTime, Sequence24},
    },
    transport::{DatagramTransport, UdpTransport, build_frame},
};

/// Everything the session needs from the outside world.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: SocketAddr,
    /// Game version string; must be resolved before the session runs.
    pub version: String,
    pub password: String,
    pub player_name: String,
    pub client_id: u64,
    pub connection_method: ConnectionMethod,
    /// How long to stay connected after verification.
    pub hold_duration: Duration,
    pub offline_timeout: Duration,
    pub online_attempt_timeout: Duration,
    pub connect_attempts: usize,
    pub challenge_attempts: usize,
    pub keepalive_interval: Duration,
    pub mtu: u16,
}

impl SessionConfig {
    pub fn new(server: SocketAddr, version: impl Into<String>) -> Self {
        Self {
            server,
            version: version.into(),
            password: String::new(),
            player_name: constants::DEFAULT_PLAYER_NAME.to_string(),
            client_id: constants::DEFAULT_CLIENT_ID,
            connection_method: ConnectionMethod::RocketNet,
            hold_duration: constants::DEFAULT_HOLD_DURATION,
            offline_timeout: constants::OFFLINE_TIMEOUT,
            online_attempt_timeout: constants::ONLINE_ATTEMPT_TIMEOUT,
            connect_attempts: constants::MAXIMUM_CONNECTION_ATTEMPTS,
            challenge_attempts: constants::MAXIMUM_CHALLENGE_ATTEMPTS,
            keepalive_interval: constants::KEEPALIVE_INTERVAL,
            mtu: constants::MAXIMUM_MTU_SIZE,
        }
    }
}

/// Outcome of a session that reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub guid: u64,
    pub mtu: u16,
    pub owner_connection_id: Option<i64>,
    pub frames_sent: usize,
    pub acks_sent: usize,
    /// Sequence numbers of ours the server acknowledged.
    pub frames_acked: usize,
    pub final_state: SessionState,
}

pub struct Session<T: DatagramTransport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
    guid: u64,
    next_sequence: Sequence24,
    mtu: u16,
    owner_connection_id: Option<i64>,
    frames_sent: usize,
    acks_sent: usize,
    frames_acked: usize,
    /// Payloads received but not yet looked at by a phase.
    pending: VecDeque<Bytes>,
    recv_buf: Vec<u8>,
}

impl Session<UdpTransport> {
    /// Binds a UDP socket towards `config.server` and runs a full session.
    pub async fn connect(config: SessionConfig) -> Result<SessionSummary, RaknetError> {
        if config.version.trim().is_empty() {
            return Err(RaknetError::MissingVersion);
        }
        let transport = UdpTransport::bind(config.server).await?;
        Session::new(transport, config).run().await
    }
}

impl<T: DatagramTransport> Session<T> {
    /// New session with a random 63-bit GUID.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self::with_guid(transport, config, rand::random::<u64>() >> 1)
    }

    pub fn with_guid(transport: T, config: SessionConfig, guid: u64) -> Self {
        let mtu = config.mtu;
        Self {
            transport,
            config,
            state: SessionState::Init,
            guid,
            next_sequence: Sequence24::new(0),
            mtu,
            owner_connection_id: None,
            frames_sent: 0,
            acks_sent: 0,
            frames_acked: 0,
            pending: VecDeque::new(),
            recv_buf: vec![0u8; MAXIMUM_DATAGRAM_SIZE],
        }
    }

    pub fn guid(&self) -> u64 {
        self.guid
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session from `Init` to `Closed`. Consumes the session,
    /// dropping the transport on the way out whatever the outcome.
    pub async fn run(mut self) -> Result<SessionSummary, RaknetError> {
        if self.config.version.trim().is_empty() {
            return Err(RaknetError::MissingVersion);
        }

        tracing::info!(
            peer = %self.transport.peer_addr(),
            guid = self.guid,
            "starting session"
        );

        match self.drive().await {
            Ok(()) => {
                tracing::info!(
                    frames_sent = self.frames_sent,
                    acks_sent = self.acks_sent,
                    "session closed cleanly"
                );
                Ok(self.summary())
            }
            Err(e) => {
                tracing::error!(phase = %self.state, error = %e, "session failed");
                if self.state.is_online() && !matches!(e, RaknetError::Disconnected { .. }) {
                    // Best effort so the server does not wait for a timeout.
                    if let Err(send_err) = self.send_packet(&DisconnectionNotification).await {
                        tracing::debug!(error = %send_err, "could not send disconnect");
                    }
                }
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<(), RaknetError> {
        loop {
            match self.state {
                SessionState::Init => {}
                SessionState::OfflineReq1 => self.open_connection_1().await?,
                SessionState::OfflineReq2 => self.open_connection_2().await?,
                SessionState::OnlineConnect => self.request_connection().await?,
                SessionState::NotifyIncoming => self.notify_incoming().await?,
                SessionState::AwaitChallenge => self.await_challenge().await?,
                SessionState::SendVerify => self.send_verify().await?,
                SessionState::Alive => self.hold().await?,
                SessionState::Disconnecting => self.send_packet(&DisconnectionNotification).await?,
                SessionState::Closed => return Ok(()),
            }
            let next = self.state.next();
            tracing::debug!(from = %self.state, to = %next, "phase transition");
            self.state = next;
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            guid: self.guid,
            mtu: self.mtu,
            owner_connection_id: self.owner_connection_id,
            frames_sent: self.frames_sent,
            acks_sent: self.acks_sent,
            frames_acked: self.frames_acked,
            final_state: self.state,
        }
    }

    /*
     * Offline handshake
     */

    async fn open_connection_1(&mut self) -> Result<(), RaknetError> {
        let request = OpenConnectionRequest1::padded_to(self.mtu, RAKNET_PROTOCOL_VERSION);
        self.send_raw(&request.to_bytes()?).await?;

        let reply = self.recv_offline(OpenConnectionReply1::ID).await?;
        let reply = OpenConnectionReply1::decode_body(&mut reply.slice(1..))
            .map_err(|source| self.malformed(source))?;
        if reply.magic != DEFAULT_UNCONNECTED_MAGIC {
            return Err(RaknetError::InvalidMagic { phase: self.state });
        }

        tracing::info!(
            server_guid = reply.server_guid,
            mtu = reply.mtu,
            security = reply.cookie.is_some(),
            "open connection reply 1"
        );
        self.mtu = reply.mtu;
        Ok(())
    }

    async fn open_connection_2(&mut self) -> Result<(), RaknetError> {
        let request = OpenConnectionRequest2 {
            magic: DEFAULT_UNCONNECTED_MAGIC,
            server_addr: self.transport.peer_addr(),
            mtu: self.mtu,
            client_guid: self.guid,
        };
        self.send_raw(&request.to_bytes()?).await?;

        let reply = self.recv_offline(OpenConnectionReply2::ID).await?;
        if reply.get(1..17) != Some(&DEFAULT_UNCONNECTED_MAGIC[..]) {
            return Err(RaknetError::InvalidMagic { phase: self.state });
        }

        // Only the tag and magic are load-bearing; the rest is informational.
        match OpenConnectionReply2::decode_body(&mut reply.slice(1..)) {
            Ok(reply) => tracing::info!(
                server_guid = reply.server_guid,
                client_addr = %reply.client_addr,
                mtu = reply.mtu,
                "open connection reply 2"
            ),
            Err(e) => tracing::debug!(error = %e, "open connection reply 2 body not decoded"),
        }
        Ok(())
    }

    /// One receive with the offline budget; the reply must carry `expected`.
    async fn recv_offline(&mut self, expected: u8) -> Result<Bytes, RaknetError> {
        let reply = self
            .recv_timeout(self.config.offline_timeout)
            .await?
            .ok_or(RaknetError::Timeout {
                phase: self.state,
                attempts: 1,
            })?;

        let received = reply.first().copied().unwrap_or_default();
        if received != expected {
            if received == IncompatibleProtocolVersion::ID
                && let Ok(incompatible) =
                    IncompatibleProtocolVersion::decode_body(&mut reply.slice(1..))
            {
                tracing::error!(
                    server_protocol = incompatible.protocol,
                    client_protocol = RAKNET_PROTOCOL_VERSION,
                    "server rejected protocol version"
                );
            }
            return Err(RaknetError::ProtocolMismatch {
                phase: self.state,
                expected,
                received,
            });
        }
        Ok(reply)
    }

    /*
     * Online handshake
     */

    async fn request_connection(&mut self) -> Result<(), RaknetError> {
        self.send_packet(&ConnectionRequest {
            client_guid: self.guid,
            timestamp: RaknetTime::now(),
            secure: false,
        })
        .await?;

        let attempts = self.config.connect_attempts;
        for attempt in 1..=attempts {
            if !self.fill_pending().await? {
                tracing::debug!(attempt, "no reply to connection request, pinging");
                self.send_keepalive().await?;
                continue;
            }

            while let Some(payload) = self.pending.pop_front() {
                if inbound::is_connection_accepted(&payload) {
                    inbound::log_connection_accepted(&payload);
                    return Ok(());
                }
                self.handle_control(&payload).await?;
            }
        }

        Err(RaknetError::Timeout {
            phase: self.state,
            attempts,
        })
    }

    async fn notify_incoming(&mut self) -> Result<(), RaknetError> {
        let server = self.transport.peer_addr();
        // The server expects a fixed-size list of local address slots.
        let slot = SocketAddr::new(std::net::Ipv4Addr::LOCALHOST.into(), server.port());
        let now = RaknetTime::now();
        self.send_packet(&NewIncomingConnection {
            server_address: server,
            system_addresses: [slot; SYSTEM_ADDRESS_COUNT],
            request_timestamp: now,
            accepted_timestamp: now,
        })
        .await
    }

    /*
     * Player verification
     */

    async fn await_challenge(&mut self) -> Result<(), RaknetError> {
        let attempts = self.config.challenge_attempts;
        for attempt in 1..=attempts {
            if !self.fill_pending().await? {
                tracing::debug!(attempt, "no challenge yet, pinging");
                self.send_keepalive().await?;
                continue;
            }

            while let Some(payload) = self.pending.pop_front() {
                if let Some(request) = crate::game::VerifyPlayerRequest::parse(&payload) {
                    tracing::info!(
                        owner_connection_id = request.owner_connection_id,
                        "verify player challenge received"
                    );
                    self.owner_connection_id = Some(request.owner_connection_id);
                    return Ok(());
                }
                self.handle_control(&payload).await?;
            }
        }

        Err(RaknetError::Timeout {
            phase: self.state,
            attempts,
        })
    }

    /// Answer to the challenge seen in `AwaitChallenge`.
    fn verify_message(&self) -> Result<VerifyPlayer, RaknetError> {
        let Some(owner_connection_id) = self.owner_connection_id else {
            return Err(RaknetError::MissingChallenge { phase: self.state });
        };
        Ok(VerifyPlayer {
            owner_connection_id,
            client_id: self.config.client_id,
            name: self.config.player_name.clone(),
            password: self.config.password.clone(),
            version: self.config.version.clone(),
            connection_method: self.config.connection_method,
        })
    }

    async fn send_verify(&mut self) -> Result<(), RaknetError> {
        let message = self.verify_message()?;
        tracing::info!(
            name = %message.name,
            version = %message.version,
            "sending verify player"
        );
        self.send_frame(message.to_bytes()?).await
    }

    /*
     * Keepalive hold
     */

    async fn hold(&mut self) -> Result<(), RaknetError> {
        let deadline = tokio::time::Instant::now() + self.config.hold_duration;
        tracing::info!(hold = ?self.config.hold_duration, "holding session open");

        while let Some(payload) = self.pending.pop_front() {
            self.handle_control(&payload).await?;
        }

        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let wait = self.config.keepalive_interval.min(deadline - now);
            match self.recv_timeout(wait).await? {
                Some(datagram) => {
                    for payload in self.handle_datagram(datagram).await? {
                        self.handle_control(&payload).await?;
                    }
                }
                None => self.send_keepalive().await?,
            }
        }
    }

    /// One attempt of an online phase. Leftover payloads count as a reply;
    /// otherwise one datagram is received and its payloads queued.
    /// Returns false when the receive timed out.
    async fn fill_pending(&mut self) -> Result<bool, RaknetError> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        let Some(datagram) = self.recv_timeout(self.config.online_attempt_timeout).await? else {
            return Ok(false);
        };
        let payloads = self.handle_datagram(datagram).await?;
        self.pending.extend(payloads);
        Ok(true)
    }

    /*
     * Outbound
     */

    async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), RaknetError> {
        tracing::trace!(
            phase = %self.state,
            len = bytes.len(),
            id = bytes.first().copied().unwrap_or_default(),
            "send"
        );
        self.transport.send(bytes).await?;
        Ok(())
    }

    /// Wraps `payload` in a frame carrying the next sequence number.
    async fn send_frame(&mut self, payload: Bytes) -> Result<(), RaknetError> {
        let seq = self.next_sequence;
        let frame = build_frame(seq, payload)?;
        self.send_raw(&frame).await?;
        self.next_sequence = seq.next();
        self.frames_sent += 1;
        tracing::debug!(phase = %self.state, seq = seq.value(), "frame sent");
        Ok(())
    }

    async fn send_packet<P: Packet>(&mut self, packet: &P) -> Result<(), RaknetError> {
        self.send_frame(packet.to_bytes()?).await
    }

    async fn send_keepalive(&mut self) -> Result<(), RaknetError> {
        self.send_packet(&ConnectedPing {
            ping_time: RaknetTime::now(),
        })
        .await
    }
}
