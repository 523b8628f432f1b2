use bitflags::bitflags;
use std::time::Duration;

use crate::protocol::types::Magic;

/// RakNet protocol version spoken by the game server.
pub const RAKNET_PROTOCOL_VERSION: u8 = 6;

/// Size the first offline request is padded to. The server echoes back
/// whatever MTU it settles on in the first reply.
pub const MAXIMUM_MTU_SIZE: u16 = 1400;

/// Largest datagram we are willing to read from the socket.
pub const MAXIMUM_DATAGRAM_SIZE: usize = u16::MAX as usize;

/// Receive buffer requested from the OS. The server may burst several
/// datagrams while we sit in a receive loop.
pub const RECV_BUFFER_SIZE: usize = 1024 * 1024;

/// Receive attempts allowed while waiting for ConnectionRequestAccepted.
pub const MAXIMUM_CONNECTION_ATTEMPTS: usize = 10;

/// Receive attempts allowed while waiting for the verify-player challenge.
pub const MAXIMUM_CHALLENGE_ATTEMPTS: usize = 15;

/// Single receive budget for each offline handshake reply.
pub const OFFLINE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-attempt receive budget during the online handshake.
pub const ONLINE_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive budget per iteration while holding the session open.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_millis(500);

/// How long the session stays connected before disconnecting.
pub const DEFAULT_HOLD_DURATION: Duration = Duration::from_secs(10);

bitflags! {
    /// Represents all the flags for a RakNet datagram frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct DatagramFlags: u8 {
        const VALID            = 0b1000_0000;
        const ACK              = 0b0100_0000;

        // FLAG_NACK and FLAG_HAS_B_AND_AS are the same bit.
        const NACK             = 0b0010_0000;
        const HAS_B_AND_AS     = 0b0010_0000;

        const PACKET_PAIR      = 0b0001_0000;
        const CONTINUOUS_SEND  = 0b0000_1000;
        const NEEDS_B_AND_AS   = 0b0000_0100;

        const RELIABILITY_FLAGS = Self::ACK.bits() | Self::NACK.bits();
    }
}

impl DatagramFlags {
    /// Leading byte of every frame-bearing datagram we send (0x84).
    pub const FRAME: DatagramFlags = DatagramFlags::VALID.union(DatagramFlags::NEEDS_B_AND_AS);

    /// Leading byte of every acknowledgment datagram we send (0xC0).
    pub const ACK_MARKER: DatagramFlags = DatagramFlags::VALID.union(DatagramFlags::ACK);

    /// True when the byte introduces a datagram carrying frames rather
    /// than an ACK/NACK or an offline message.
    pub fn is_frame(byte: u8) -> bool {
        let flags = DatagramFlags::from_bits_truncate(byte);
        flags.contains(DatagramFlags::VALID) && !flags.intersects(DatagramFlags::RELIABILITY_FLAGS)
    }

    pub fn is_ack(byte: u8) -> bool {
        let flags = DatagramFlags::from_bits_truncate(byte);
        flags.contains(DatagramFlags::ACK_MARKER)
    }

    pub fn is_nack(byte: u8) -> bool {
        let flags = DatagramFlags::from_bits_truncate(byte);
        flags.contains(DatagramFlags::VALID | DatagramFlags::NACK)
            && !flags.contains(DatagramFlags::ACK)
    }
}

/// Magic used to identify RakNet packets
pub const DEFAULT_UNCONNECTED_MAGIC: Magic = [
    0x00, 0xFF, 0xFF, 0x00, 0xFE, 0xFE, 0xFE, 0xFE, 0xFD, 0xFD, 0xFD, 0xFD, 0x12, 0x34, 0x56, 0x78,
];

/*
 * IP constants
 */
pub const IPV4_MESSAGE_SIZE: usize = 7;
pub const IPV6_MESSAGE_SIZE: usize = 29;

/// Number of internal address slots in NewIncomingConnection and
/// ConnectionRequestAccepted.
pub const SYSTEM_ADDRESS_COUNT: usize = 10;

/*
 * Game (application layer) constants
 */

/// Channel byte leading every general-traffic game message.
pub const CHANNEL_GENERAL_TRAFFIC: u8 = 0x86;

/// Client to server: player verification.
pub const MSG_VERIFY_PLAYER: u8 = 0x70;

/// Server to client: verification challenge carrying the owner connection id.
pub const MSG_VERIFY_PLAYER_REQUEST: u8 = 0x71;

/// Byte offset of the owner connection id inside the challenge payload.
pub const VERIFY_REQUEST_OWNER_ID_OFFSET: usize = 10;

/// Shortest challenge payload that is accepted.
pub const VERIFY_REQUEST_MIN_LEN: usize = 20;

pub const DEFAULT_PLAYER_NAME: &str = "PauseBot";

pub const DEFAULT_CLIENT_ID: u64 = 76561197967126507;
