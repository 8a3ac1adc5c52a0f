//! Wire protocol: packet types and their binary encoding.
//!
//! Every frame is a 3-byte header (`type: u8`, `length: u16` big-endian)
//! followed by exactly `length` body bytes. See [`codec`] for body layouts.

use alloc::string::String;
use core::fmt;

use crate::core::common::ShotOutcome;

pub mod codec;
mod error;

pub use codec::{decode, decode_body, decode_header, encode};
pub use error::ProtocolError;

/// Magic value carried by both hello packets ("BRDS").
pub const MAGIC: u32 = 0x4252_4453;

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 3;

/// Largest body a frame may carry.
pub const MAX_BODY_LEN: usize = 511;

/// Which side of the connection a peer plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub enum PeerRole {
    /// The accepting peer. Answers the hello, announces readiness, picks who
    /// moves first and announces the end of the game.
    Server,
    /// The connecting peer. Opens the handshake.
    Client,
}

impl PeerRole {
    pub const fn code(self) -> u8 {
        match self {
            PeerRole::Server => 0,
            PeerRole::Client => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PeerRole::Server),
            1 => Some(PeerRole::Client),
            _ => None,
        }
    }

    /// The other side.
    pub const fn opponent(self) -> Self {
        match self {
            PeerRole::Server => PeerRole::Client,
            PeerRole::Client => PeerRole::Server,
        }
    }
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerRole::Server => f.write_str("server"),
            PeerRole::Client => f.write_str("client"),
        }
    }
}

/// Wire tag of a packet. The numeric order is part of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    ClientHello = 0,
    ServerHello = 1,
    ServerReady = 2,
    ShipsReady = 3,
    BeginGame = 4,
    Move = 5,
    MoveResult = 6,
    EndGame = 7,
    Disconnect = 8,
}

impl TryFrom<u8> for PacketType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => PacketType::ClientHello,
            1 => PacketType::ServerHello,
            2 => PacketType::ServerReady,
            3 => PacketType::ShipsReady,
            4 => PacketType::BeginGame,
            5 => PacketType::Move,
            6 => PacketType::MoveResult,
            7 => PacketType::EndGame,
            8 => PacketType::Disconnect,
            tag => return Err(ProtocolError::UnknownPacketType { tag }),
        })
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PacketType::ClientHello => "client hello",
            PacketType::ServerHello => "server hello",
            PacketType::ServerReady => "server ready",
            PacketType::ShipsReady => "ships ready",
            PacketType::BeginGame => "begin game",
            PacketType::Move => "move",
            PacketType::MoveResult => "move result",
            PacketType::EndGame => "end game",
            PacketType::Disconnect => "disconnect",
        };
        f.write_str(name)
    }
}

/// Frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub packet_type: PacketType,
    pub length: u16,
}

/// Result of a move as reported to the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub outcome: ShotOutcome,
    /// Set when this shot sank the defender's last ship.
    pub win: bool,
}

/// One packet of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    ClientHello,
    ServerHello,
    ServerReady,
    ShipsReady,
    BeginGame { first: PeerRole },
    Move { row: u8, col: u8 },
    MoveResult(MoveResult),
    EndGame { winner: PeerRole },
    Disconnect { reason: String },
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::ClientHello => PacketType::ClientHello,
            Packet::ServerHello => PacketType::ServerHello,
            Packet::ServerReady => PacketType::ServerReady,
            Packet::ShipsReady => PacketType::ShipsReady,
            Packet::BeginGame { .. } => PacketType::BeginGame,
            Packet::Move { .. } => PacketType::Move,
            Packet::MoveResult(_) => PacketType::MoveResult,
            Packet::EndGame { .. } => PacketType::EndGame,
            Packet::Disconnect { .. } => PacketType::Disconnect,
        }
    }
}
