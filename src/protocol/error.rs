use alloc::string::String;
use core::time::Duration;
use thiserror::Error;

use super::PacketType;

/// Everything that can end a game session.
///
/// Codec failures, connection failures and session-level violations share
/// one type because every one of them terminates the game the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Fewer than the 3 header bytes were available.
    #[error("malformed packet header: got {received} of 3 bytes")]
    MalformedHeader { received: usize },

    /// Header announced a body longer than the protocol allows.
    #[error("packet too long: {length} bytes (max {max})")]
    OversizedBody { length: usize, max: usize },

    /// Body length does not match what the packet type requires.
    #[error("bad {packet} length: {actual} (expected {expected})")]
    WrongBodyLength {
        packet: PacketType,
        expected: usize,
        actual: usize,
    },

    /// A field held a value outside its legal range.
    #[error("invalid {field} field: {value}")]
    InvalidField { field: &'static str, value: u32 },

    /// Header carried a type tag we do not know.
    #[error("bad packet type: {tag}")]
    UnknownPacketType { tag: u8 },

    /// The stream ended in the middle of a packet body.
    #[error("didn't get all the bytes ({received} of {expected})")]
    TruncatedBody { received: usize, expected: usize },

    /// The peer closed the stream, or the connection is no longer usable.
    #[error("the connection was closed")]
    ConnectionClosed,

    /// Read or write failed at the OS level.
    #[error("I/O failure: {0}")]
    IoFailure(String),

    /// No complete packet arrived within the read deadline.
    #[error("no packet received within {0:?}")]
    Timeout(Duration),

    /// The peer ended the game with a `Disconnect` packet.
    #[error("peer disconnected: {reason}")]
    PeerDisconnected { reason: String },

    /// The peer sent something legal on the wire but illegal in the game.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The local side gave up, e.g. the player quit.
    #[error("game aborted: {0}")]
    Aborted(String),
}

impl ProtocolError {
    /// Whether the remote side should be told why we are leaving. Peers that
    /// already left, or closed the stream, are not written to. An I/O failure
    /// still gets a best-effort attempt.
    pub fn should_notify_peer(&self) -> bool {
        !matches!(
            self,
            ProtocolError::PeerDisconnected { .. } | ProtocolError::ConnectionClosed
        )
    }

    pub(crate) fn unexpected(expected: PacketType, got: PacketType) -> Self {
        ProtocolError::ProtocolViolation(alloc::format!("expected {}, got {}", expected, got))
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => ProtocolError::ConnectionClosed,
            _ => ProtocolError::IoFailure(alloc::format!("{}", err)),
        }
    }
}
