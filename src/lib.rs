//! Two-player networked Battleship.
//!
//! - [`core`]: boards, ships and targeting, usable without `std`
//! - [`protocol`]: packet types and the binary codec
//! - [`transport`]: framed connections over TCP or in-memory pipes
//! - [`session`]: the game state machine driving one side of a game
//! - [`player`]: who decides where ships go and where to shoot

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod core;
#[cfg(feature = "std")]
mod logging;
pub mod player;
pub mod protocol;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod transport;

pub use crate::core::*;
#[cfg(feature = "std")]
pub use logging::{init_logging, LOG_ENV};
pub use player::{AiPlayer, Player};
#[cfg(feature = "std")]
pub use player::CliPlayer;
pub use protocol::{MoveResult, Packet, PacketType, PeerRole, ProtocolError};
#[cfg(feature = "std")]
pub use session::{GameReport, GameSession, Phase, SessionConfig};
#[cfg(feature = "std")]
pub use transport::{in_memory, Connection, Stream};
