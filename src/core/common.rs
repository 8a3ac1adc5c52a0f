//! Common types for the board model: cell states, shot outcomes and errors.

use super::bitboard::BitBoardError;
use super::ship::PlacedShip;

/// What is known about a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitState {
    #[default]
    Empty,
    Hit,
    Miss,
}

/// Result of resolving a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Shot landed in open water.
    Miss,
    /// Shot struck a ship that is still afloat.
    Hit,
    /// Shot struck the last intact cell of a ship; carries its full placement.
    Sink(PlacedShip),
}

impl ShotOutcome {
    /// Whether the shot struck a ship.
    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }
}

/// How a finished game ended for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub enum GameOutcome {
    Victory,
    Defeat,
}

/// Errors returned by board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Underlying bitboard error.
    BitBoardError(BitBoardError),
    /// Coordinate lies outside the grid.
    OutOfBounds { row: usize, col: usize },
    /// Placement runs off the grid or overlaps another ship.
    Obstructed,
    /// This kind of ship is already on the board.
    ShipAlreadyPlaced,
    /// The cell has already been shot at.
    AlreadyShot { row: usize, col: usize },
    /// No legal placement exists for the ship.
    UnableToPlaceShip,
    /// An occupied cell had no matching ship record.
    UnknownShipHit,
}

impl From<BitBoardError> for BoardError {
    fn from(err: BitBoardError) -> Self {
        match err {
            BitBoardError::IndexOutOfBounds { row, col } => BoardError::OutOfBounds { row, col },
            other => BoardError::BitBoardError(other),
        }
    }
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::BitBoardError(e) => write!(f, "BitBoard error: {}", e),
            BoardError::OutOfBounds { row, col } => {
                write!(f, "Coordinate ({}, {}) is off the board", row, col)
            }
            BoardError::Obstructed => write!(f, "This location is obstructed"),
            BoardError::ShipAlreadyPlaced => write!(f, "Ship is already placed on the board"),
            BoardError::AlreadyShot { row, col } => {
                write!(f, "Cell ({}, {}) has already been shot", row, col)
            }
            BoardError::UnableToPlaceShip => write!(f, "Unable to place ship"),
            BoardError::UnknownShipHit => write!(f, "Hit cell does not belong to any ship"),
        }
    }
}
