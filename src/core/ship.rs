//! Ship kinds, orientations and placed-ship records.

use core::fmt;

/// Orientation of a ship on the board. Ships extend right (horizontal) or
/// down (vertical) from their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    /// Wire code: 0 horizontal, 1 vertical.
    pub const fn code(self) -> u8 {
        match self {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Orientation::Horizontal),
            1 => Some(Orientation::Vertical),
            _ => None,
        }
    }

    /// Cell `offset` steps from `(row, col)` along this orientation.
    #[inline]
    pub const fn step(self, row: usize, col: usize, offset: usize) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (row, col + offset),
            Orientation::Vertical => (row + offset, col),
        }
    }
}

/// The five kinds of ship in a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            ShipKind::Carrier => "Aircraft Carrier",
            ShipKind::Battleship => "Battleship",
            ShipKind::Cruiser => "Cruiser",
            ShipKind::Submarine => "Submarine",
            ShipKind::Destroyer => "Destroyer",
        }
    }

    /// Number of cells the ship occupies.
    pub const fn length(self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }

    /// Position in the fleet, also the wire code.
    pub const fn index(self) -> usize {
        match self {
            ShipKind::Carrier => 0,
            ShipKind::Battleship => 1,
            ShipKind::Cruiser => 2,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 4,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ShipKind::Carrier),
            1 => Some(ShipKind::Battleship),
            2 => Some(ShipKind::Cruiser),
            3 => Some(ShipKind::Submarine),
            4 => Some(ShipKind::Destroyer),
            _ => None,
        }
    }

    /// Single-letter tag used when rendering our own board.
    pub const fn symbol(self) -> char {
        match self {
            ShipKind::Carrier => 'A',
            ShipKind::Battleship => 'B',
            ShipKind::Cruiser => 'C',
            ShipKind::Submarine => 'S',
            ShipKind::Destroyer => 'D',
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ship placed on our board, with the count of its cells still afloat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub struct PlacedShip {
    pub kind: ShipKind,
    pub row: usize,
    pub col: usize,
    pub orientation: Orientation,
    pub length: usize,
    pub remaining: usize,
}

impl PlacedShip {
    pub fn new(kind: ShipKind, row: usize, col: usize, orientation: Orientation) -> Self {
        Self {
            kind,
            row,
            col,
            orientation,
            length: kind.length(),
            remaining: kind.length(),
        }
    }

    pub fn is_sunk(&self) -> bool {
        self.remaining == 0
    }

    /// Cells covered by the ship, origin first.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.length).map(move |i| self.orientation.step(self.row, self.col, i))
    }

    /// Whether the ship covers `(row, col)`.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.cells().any(|cell| cell == (row, col))
    }
}
