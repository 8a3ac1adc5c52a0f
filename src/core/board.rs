//! Board state for both sides of the game.
//!
//! [`OurBoard`] holds our fleet: where every ship sits, which cells the
//! opponent has shot and how much of each ship is still afloat.
//! [`TheirBoard`] is what we have learned about the opponent's grid from the
//! results of our own shots. It never knows where ships are, only where our
//! shots landed.

use crate::core::bitboard::BitBoard;
use crate::core::common::{BoardError, HitState, ShotOutcome};
use crate::core::config::{BOARD_SIZE, NUM_SHIPS, SHIPS};
use crate::core::ship::{Orientation, PlacedShip, ShipKind};
use core::fmt;
use rand::Rng;

pub type BB = BitBoard<u128, { BOARD_SIZE as usize }>;

const GRID: usize = BOARD_SIZE as usize;

fn hit_state_of(hits: &BB, misses: &BB, row: usize, col: usize) -> Result<HitState, BoardError> {
    if hits.get(row, col)? {
        Ok(HitState::Hit)
    } else if misses.get(row, col)? {
        Ok(HitState::Miss)
    } else {
        Ok(HitState::Empty)
    }
}

/// Our own board: ship placements and the opponent's shots against them.
#[derive(Clone, PartialEq, Eq)]
pub struct OurBoard {
    hits: BB,
    misses: BB,
    occupancy: [[Option<ShipKind>; GRID]; GRID],
    ships: [Option<PlacedShip>; NUM_SHIPS],
    ships_remaining: usize,
}

impl OurBoard {
    /// Create an empty board (no ships placed).
    pub fn new() -> Self {
        Self {
            hits: BB::new(),
            misses: BB::new(),
            occupancy: [[None; GRID]; GRID],
            ships: [None; NUM_SHIPS],
            ships_remaining: 0,
        }
    }

    /// Returns `true` if a ship of `length` starting at (`row`, `col`) would
    /// leave the grid or cross an occupied cell.
    pub fn is_obstructed(
        &self,
        row: usize,
        col: usize,
        orientation: Orientation,
        length: usize,
    ) -> bool {
        (0..length).any(|i| {
            let (r, c) = orientation.step(row, col, i);
            r >= GRID || c >= GRID || self.occupancy[r][c].is_some()
        })
    }

    /// Place `kind` with its origin at (`row`, `col`).
    pub fn place(
        &mut self,
        kind: ShipKind,
        row: usize,
        col: usize,
        orientation: Orientation,
    ) -> Result<(), BoardError> {
        if self.ships[kind.index()].is_some() {
            return Err(BoardError::ShipAlreadyPlaced);
        }
        if self.is_obstructed(row, col, orientation, kind.length()) {
            return Err(BoardError::Obstructed);
        }
        let ship = PlacedShip::new(kind, row, col, orientation);
        for (r, c) in ship.cells() {
            self.occupancy[r][c] = Some(kind);
        }
        self.ships[kind.index()] = Some(ship);
        self.ships_remaining += 1;
        Ok(())
    }

    /// Pick a placement for `kind` uniformly among every legal
    /// `(row, col, orientation)` on the current board.
    pub fn random_placement<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: ShipKind,
    ) -> Result<(usize, usize, Orientation), BoardError> {
        let count = self.legal_placements(kind.length()).count();
        if count == 0 {
            return Err(BoardError::UnableToPlaceShip);
        }
        let pick = rng.random_range(0..count);
        self.legal_placements(kind.length())
            .nth(pick)
            .ok_or(BoardError::UnableToPlaceShip)
    }

    /// Every unobstructed origin and orientation for a ship of `length`,
    /// row-major with horizontal before vertical.
    pub fn legal_placements(
        &self,
        length: usize,
    ) -> impl Iterator<Item = (usize, usize, Orientation)> + '_ {
        (0..GRID)
            .flat_map(|r| (0..GRID).flat_map(move |c| Orientation::ALL.map(move |o| (r, c, o))))
            .filter(move |&(r, c, o)| !self.is_obstructed(r, c, o, length))
    }

    /// Place every ship not yet on the board at a random legal position.
    pub fn place_all_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        for kind in SHIPS {
            if self.ships[kind.index()].is_some() {
                continue;
            }
            let (r, c, o) = self.random_placement(rng, kind)?;
            self.place(kind, r, c, o)?;
        }
        Ok(())
    }

    /// Resolve an opponent shot at (`row`, `col`).
    pub fn register_shot(&mut self, row: usize, col: usize) -> Result<ShotOutcome, BoardError> {
        if hit_state_of(&self.hits, &self.misses, row, col)? != HitState::Empty {
            return Err(BoardError::AlreadyShot { row, col });
        }
        let Some(kind) = self.occupancy[row][col] else {
            self.misses.set(row, col)?;
            return Ok(ShotOutcome::Miss);
        };
        self.hits.set(row, col)?;
        // Occupancy is only ever written together with the matching ship slot.
        let ship = self.ships[kind.index()]
            .as_mut()
            .ok_or(BoardError::UnknownShipHit)?;
        ship.remaining = ship.remaining.saturating_sub(1);
        if ship.is_sunk() {
            self.ships_remaining -= 1;
            Ok(ShotOutcome::Sink(*ship))
        } else {
            Ok(ShotOutcome::Hit)
        }
    }

    /// Returns `true` once every placed ship has been sunk.
    pub fn is_game_lost(&self) -> bool {
        self.ships_remaining == 0
    }

    /// Number of ships still afloat.
    pub fn ships_remaining(&self) -> usize {
        self.ships_remaining
    }

    /// Returns `true` when the whole fleet has been placed.
    pub fn is_fleet_complete(&self) -> bool {
        self.ships.iter().all(Option::is_some)
    }

    pub fn hit_state(&self, row: usize, col: usize) -> Result<HitState, BoardError> {
        hit_state_of(&self.hits, &self.misses, row, col)
    }

    /// Kind of ship occupying (`row`, `col`), if any.
    pub fn ship_at(&self, row: usize, col: usize) -> Option<ShipKind> {
        self.occupancy.get(row)?.get(col).copied().flatten()
    }

    pub fn ship(&self, kind: ShipKind) -> Option<&PlacedShip> {
        self.ships[kind.index()].as_ref()
    }

    /// Placed ships in fleet order.
    pub fn ships(&self) -> impl Iterator<Item = &PlacedShip> {
        self.ships.iter().flatten()
    }

    pub fn hits(&self) -> BB {
        self.hits
    }

    pub fn misses(&self) -> BB {
        self.misses
    }

    /// Number of opponent shots resolved against this board.
    pub fn shots_received(&self) -> usize {
        (self.hits | self.misses).count_ones()
    }
}

impl Default for OurBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OurBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "OurBoard {{\n  hits:\n{:?}  misses:\n{:?}  ships: {:?},\n  ships_remaining: {}\n}}",
            self.hits, self.misses, self.ships, self.ships_remaining
        )
    }
}

/// Our knowledge of the opponent's board, built from move results.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TheirBoard {
    hits: BB,
    misses: BB,
    sunk: [bool; NUM_SHIPS],
    sunk_cells: BB,
}

impl TheirBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of our shot at (`row`, `col`).
    pub fn record(
        &mut self,
        row: usize,
        col: usize,
        outcome: &ShotOutcome,
    ) -> Result<(), BoardError> {
        if self.is_shot(row, col)? {
            return Err(BoardError::AlreadyShot { row, col });
        }
        match outcome {
            ShotOutcome::Miss => self.misses.set(row, col)?,
            ShotOutcome::Hit => self.hits.set(row, col)?,
            ShotOutcome::Sink(ship) => {
                if let Some((r, c)) = ship.cells().find(|&(r, c)| r >= GRID || c >= GRID) {
                    return Err(BoardError::OutOfBounds { row: r, col: c });
                }
                self.hits.set(row, col)?;
                for (r, c) in ship.cells() {
                    self.sunk_cells.set(r, c)?;
                }
                self.sunk[ship.kind.index()] = true;
            }
        }
        Ok(())
    }

    /// Returns `true` if we already fired at (`row`, `col`).
    pub fn is_shot(&self, row: usize, col: usize) -> Result<bool, BoardError> {
        Ok(self.hit_state(row, col)? != HitState::Empty)
    }

    pub fn hit_state(&self, row: usize, col: usize) -> Result<HitState, BoardError> {
        hit_state_of(&self.hits, &self.misses, row, col)
    }

    pub fn hits(&self) -> BB {
        self.hits
    }

    pub fn misses(&self) -> BB {
        self.misses
    }

    pub fn is_sunk(&self, kind: ShipKind) -> bool {
        self.sunk[kind.index()]
    }

    /// Cells covered by enemy ships known to be sunk.
    pub fn sunk_cells(&self) -> BB {
        self.sunk_cells
    }

    /// Number of enemy ships known to be sunk.
    pub fn ships_sunk(&self) -> usize {
        self.sunk.iter().filter(|&&s| s).count()
    }

    /// Lengths of enemy ships not yet sunk. Entries are zero for sunk ships,
    /// keeping the output fixed-size.
    pub fn remaining_lengths(&self) -> [usize; NUM_SHIPS] {
        core::array::from_fn(|i| if self.sunk[i] { 0 } else { SHIPS[i].length() })
    }

    /// Every cell we have fired at.
    pub fn shots(&self) -> BB {
        self.hits | self.misses
    }

    /// Number of shots we have fired.
    pub fn shots_fired(&self) -> usize {
        self.shots().count_ones()
    }
}

impl fmt::Debug for TheirBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "TheirBoard {{\n  hits:\n{:?}  misses:\n{:?}  sunk: {:?}\n}}",
            self.hits, self.misses, self.sunk
        )
    }
}
