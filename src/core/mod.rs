//! Core game model (no_std compatible).
//!
//! Pure board logic with no I/O: ship placement, shot resolution and
//! targeting. Depends only on num-traits, libm and rand's alloc feature.

pub mod ai;
pub mod bitboard;
pub mod board;
pub mod common;
pub mod config;
pub mod ship;

pub use ai::{calc_pdf, calc_pdf_and_guess, sample_pdf, Pdf};
pub use bitboard::{BitBoard, BitBoardError};
pub use board::{OurBoard, TheirBoard, BB};
pub use common::{BoardError, GameOutcome, HitState, ShotOutcome};
pub use config::*;
pub use ship::{Orientation, PlacedShip, ShipKind};
