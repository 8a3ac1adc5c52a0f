//! Player trait and implementations
//!
//! A player decides where the fleet goes and where to shoot. The session
//! owns the boards and the connection and consults the player at each step:
//! - AiPlayer: probability-based targeting, random placement
//! - CliPlayer: interactive command-line player

use alloc::boxed::Box;

use crate::core::{BoardError, GameOutcome, OurBoard, ShotOutcome, TheirBoard};
use crate::protocol::MoveResult;
use rand::rngs::SmallRng;

/// Interface implemented by different player types.
pub trait Player: Send {
    /// Place all ships onto the provided board.
    ///
    /// Ships left unplaced when this returns are placed at random by the
    /// session.
    fn place_ships(&mut self, rng: &mut SmallRng, board: &mut OurBoard) -> Result<(), BoardError>;

    /// Choose the next cell to fire at. `None` means the player quits.
    fn select_target(&mut self, rng: &mut SmallRng, view: &TheirBoard) -> Option<(usize, usize)>;

    /// Called on the hosting side before the game starts.
    fn confirm_start(&mut self) {}

    /// Called before each of our turns.
    fn show_boards(&mut self, _ours: &OurBoard, _theirs: &TheirBoard) {}

    /// Inform the player of the result of its last shot.
    fn handle_shot_result(&mut self, _coord: (usize, usize), _result: &MoveResult) {}

    /// Inform the player of an opponent shot against its board.
    fn handle_opponent_shot(&mut self, _coord: (usize, usize), _outcome: &ShotOutcome) {}

    /// Called once the game has been decided.
    fn game_over(&mut self, _outcome: GameOutcome, _ours: &OurBoard, _theirs: &TheirBoard) {}
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn place_ships(&mut self, rng: &mut SmallRng, board: &mut OurBoard) -> Result<(), BoardError> {
        (**self).place_ships(rng, board)
    }

    fn select_target(&mut self, rng: &mut SmallRng, view: &TheirBoard) -> Option<(usize, usize)> {
        (**self).select_target(rng, view)
    }

    fn confirm_start(&mut self) {
        (**self).confirm_start()
    }

    fn show_boards(&mut self, ours: &OurBoard, theirs: &TheirBoard) {
        (**self).show_boards(ours, theirs)
    }

    fn handle_shot_result(&mut self, coord: (usize, usize), result: &MoveResult) {
        (**self).handle_shot_result(coord, result)
    }

    fn handle_opponent_shot(&mut self, coord: (usize, usize), outcome: &ShotOutcome) {
        (**self).handle_opponent_shot(coord, outcome)
    }

    fn game_over(&mut self, outcome: GameOutcome, ours: &OurBoard, theirs: &TheirBoard) {
        (**self).game_over(outcome, ours, theirs)
    }
}

pub mod ai;
pub use ai::AiPlayer;

#[cfg(feature = "std")]
pub mod cli;
#[cfg(feature = "std")]
pub use cli::CliPlayer;
