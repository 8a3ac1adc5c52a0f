use crate::core::{ai, BoardError, OurBoard, TheirBoard};
use rand::rngs::SmallRng;

use super::Player;

/// Computer player: random fleet, probability-density targeting.
#[derive(Debug, Default, Clone, Copy)]
pub struct AiPlayer;

impl AiPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Player for AiPlayer {
    fn place_ships(&mut self, rng: &mut SmallRng, board: &mut OurBoard) -> Result<(), BoardError> {
        board.place_all_random(rng)
    }

    fn select_target(&mut self, rng: &mut SmallRng, view: &TheirBoard) -> Option<(usize, usize)> {
        ai::calc_pdf_and_guess(view, rng)
    }
}
