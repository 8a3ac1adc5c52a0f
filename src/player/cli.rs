#![cfg(feature = "std")]

use std::io::{self, BufRead, Write};

use crate::core::{
    ai, BoardError, GameOutcome, HitState, OurBoard, Orientation, ShotOutcome, TheirBoard,
    BOARD_SIZE, SHIPS,
};
use crate::protocol::MoveResult;
use rand::rngs::SmallRng;

use super::Player;

const GRID: usize = BOARD_SIZE as usize;

/// Interactive player reading commands from stdin.
#[derive(Debug, Default)]
pub struct CliPlayer;

impl CliPlayer {
    pub fn new() -> Self {
        Self
    }
}

/// Format `(row, col)` the way the player types it, e.g. `C4`.
pub fn coord_to_string(r: usize, c: usize) -> String {
    let col = (b'A' + c as u8) as char;
    format!("{}{}", col, r + 1)
}

/// Parse a cell such as `A5` or `j10` into `(row, col)`.
pub fn parse_coord(input: &str) -> Result<(usize, usize), String> {
    if input.is_empty() {
        return Err("Empty input".to_string());
    }
    if input.len() < 2 {
        return Err("Too short - need column letter and row number (e.g., A5)".to_string());
    }
    let mut chars = input.chars();
    let col_ch = chars.next().ok_or("No column letter")?.to_ascii_uppercase();
    if !col_ch.is_ascii_alphabetic() {
        return Err(format!("Invalid column '{}' - must be a letter A-J", col_ch));
    }
    let col = (col_ch as u8).wrapping_sub(b'A') as usize;
    if col >= GRID {
        return Err(format!("Column '{}' out of bounds - must be A-J", col_ch));
    }
    let row_str: String = chars.collect();
    let row: usize = row_str
        .parse()
        .map_err(|_| format!("Invalid row '{}' - must be a number 1-10", row_str))?;
    if row == 0 {
        return Err("Row cannot be 0 - must be 1-10".to_string());
    }
    if row > GRID {
        return Err(format!("Row {} out of bounds - must be 1-10", row));
    }
    Ok((row - 1, col))
}

/// Parse a placement such as `A5 H`. Orientation defaults to horizontal.
pub fn parse_placement(input: &str) -> Result<(usize, usize, Orientation), String> {
    let mut parts = input.split_whitespace();
    let (r, c) = parse_coord(parts.next().unwrap_or(""))?;
    let orientation = match parts.next().and_then(|s| s.chars().next()) {
        None | Some('h' | 'H') => Orientation::Horizontal,
        Some('v' | 'V') => Orientation::Vertical,
        Some(other) => {
            return Err(format!("Invalid orientation '{}' - use H or V", other));
        }
    };
    Ok((r, c, orientation))
}

/// Read one trimmed line from stdin; `None` at end of input.
fn prompt(text: &str) -> Option<String> {
    print!("{}", text);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn print_grid(cell: impl Fn(usize, usize) -> char) {
    println!("    ╔═══════════════════════╗");
    print!("    ║  ");
    for c in 0..GRID {
        print!(" {}", (b'A' + c as u8) as char);
    }
    println!(" ║");
    println!("    ╠═══════════════════════╣");
    for r in 0..GRID {
        print!("    ║ {:2}", r + 1);
        for c in 0..GRID {
            print!(" {}", cell(r, c));
        }
        println!(" ║");
    }
    println!("    ╚═══════════════════════╝");
}

fn print_our_board(board: &OurBoard) {
    print_grid(|r, c| match board.hit_state(r, c) {
        Ok(HitState::Hit) => 'X',
        Ok(HitState::Miss) => 'o',
        _ => board.ship_at(r, c).map_or('.', |kind| kind.symbol()),
    });
    println!("    Legend: A/B/C/S/D=Ship  X=Hit  o=Miss  .=Water");
    println!("\n    Ships:");
    for kind in SHIPS {
        let status = match board.ship(kind) {
            None => "Not placed",
            Some(ship) if ship.is_sunk() => "SUNK",
            Some(_) => "Active",
        };
        println!("      {} ({}): {}", kind.name(), kind.length(), status);
    }
}

fn print_their_board(view: &TheirBoard) {
    print_grid(|r, c| match view.hit_state(r, c) {
        Ok(HitState::Hit) => 'X',
        Ok(HitState::Miss) => 'o',
        _ => '.',
    });
    println!("    Legend: X=Hit  o=Miss  .=Unknown");
}

impl Player for CliPlayer {
    fn place_ships(&mut self, rng: &mut SmallRng, board: &mut OurBoard) -> Result<(), BoardError> {
        println!("\n════════════════════════════════════════════════════════════");
        println!("                    SHIP PLACEMENT PHASE");
        println!("════════════════════════════════════════════════════════════");

        let mut proposal = OurBoard::new();
        proposal.place_all_random(rng)?;
        print_our_board(&proposal);
        match prompt("\nUse this random arrangement? (y/n): ") {
            None => {
                *board = proposal;
                return Ok(());
            }
            Some(answer) if answer.eq_ignore_ascii_case("y") || answer.is_empty() => {
                *board = proposal;
                return Ok(());
            }
            Some(_) => {}
        }

        println!("\nInstructions:");
        println!("  • Enter coordinates and orientation (e.g., A5 H or A5 V)");
        println!("  • H = Horizontal, V = Vertical");
        println!("  • Press ENTER for random placement");
        println!("  • Type 'help' for more information\n");

        for (i, kind) in SHIPS.into_iter().enumerate() {
            loop {
                print_our_board(board);
                println!(
                    "\nShip {}/{}: {} (length {})",
                    i + 1,
                    SHIPS.len(),
                    kind.name(),
                    kind.length()
                );
                // Out of input: let the session finish the fleet at random.
                let Some(line) = prompt("Enter placement (or ENTER for random, 'help' for help): ")
                else {
                    return Ok(());
                };

                if line.is_empty() {
                    let (r, c, o) = board.random_placement(rng, kind)?;
                    board.place(kind, r, c, o)?;
                    println!("✓ {} randomly placed at {}", kind.name(), coord_to_string(r, c));
                    break;
                }
                if line.eq_ignore_ascii_case("help") {
                    print_placement_help();
                    continue;
                }

                let (r, c, o) = match parse_placement(&line) {
                    Ok(placement) => placement,
                    Err(e) => {
                        println!("✗ Error: {}", e);
                        continue;
                    }
                };
                match board.place(kind, r, c, o) {
                    Ok(()) => {
                        println!("✓ {} placed at {}", kind.name(), coord_to_string(r, c));
                        break;
                    }
                    Err(e) => {
                        println!("✗ Error: {}", e);
                        println!("   Hint: Make sure the ship fits and doesn't overlap with others.");
                    }
                }
            }
        }
        println!("\n✓ All ships placed! Ready to begin battle.\n");
        Ok(())
    }

    fn select_target(&mut self, rng: &mut SmallRng, view: &TheirBoard) -> Option<(usize, usize)> {
        let suggestion = ai::calc_pdf_and_guess(view, rng);
        loop {
            let text = match suggestion {
                Some((sr, sc)) => format!(
                    "\nEnter target coordinates [AI suggests: {}] (or 'help', 'quit'): ",
                    coord_to_string(sr, sc)
                ),
                None => "\nEnter target coordinates (or 'help', 'quit'): ".to_string(),
            };
            let line = prompt(&text)?;

            if line.is_empty() {
                if let Some((sr, sc)) = suggestion {
                    println!("Using AI suggestion: {}", coord_to_string(sr, sc));
                    return suggestion;
                }
                continue;
            }
            if line.eq_ignore_ascii_case("quit") {
                return None;
            }
            if line.eq_ignore_ascii_case("help") {
                print_targeting_help();
                continue;
            }

            match parse_coord(&line) {
                Ok((r, c)) => match view.hit_state(r, c) {
                    Ok(HitState::Hit) => {
                        println!("✗ You already hit that location! Choose another target.");
                    }
                    Ok(HitState::Miss) => {
                        println!("✗ You already missed that location! Choose another target.");
                    }
                    _ => return Some((r, c)),
                },
                Err(e) => {
                    println!("✗ Invalid coordinate: {}", e);
                    println!("   Example: A5, B10, J1");
                }
            }
        }
    }

    fn confirm_start(&mut self) {
        let _ = prompt("\nOpponent connected. Press ENTER to start the game...");
    }

    fn show_boards(&mut self, ours: &OurBoard, theirs: &TheirBoard) {
        println!("\nOpponent board:");
        print_their_board(theirs);
        println!("\nYour board:");
        print_our_board(ours);
    }

    fn handle_shot_result(&mut self, coord: (usize, usize), result: &MoveResult) {
        let at = coord_to_string(coord.0, coord.1);
        match result.outcome {
            ShotOutcome::Hit => println!("\n🎯 HIT! Your shot at {} struck an enemy ship!", at),
            ShotOutcome::Miss => println!("\n💧 Miss. Your shot at {} hit only water.", at),
            ShotOutcome::Sink(ship) => {
                println!("\n💥 SUNK! You destroyed the enemy's {}!", ship.kind.name())
            }
        }
    }

    fn handle_opponent_shot(&mut self, coord: (usize, usize), outcome: &ShotOutcome) {
        let at = coord_to_string(coord.0, coord.1);
        match outcome {
            ShotOutcome::Hit => println!("\n⚠️  ENEMY HIT! They struck your ship at {}", at),
            ShotOutcome::Miss => println!("\n✓ Enemy missed at {}", at),
            ShotOutcome::Sink(ship) => {
                println!("\n💀 SHIP LOST! Enemy destroyed your {} at {}", ship.kind.name(), at)
            }
        }
    }

    fn game_over(&mut self, outcome: GameOutcome, ours: &OurBoard, theirs: &TheirBoard) {
        self.show_boards(ours, theirs);
        match outcome {
            GameOutcome::Victory => println!("\n🏆 VICTORY! You sank the entire enemy fleet."),
            GameOutcome::Defeat => println!("\n☠️  DEFEAT. Your fleet has been sunk."),
        }
    }
}

fn print_placement_help() {
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║              SHIP PLACEMENT HELP                       ║");
    println!("╠════════════════════════════════════════════════════════╣");
    println!("║ Format: <COLUMN><ROW> <ORIENTATION>                    ║");
    println!("║                                                        ║");
    println!("║ Examples:                                              ║");
    println!("║   A5 H    - Place ship at A5, horizontal                ║");
    println!("║   B3 V    - Place ship at B3, vertical                  ║");
    println!("║                                                        ║");
    println!("║ Valid columns: A-J (A is leftmost)                     ║");
    println!("║ Valid rows: 1-10 (1 is topmost)                        ║");
    println!("║ Ships extend right (H) or down (V) from the origin.    ║");
    println!("║                                                        ║");
    println!("║ Press ENTER without input for random placement of      ║");
    println!("║ the current ship.                                      ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}

fn print_targeting_help() {
    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║                  TARGETING HELP                        ║");
    println!("╠════════════════════════════════════════════════════════╣");
    println!("║ Format: <COLUMN><ROW>, e.g. A5, B10, J1                ║");
    println!("║                                                        ║");
    println!("║ Board symbols:                                         ║");
    println!("║   X = Hit (you struck an enemy ship)                   ║");
    println!("║   o = Miss (shot hit water)                            ║");
    println!("║   . = Unknown (not yet targeted)                       ║");
    println!("║                                                        ║");
    println!("║ Press ENTER to fire at the AI suggestion.              ║");
    println!("║ Type 'quit' to leave the game.                         ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}
