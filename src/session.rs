//! One game against one peer, driven over a [`Connection`].
//!
//! The session owns both boards and the connection, and walks the phases in
//! order:
//!
//! ```text
//! Init -> HelloExchanged -> WaitReady -> ShipsPlaced -> TurnAssigned
//!      -> TurnLoop -> GameOver
//! ```
//!
//! Any error moves it to `Disconnected` and ends the game. Unless the peer
//! already left or the link is dead, the peer is sent a `Disconnect` naming
//! the error first.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::Serialize;
use tokio::time::Duration;

use crate::core::{BoardError, GameOutcome, OurBoard, ShotOutcome, TheirBoard, NUM_SHIPS};
use crate::player::Player;
use crate::protocol::{MoveResult, Packet, PacketType, PeerRole, ProtocolError};
use crate::transport::{Connection, Stream};

/// Runtime knobs for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for any single packet. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

/// Where a session is in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    HelloExchanged,
    WaitReady,
    ShipsPlaced,
    TurnAssigned,
    TurnLoop,
    GameOver,
    Disconnected,
}

/// Summary of a finished game from one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameReport {
    pub role: PeerRole,
    pub outcome: GameOutcome,
    pub first: PeerRole,
    pub shots_fired: usize,
    pub shots_received: usize,
    pub ships_remaining: usize,
}

pub struct GameSession<S, P> {
    conn: Connection<S>,
    player: P,
    rng: SmallRng,
    our_board: OurBoard,
    their_board: TheirBoard,
    first: PeerRole,
    turn: PeerRole,
    phase: Phase,
}

impl<S: Stream, P: Player> GameSession<S, P> {
    pub fn new(conn: Connection<S>, player: P, rng: SmallRng) -> Self {
        Self {
            conn,
            player,
            rng,
            our_board: OurBoard::new(),
            their_board: TheirBoard::new(),
            first: PeerRole::Server,
            turn: PeerRole::Server,
            phase: Phase::Init,
        }
    }

    pub fn with_config(
        mut conn: Connection<S>,
        player: P,
        rng: SmallRng,
        config: SessionConfig,
    ) -> Self {
        conn.set_read_timeout(config.read_timeout);
        Self::new(conn, player, rng)
    }

    pub fn role(&self) -> PeerRole {
        self.conn.role()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn our_board(&self) -> &OurBoard {
        &self.our_board
    }

    pub fn their_board(&self) -> &TheirBoard {
        &self.their_board
    }

    pub fn connection(&self) -> &Connection<S> {
        &self.conn
    }

    pub fn into_connection(self) -> Connection<S> {
        self.conn
    }

    /// Play the game to the end.
    pub async fn run(&mut self) -> Result<GameReport, ProtocolError> {
        match self.play().await {
            Ok(report) => Ok(report),
            Err(err) => {
                log::info!("[{}] game ended: {}", self.role(), err);
                if err.should_notify_peer() {
                    self.conn.disconnect(&err.to_string()).await;
                }
                self.enter(Phase::Disconnected);
                Err(err)
            }
        }
    }

    async fn play(&mut self) -> Result<GameReport, ProtocolError> {
        self.exchange_hello().await?;
        self.wait_ready().await?;
        self.place_ships().await?;
        self.assign_turn().await?;
        let outcome = self.turn_loop().await?;
        self.acknowledge_end(outcome).await?;
        self.player.game_over(outcome, &self.our_board, &self.their_board);
        Ok(self.report(outcome))
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("[{}] {:?} -> {:?}", self.role(), self.phase, phase);
        self.phase = phase;
    }

    /// Next packet from the peer. A `Disconnect` ends the game here.
    async fn next_packet(&mut self) -> Result<Packet, ProtocolError> {
        match self.conn.receive().await? {
            Packet::Disconnect { reason } => Err(ProtocolError::PeerDisconnected { reason }),
            packet => Ok(packet),
        }
    }

    /// Wait for a packet of type `expected`.
    async fn expect(&mut self, expected: PacketType) -> Result<Packet, ProtocolError> {
        let packet = self.next_packet().await?;
        if packet.packet_type() == expected {
            Ok(packet)
        } else {
            Err(ProtocolError::unexpected(expected, packet.packet_type()))
        }
    }

    async fn exchange_hello(&mut self) -> Result<(), ProtocolError> {
        match self.role() {
            PeerRole::Client => {
                self.conn.send(&Packet::ClientHello).await?;
                self.expect(PacketType::ServerHello).await?;
            }
            PeerRole::Server => {
                self.expect(PacketType::ClientHello).await?;
                self.conn.send(&Packet::ServerHello).await?;
            }
        }
        self.enter(Phase::HelloExchanged);
        Ok(())
    }

    async fn wait_ready(&mut self) -> Result<(), ProtocolError> {
        match self.role() {
            PeerRole::Server => {
                self.player.confirm_start();
                self.conn.send(&Packet::ServerReady).await?;
            }
            PeerRole::Client => {
                self.expect(PacketType::ServerReady).await?;
            }
        }
        self.enter(Phase::WaitReady);
        Ok(())
    }

    async fn place_ships(&mut self) -> Result<(), ProtocolError> {
        if let Err(e) = self.player.place_ships(&mut self.rng, &mut self.our_board) {
            log::warn!("[{}] player placement failed: {}", self.role(), e);
        }
        if !self.our_board.is_fleet_complete() {
            self.our_board
                .place_all_random(&mut self.rng)
                .map_err(|e| ProtocolError::Aborted(format!("could not place fleet: {}", e)))?;
        }
        self.conn.send(&Packet::ShipsReady).await?;
        self.expect(PacketType::ShipsReady).await?;
        self.enter(Phase::ShipsPlaced);
        Ok(())
    }

    async fn assign_turn(&mut self) -> Result<(), ProtocolError> {
        let first = match self.role() {
            PeerRole::Server => {
                let first = if self.rng.random::<bool>() {
                    PeerRole::Server
                } else {
                    PeerRole::Client
                };
                self.conn.send(&Packet::BeginGame { first }).await?;
                first
            }
            PeerRole::Client => match self.next_packet().await? {
                Packet::BeginGame { first } => first,
                other => {
                    return Err(ProtocolError::unexpected(
                        PacketType::BeginGame,
                        other.packet_type(),
                    ))
                }
            },
        };
        log::info!("[{}] {} moves first", self.role(), first);
        self.first = first;
        self.turn = first;
        self.enter(Phase::TurnAssigned);
        Ok(())
    }

    async fn turn_loop(&mut self) -> Result<GameOutcome, ProtocolError> {
        self.enter(Phase::TurnLoop);
        loop {
            let finished = if self.turn == self.role() {
                self.attack().await?
            } else {
                self.defend().await?
            };
            if let Some(outcome) = finished {
                log::info!("[{}] game over: {:?}", self.role(), outcome);
                self.enter(Phase::GameOver);
                return Ok(outcome);
            }
            self.turn = self.turn.opponent();
        }
    }

    async fn attack(&mut self) -> Result<Option<GameOutcome>, ProtocolError> {
        self.player.show_boards(&self.our_board, &self.their_board);
        let (row, col) = loop {
            let Some((row, col)) = self.player.select_target(&mut self.rng, &self.their_board)
            else {
                return Err(ProtocolError::Aborted("player quit".into()));
            };
            match self.their_board.is_shot(row, col) {
                Ok(false) => break (row, col),
                Ok(true) => log::warn!("[{}] ({}, {}) already fired at", self.role(), row, col),
                Err(e) => log::warn!("[{}] rejected target: {}", self.role(), e),
            }
        };

        self.conn
            .send(&Packet::Move {
                row: row as u8,
                col: col as u8,
            })
            .await?;
        let result = match self.next_packet().await? {
            Packet::MoveResult(result) => result,
            other => {
                return Err(ProtocolError::unexpected(
                    PacketType::MoveResult,
                    other.packet_type(),
                ))
            }
        };

        if let ShotOutcome::Sink(ship) = &result.outcome {
            if !ship.covers(row, col) {
                return Err(ProtocolError::ProtocolViolation(format!(
                    "sunk {} does not cover ({}, {})",
                    ship.kind, row, col
                )));
            }
            if self.their_board.is_sunk(ship.kind) {
                return Err(ProtocolError::ProtocolViolation(format!(
                    "{} reported sunk twice",
                    ship.kind
                )));
            }
        }
        self.their_board
            .record(row, col, &result.outcome)
            .map_err(|e| ProtocolError::ProtocolViolation(e.to_string()))?;
        // The defender's win flag must agree with the fleet we have sunk.
        let all_sunk = self.their_board.ships_sunk() == NUM_SHIPS;
        if result.win != all_sunk {
            return Err(ProtocolError::ProtocolViolation(format!(
                "win flag {} with {} ships sunk",
                result.win,
                self.their_board.ships_sunk()
            )));
        }
        log::debug!("[{}] shot ({}, {}): {:?}", self.role(), row, col, result.outcome);
        self.player.handle_shot_result((row, col), &result);

        Ok(result.win.then_some(GameOutcome::Victory))
    }

    async fn defend(&mut self) -> Result<Option<GameOutcome>, ProtocolError> {
        let (row, col) = match self.next_packet().await? {
            Packet::Move { row, col } => (row as usize, col as usize),
            other => {
                return Err(ProtocolError::unexpected(PacketType::Move, other.packet_type()))
            }
        };

        let outcome = match self.our_board.register_shot(row, col) {
            Ok(outcome) => outcome,
            Err(BoardError::AlreadyShot { row, col }) => {
                return Err(ProtocolError::ProtocolViolation(format!(
                    "cell ({}, {}) was already shot",
                    row, col
                )));
            }
            Err(e) => return Err(ProtocolError::ProtocolViolation(e.to_string())),
        };
        let win = self.our_board.is_game_lost();
        self.conn
            .send(&Packet::MoveResult(MoveResult { outcome, win }))
            .await?;
        log::debug!("[{}] took shot ({}, {}): {:?}", self.role(), row, col, outcome);
        self.player.handle_opponent_shot((row, col), &outcome);

        Ok(win.then_some(GameOutcome::Defeat))
    }

    /// The server announces the winner; the client checks it agrees.
    async fn acknowledge_end(&mut self, outcome: GameOutcome) -> Result<(), ProtocolError> {
        let winner = match outcome {
            GameOutcome::Victory => self.role(),
            GameOutcome::Defeat => self.role().opponent(),
        };
        match self.role() {
            PeerRole::Server => self.conn.send(&Packet::EndGame { winner }).await?,
            PeerRole::Client => {
                let announced = match self.next_packet().await? {
                    Packet::EndGame { winner } => winner,
                    other => {
                        return Err(ProtocolError::unexpected(
                            PacketType::EndGame,
                            other.packet_type(),
                        ))
                    }
                };
                if announced != winner {
                    return Err(ProtocolError::ProtocolViolation(format!(
                        "peer announced {} as winner, expected {}",
                        announced, winner
                    )));
                }
            }
        }
        Ok(())
    }

    fn report(&self, outcome: GameOutcome) -> GameReport {
        GameReport {
            role: self.role(),
            outcome,
            first: self.first,
            shots_fired: self.their_board.shots_fired(),
            shots_received: self.our_board.shots_received(),
            ships_remaining: self.our_board.ships_remaining(),
        }
    }
}
