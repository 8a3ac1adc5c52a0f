#![cfg(feature = "std")]

use std::collections::VecDeque;

use broadside::transport::in_memory;
use broadside::{
    AiPlayer, BoardError, Connection, GameOutcome, GameSession, MoveResult, Orientation,
    OurBoard, Packet, PeerRole, Phase, PlacedShip, Player, ProtocolError, SessionConfig, ShipKind,
    ShotOutcome, TheirBoard,
};
use rand::{rngs::SmallRng, SeedableRng};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;

/// Player with a fixed fleet and a fixed list of targets.
struct Scripted {
    fleet: Vec<(ShipKind, usize, usize, Orientation)>,
    targets: VecDeque<(usize, usize)>,
}

impl Scripted {
    fn new(targets: &[(usize, usize)]) -> Self {
        // Destroyer at (0,0)-(0,1); every other ship on an even row below it.
        Self::with_fleet(
            vec![
                (ShipKind::Destroyer, 0, 0, Orientation::Horizontal),
                (ShipKind::Carrier, 2, 0, Orientation::Horizontal),
                (ShipKind::Battleship, 4, 0, Orientation::Horizontal),
                (ShipKind::Cruiser, 6, 0, Orientation::Horizontal),
                (ShipKind::Submarine, 8, 0, Orientation::Horizontal),
            ],
            targets,
        )
    }

    fn with_fleet(fleet: Vec<(ShipKind, usize, usize, Orientation)>, targets: &[(usize, usize)]) -> Self {
        Self {
            fleet,
            targets: targets.iter().copied().collect(),
        }
    }
}

impl Player for Scripted {
    fn place_ships(&mut self, _rng: &mut SmallRng, board: &mut OurBoard) -> Result<(), BoardError> {
        for &(kind, r, c, o) in &self.fleet {
            board.place(kind, r, c, o)?;
        }
        Ok(())
    }

    fn select_target(&mut self, _rng: &mut SmallRng, _view: &TheirBoard) -> Option<(usize, usize)> {
        self.targets.pop_front()
    }
}

fn client_session(
    conn: Connection<DuplexStream>,
    targets: &[(usize, usize)],
) -> GameSession<DuplexStream, Scripted> {
    GameSession::new(conn, Scripted::new(targets), SmallRng::seed_from_u64(1))
}

/// Play the server side by hand up to and including `BeginGame`.
async fn serve_until_begin(conn: &mut Connection<DuplexStream>, first: PeerRole) {
    assert_eq!(conn.receive().await.unwrap(), Packet::ClientHello);
    conn.send(&Packet::ServerHello).await.unwrap();
    conn.send(&Packet::ServerReady).await.unwrap();
    conn.send(&Packet::ShipsReady).await.unwrap();
    assert_eq!(conn.receive().await.unwrap(), Packet::ShipsReady);
    conn.send(&Packet::BeginGame { first }).await.unwrap();
}

fn plain(outcome: ShotOutcome) -> Packet {
    Packet::MoveResult(MoveResult {
        outcome,
        win: false,
    })
}

async fn expect_disconnect(conn: &mut Connection<DuplexStream>) -> String {
    match conn.receive().await.unwrap() {
        Packet::Disconnect { reason } => reason,
        other => panic!("expected disconnect, got {:?}", other),
    }
}

/// Play the client side by hand up to and including `BeginGame`.
async fn join_as_client(conn: &mut Connection<DuplexStream>) -> PeerRole {
    conn.send(&Packet::ClientHello).await.unwrap();
    assert_eq!(conn.receive().await.unwrap(), Packet::ServerHello);
    assert_eq!(conn.receive().await.unwrap(), Packet::ServerReady);
    conn.send(&Packet::ShipsReady).await.unwrap();
    assert_eq!(conn.receive().await.unwrap(), Packet::ShipsReady);
    match conn.receive().await.unwrap() {
        Packet::BeginGame { first } => first,
        other => panic!("expected begin game, got {:?}", other),
    }
}

fn sunk(kind: ShipKind, row: usize, col: usize) -> PlacedShip {
    let mut ship = PlacedShip::new(kind, row, col, Orientation::Horizontal);
    ship.remaining = 0;
    ship
}

/// One shot per enemy ship, each reported as sinking a ship lying at column 5.
const VOLLEY: [(ShipKind, usize); 5] = [
    (ShipKind::Carrier, 1),
    (ShipKind::Battleship, 3),
    (ShipKind::Cruiser, 5),
    (ShipKind::Submarine, 7),
    (ShipKind::Destroyer, 9),
];

/// Open water on the `Scripted` fleet's board.
const WATER: [(u8, u8); 5] = [(1, 9), (3, 9), (5, 9), (7, 9), (9, 9)];

fn volley_targets() -> Vec<(usize, usize)> {
    VOLLEY.iter().map(|&(_, row)| (row, 5)).collect()
}

/// Answer the session's shots at `VOLLEY` with a sink each, the last one
/// winning, while firing at open water on our own turns.
async fn lose_to_volley(conn: &mut Connection<DuplexStream>, attacker: PeerRole, first: PeerRole) {
    let mut turn = first;
    let mut sunk_count = 0;
    let mut water_shots = 0;
    while sunk_count < VOLLEY.len() {
        if turn == attacker {
            let (kind, row) = VOLLEY[sunk_count];
            assert_eq!(
                conn.receive().await.unwrap(),
                Packet::Move {
                    row: row as u8,
                    col: 5
                }
            );
            sunk_count += 1;
            let result = MoveResult {
                outcome: ShotOutcome::Sink(sunk(kind, row, 5)),
                win: sunk_count == VOLLEY.len(),
            };
            conn.send(&Packet::MoveResult(result)).await.unwrap();
        } else {
            let (row, col) = WATER[water_shots];
            water_shots += 1;
            conn.send(&Packet::Move { row, col }).await.unwrap();
            assert_eq!(conn.receive().await.unwrap(), plain(ShotOutcome::Miss));
        }
        turn = turn.opponent();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scripted_exchange() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[(3, 4), (5, 5), (7, 7)]);

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Client).await;

        // Client fires first and misses.
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 3, col: 4 });
        server.send(&plain(ShotOutcome::Miss)).await.unwrap();

        server.send(&Packet::Move { row: 0, col: 0 }).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), plain(ShotOutcome::Hit));

        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 5, col: 5 });
        server.send(&plain(ShotOutcome::Miss)).await.unwrap();

        server.send(&Packet::Move { row: 0, col: 1 }).await.unwrap();
        let mut destroyer = PlacedShip::new(ShipKind::Destroyer, 0, 0, Orientation::Horizontal);
        destroyer.remaining = 0;
        assert_eq!(
            server.receive().await.unwrap(),
            plain(ShotOutcome::Sink(destroyer))
        );

        let bye = Packet::Disconnect {
            reason: "bye".to_string(),
        };
        server.send(&bye).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 7, col: 7 });
    };

    let (result, ()) = tokio::join!(session.run(), peer);
    assert_eq!(
        result,
        Err(ProtocolError::PeerDisconnected {
            reason: "bye".to_string()
        })
    );
    assert_eq!(session.phase(), Phase::Disconnected);
    assert_eq!(session.our_board().ships_remaining(), 4);
    assert_eq!(session.our_board().shots_received(), 2);
    assert_eq!(session.their_board().shots_fired(), 2);
    // The peer already left, so nothing is sent back.
    assert!(!session.connection().is_disconnected());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_move_gets_disconnect() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[]);

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Server).await;
        let mut raw = server.into_inner();
        raw.write_all(&[5, 0, 3, 1, 2, 3]).await.unwrap();
        let mut server = Connection::new(PeerRole::Server, raw);
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    let err = result.unwrap_err();
    assert!(matches!(err, ProtocolError::WrongBodyLength { expected: 2, actual: 3, .. }));
    assert_eq!(reason, err.to_string());
    assert!(reason.contains("move"));
    assert!(session.connection().is_disconnected());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_shot_is_a_violation() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[(9, 9)]);

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Server).await;
        server.send(&Packet::Move { row: 3, col: 3 }).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), plain(ShotOutcome::Miss));
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 9, col: 9 });
        server.send(&plain(ShotOutcome::Miss)).await.unwrap();
        server.send(&Packet::Move { row: 3, col: 3 }).await.unwrap();
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert!(matches!(result, Err(ProtocolError::ProtocolViolation(_))));
    assert!(reason.contains("already shot"), "reason was {:?}", reason);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unexpected_packet_during_handshake() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[]);

    let peer = async {
        assert_eq!(server.receive().await.unwrap(), Packet::ClientHello);
        server.send(&Packet::ServerReady).await.unwrap();
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert_eq!(
        result,
        Err(ProtocolError::ProtocolViolation(
            "expected server hello, got server ready".to_string()
        ))
    );
    assert!(reason.contains("expected server hello"));
    assert_eq!(session.phase(), Phase::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sink_report_must_cover_shot() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[(3, 4)]);

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Client).await;
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 3, col: 4 });
        let mut elsewhere = PlacedShip::new(ShipKind::Destroyer, 0, 0, Orientation::Horizontal);
        elsewhere.remaining = 0;
        server.send(&plain(ShotOutcome::Sink(elsewhere))).await.unwrap();
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert!(matches!(result, Err(ProtocolError::ProtocolViolation(_))));
    assert!(reason.contains("does not cover"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_silent_peer_times_out() {
    let (mut server, client) = in_memory::pair();
    let config = SessionConfig {
        read_timeout: Some(Duration::from_millis(100)),
    };
    let mut session = GameSession::with_config(
        client,
        Scripted::new(&[]),
        SmallRng::seed_from_u64(3),
        config,
    );

    let peer = async {
        assert_eq!(server.receive().await.unwrap(), Packet::ClientHello);
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert_eq!(result, Err(ProtocolError::Timeout(Duration::from_millis(100))));
    assert!(reason.contains("no packet received"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_player_quitting_notifies_peer() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[]);

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Client).await;
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert!(matches!(result, Err(ProtocolError::Aborted(_))));
    assert!(reason.contains("player quit"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_session_against_scripted_client() {
    let (server, mut client) = in_memory::pair();
    let mut session = GameSession::new(
        server,
        Scripted::new(&volley_targets()),
        SmallRng::seed_from_u64(7),
    );

    let peer = async {
        let first = join_as_client(&mut client).await;
        lose_to_volley(&mut client, PeerRole::Server, first).await;
        assert_eq!(
            client.receive().await.unwrap(),
            Packet::EndGame {
                winner: PeerRole::Server
            }
        );
        first
    };

    let (result, first) = tokio::join!(session.run(), peer);
    let report = result.unwrap();
    assert_eq!(report.role, PeerRole::Server);
    assert_eq!(report.outcome, GameOutcome::Victory);
    assert_eq!(report.first, first);
    assert_eq!(report.shots_fired, 5);
    assert_eq!(report.ships_remaining, 5);
    let expected_received = if first == PeerRole::Server { 4 } else { 5 };
    assert_eq!(report.shots_received, expected_received);
    assert_eq!(session.their_board().ships_sunk(), 5);
    assert_eq!(session.phase(), Phase::GameOver);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_coin_flip_reaches_both_roles() {
    let mut firsts = Vec::new();
    for seed in 0..16u64 {
        let (server, mut client) = in_memory::pair();
        let mut session = GameSession::new(server, AiPlayer::new(), SmallRng::seed_from_u64(seed));

        let peer = async {
            let first = join_as_client(&mut client).await;
            let done = Packet::Disconnect {
                reason: "done".to_string(),
            };
            client.send(&done).await.unwrap();
            first
        };

        let (result, first) = tokio::join!(session.run(), peer);
        assert_eq!(
            result,
            Err(ProtocolError::PeerDisconnected {
                reason: "done".to_string()
            })
        );
        firsts.push(first);
    }
    assert!(firsts.contains(&PeerRole::Server));
    assert!(firsts.contains(&PeerRole::Client));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_accepts_matching_end_game() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &volley_targets());

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Server).await;
        lose_to_volley(&mut server, PeerRole::Client, PeerRole::Server).await;
        server
            .send(&Packet::EndGame {
                winner: PeerRole::Client,
            })
            .await
            .unwrap();
    };

    let (result, ()) = tokio::join!(session.run(), peer);
    let report = result.unwrap();
    assert_eq!(report.outcome, GameOutcome::Victory);
    assert_eq!(report.first, PeerRole::Server);
    assert_eq!(report.shots_fired, 5);
    assert_eq!(report.shots_received, 5);
    assert_eq!(session.phase(), Phase::GameOver);
    assert!(!session.connection().is_disconnected());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_end_game_winner_mismatch() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &volley_targets());

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Client).await;
        lose_to_volley(&mut server, PeerRole::Client, PeerRole::Client).await;
        server
            .send(&Packet::EndGame {
                winner: PeerRole::Server,
            })
            .await
            .unwrap();
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert_eq!(
        result,
        Err(ProtocolError::ProtocolViolation(
            "peer announced server as winner, expected client".to_string()
        ))
    );
    assert!(reason.contains("peer announced server as winner"));
    assert_eq!(session.phase(), Phase::Disconnected);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_win_flag_must_match_ships_sunk() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &volley_targets());

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Client).await;
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 1, col: 5 });
        let early_win = MoveResult {
            outcome: ShotOutcome::Sink(sunk(ShipKind::Carrier, 1, 5)),
            win: true,
        };
        server.send(&Packet::MoveResult(early_win)).await.unwrap();
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert!(matches!(result, Err(ProtocolError::ProtocolViolation(_))));
    assert!(reason.contains("win flag true with 1 ships sunk"), "reason was {:?}", reason);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ship_cannot_sink_twice() {
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[(1, 5), (1, 6)]);

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Client).await;
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 1, col: 5 });
        server
            .send(&plain(ShotOutcome::Sink(sunk(ShipKind::Carrier, 1, 5))))
            .await
            .unwrap();
        server.send(&Packet::Move { row: 1, col: 9 }).await.unwrap();
        assert_eq!(server.receive().await.unwrap(), plain(ShotOutcome::Miss));
        assert_eq!(server.receive().await.unwrap(), Packet::Move { row: 1, col: 6 });
        server
            .send(&plain(ShotOutcome::Sink(sunk(ShipKind::Carrier, 1, 5))))
            .await
            .unwrap();
        expect_disconnect(&mut server).await
    };

    let (result, reason) = tokio::join!(session.run(), peer);
    assert!(matches!(result, Err(ProtocolError::ProtocolViolation(_))));
    assert!(reason.contains("reported sunk twice"), "reason was {:?}", reason);
    assert_eq!(session.their_board().ships_sunk(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_incomplete_fleet_is_finished_at_random() {
    let (mut server, client) = in_memory::pair();
    // The cruiser overlaps the destroyer, so placement stops after one ship.
    let fleet = vec![
        (ShipKind::Destroyer, 0, 0, Orientation::Horizontal),
        (ShipKind::Cruiser, 0, 1, Orientation::Vertical),
    ];
    let mut session = GameSession::new(
        client,
        Scripted::with_fleet(fleet, &[]),
        SmallRng::seed_from_u64(11),
    );

    let peer = async {
        serve_until_begin(&mut server, PeerRole::Server).await;
        let done = Packet::Disconnect {
            reason: "done".to_string(),
        };
        server.send(&done).await.unwrap();
    };

    let (result, ()) = tokio::join!(session.run(), peer);
    assert!(matches!(result, Err(ProtocolError::PeerDisconnected { .. })));
    let board = session.our_board();
    assert!(board.is_fleet_complete());
    assert_eq!(board.ships().count(), 5);
    let destroyer = board.ship(ShipKind::Destroyer).unwrap();
    assert_eq!((destroyer.row, destroyer.col), (0, 0));
    assert_eq!(destroyer.orientation, Orientation::Horizontal);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_during_handshake() {
    // Client waiting for the server hello.
    let (mut server, client) = in_memory::pair();
    let mut session = client_session(client, &[]);
    let peer = async {
        assert_eq!(server.receive().await.unwrap(), Packet::ClientHello);
        let full = Packet::Disconnect {
            reason: "server is full".to_string(),
        };
        server.send(&full).await.unwrap();
    };
    let (result, ()) = tokio::join!(session.run(), peer);
    assert_eq!(
        result,
        Err(ProtocolError::PeerDisconnected {
            reason: "server is full".to_string()
        })
    );
    assert_eq!(session.phase(), Phase::Disconnected);
    assert!(!session.connection().is_disconnected());

    // Server waiting for the client hello.
    let (server, mut client) = in_memory::pair();
    let mut session = GameSession::new(server, Scripted::new(&[]), SmallRng::seed_from_u64(5));
    let leave = Packet::Disconnect {
        reason: "changed my mind".to_string(),
    };
    client.send(&leave).await.unwrap();
    assert_eq!(
        session.run().await,
        Err(ProtocolError::PeerDisconnected {
            reason: "changed my mind".to_string()
        })
    );
    assert!(!session.connection().is_disconnected());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ai_vs_ai_in_memory() {
    for seed in 0..4u64 {
        let (server, client) = in_memory::pair();
        let mut s1 = GameSession::new(server, AiPlayer::new(), SmallRng::seed_from_u64(seed));
        let mut s2 = GameSession::new(
            client,
            AiPlayer::new(),
            SmallRng::seed_from_u64(seed + 100),
        );

        let (r1, r2) = tokio::join!(s1.run(), s2.run());
        let (r1, r2) = (r1.unwrap(), r2.unwrap());

        assert_eq!(r1.role, PeerRole::Server);
        assert_eq!(r2.role, PeerRole::Client);
        assert_ne!(r1.outcome, r2.outcome);
        assert_eq!(r1.first, r2.first);
        assert_eq!(r1.shots_fired, r2.shots_received);
        assert_eq!(r2.shots_fired, r1.shots_received);

        let (winner, loser) = if r1.outcome == GameOutcome::Victory {
            (&r1, &r2)
        } else {
            (&r2, &r1)
        };
        assert_eq!(loser.ships_remaining, 0);
        assert!(winner.ships_remaining > 0);
        assert!(winner.shots_fired >= 17);
        assert_eq!(s1.phase(), Phase::GameOver);
        assert_eq!(s2.phase(), Phase::GameOver);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_seeded_games_are_reproducible() {
    async fn play(seed: u64) -> (broadside::GameReport, broadside::GameReport) {
        let (server, client) = in_memory::pair();
        let mut s1 = GameSession::new(server, AiPlayer::new(), SmallRng::seed_from_u64(seed));
        let mut s2 = GameSession::new(client, AiPlayer::new(), SmallRng::seed_from_u64(!seed));
        let (r1, r2) = tokio::join!(s1.run(), s2.run());
        (r1.unwrap(), r2.unwrap())
    }

    assert_eq!(play(42).await, play(42).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ai_vs_ai_tcp_game() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    // Server Task
    let server_future = tokio::spawn(async move {
        let (conn, _) = Connection::<TcpStream>::accept(&listener).await.unwrap();
        let mut session = GameSession::new(conn, AiPlayer::new(), SmallRng::from_seed([0; 32]));
        session.run().await.unwrap()
    });

    // Client Task
    let client_future = tokio::spawn(async move {
        let conn = Connection::<TcpStream>::connect(addr).await.unwrap();
        let mut session = GameSession::new(conn, AiPlayer::new(), SmallRng::from_seed([1; 32]));
        session.run().await.unwrap()
    });

    let (server_report, client_report) = tokio::try_join!(server_future, client_future)?;

    // One must win, one must lose.
    assert!(
        (server_report.outcome == GameOutcome::Victory
            && client_report.outcome == GameOutcome::Defeat)
            || (server_report.outcome == GameOutcome::Defeat
                && client_report.outcome == GameOutcome::Victory)
    );

    Ok(())
}
