#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use broadside::{
    in_memory, init_logging, AiPlayer, CliPlayer, Connection, GameOutcome, GameReport,
    GameSession, Player, ProtocolError, SessionConfig, Stream,
};

#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use std::process::ExitCode;
#[cfg(feature = "std")]
use tokio::net::{TcpListener, TcpStream};
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum PlayerType {
    Human,
    Ai,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Watch two AIs play each other on the local machine.
    Local {
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Host a networked game and wait for a peer to connect.
    Host {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, value_enum, default_value_t = PlayerType::Human)]
        player: PlayerType,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, help = "Give up if the peer is silent this many seconds")]
        timeout_secs: Option<u64>,
    },
    /// Join a networked game hosted by a peer.
    Join {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[arg(long, value_enum, default_value_t = PlayerType::Human)]
        player: PlayerType,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, help = "Give up if the peer is silent this many seconds")]
        timeout_secs: Option<u64>,
    },
}

#[cfg(feature = "std")]
fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => {
            println!("Using fixed seed: {} (game will be reproducible)", s);
            SmallRng::seed_from_u64(s)
        }
        None => {
            let mut seed_rng = rand::rng();
            SmallRng::from_rng(&mut seed_rng)
        }
    }
}

#[cfg(feature = "std")]
fn make_player(kind: PlayerType) -> Box<dyn Player> {
    match kind {
        PlayerType::Human => Box::new(CliPlayer::new()),
        PlayerType::Ai => {
            println!("AI player selected.");
            Box::new(AiPlayer::new())
        }
    }
}

#[cfg(feature = "std")]
fn session_config(timeout_secs: Option<u64>) -> SessionConfig {
    SessionConfig {
        read_timeout: timeout_secs.map(Duration::from_secs),
    }
}

/// Play one side. Returns `true` only for a clean, acknowledged end.
#[cfg(feature = "std")]
async fn play<S: Stream>(
    conn: Connection<S>,
    player: Box<dyn Player>,
    rng: SmallRng,
    config: SessionConfig,
) -> bool {
    let mut session = GameSession::with_config(conn, player, rng, config);
    match session.run().await {
        Ok(report) => {
            print_report(&report);
            true
        }
        Err(ProtocolError::PeerDisconnected { reason }) => {
            eprintln!("Opponent left the game: {}", reason);
            false
        }
        Err(e) => {
            eprintln!("Game ended with an error: {}", e);
            false
        }
    }
}

#[cfg(feature = "std")]
fn print_report(report: &GameReport) {
    let verdict = match report.outcome {
        GameOutcome::Victory => "won",
        GameOutcome::Defeat => "lost",
    };
    println!(
        "The {} {} after firing {} shots and taking {} ({} ships left afloat).",
        report.role, verdict, report.shots_fired, report.shots_received, report.ships_remaining
    );
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let clean = match cli.command {
        Commands::Local { seed } => {
            println!("Starting local AI vs AI game...");
            let mut rng = make_rng(seed);
            let server_rng = SmallRng::from_rng(&mut rng);
            let client_rng = SmallRng::from_rng(&mut rng);

            let (server, client) = in_memory::pair();
            let config = SessionConfig::default();
            let (a, b) = tokio::join!(
                play(server, Box::new(AiPlayer::new()), server_rng, config),
                play(client, Box::new(AiPlayer::new()), client_rng, config),
            );
            a && b
        }
        Commands::Host {
            bind,
            player,
            seed,
            timeout_secs,
        } => {
            println!("Hosting game at {}...", bind);
            let rng = make_rng(seed);
            let listener = TcpListener::bind(&bind).await?;
            println!("Waiting for a player to connect...");
            let (conn, addr) = Connection::<TcpStream>::accept(&listener).await?;
            println!("Player connected from {}", addr);
            play(conn, make_player(player), rng, session_config(timeout_secs)).await
        }
        Commands::Join {
            connect,
            player,
            seed,
            timeout_secs,
        } => {
            println!("Connecting to {}...", connect);
            let rng = make_rng(seed);
            let conn = Connection::<TcpStream>::connect(&connect).await?;
            println!("Connected successfully!");
            play(conn, make_player(player), rng, session_config(timeout_secs)).await
        }
    };
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
