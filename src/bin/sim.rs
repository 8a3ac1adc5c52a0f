use broadside::{in_memory, AiPlayer, GameOutcome, GameSession};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let (server, client) = in_memory::pair();
    let mut s1 = GameSession::new(server, AiPlayer::new(), SmallRng::seed_from_u64(seed1));
    let mut s2 = GameSession::new(client, AiPlayer::new(), SmallRng::seed_from_u64(seed2));

    let (r1, r2) = tokio::join!(s1.run(), s2.run());
    let (r1, r2) = (r1?, r2?);

    let winner = match (r1.outcome, r2.outcome) {
        (GameOutcome::Victory, GameOutcome::Defeat) => Some("player1"),
        (GameOutcome::Defeat, GameOutcome::Victory) => Some("player2"),
        _ => None,
    };

    let result = json!({
        "player1": r1,
        "player2": r2,
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
