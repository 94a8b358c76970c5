use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use board_engine::{candidate_destinations, BoardState, Color, Coordinate, PieceId};
use camelchess::core::{load_settings, SessionSettings};
use camelchess::game::{BoardEvent, GameSession};
use camelchess::networking::{DocumentStore, MemoryStore};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MOVES: &str = "pawn5:5,4 blackPawn4:2,3 pawn5:4,4 blackPawn4:3,3 pawn5:3,3";

#[derive(Parser)]
#[command(name = "camelchess", version, about = "Board sync and move legality for camel chess")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List where a piece could move
    Candidates {
        /// Piece key, e.g. `queen` or `blackHorse2`
        #[arg(long)]
        piece: String,
        /// Put the piece alone on this square (`rank,file`) instead of using
        /// the starting layout
        #[arg(long)]
        at: Option<String>,
    },
    /// Two in-process clients playing moves through a shared room
    Demo {
        /// Room name; falls back to the configured default room
        #[arg(long)]
        room: Option<String>,
        /// Space separated `pieceKey:rank,file` moves
        #[arg(long, default_value = DEFAULT_MOVES)]
        moves: String,
        /// Reject moves by the side that is not next to move
        #[arg(long)]
        enforce_turns: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Candidates { piece, at } => show_candidates(&piece, at.as_deref()),
        Commands::Demo {
            room,
            moves,
            enforce_turns,
        } => {
            let mut settings = load_settings();
            settings.enforce_turns |= enforce_turns;
            let room = room
                .or_else(|| settings.default_room.clone())
                .unwrap_or_else(|| "demo".to_string());
            run_demo(settings, &room, &moves).await
        }
    }
}

fn show_candidates(key: &str, at: Option<&str>) -> anyhow::Result<()> {
    let piece: PieceId = key.parse()?;
    let board = match at {
        Some(square) => BoardState::with_pieces([(piece, parse_square(square)?)])?,
        None => BoardState::initial(),
    };

    println!("{board}");
    let candidates = candidate_destinations(piece, &board);
    if candidates.is_empty() {
        println!("{piece} has no candidate squares");
    }
    for square in candidates {
        let note = match board.piece_at(square) {
            Some(occupant) => format!(" (occupied by {occupant})"),
            None => String::new(),
        };
        println!("{piece} -> {square}{note}");
    }
    Ok(())
}

async fn run_demo(settings: SessionSettings, room: &str, moves: &str) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let mut white = GameSession::new(store.clone(), settings.clone());
    let mut black = GameSession::new(store, settings);
    let mut notices = white.events();

    white.create_room(room).await?;
    black.join_room(room).await?;

    for entry in moves.split_whitespace() {
        let (piece, destination) = parse_move(entry)?;
        let session = match piece.color {
            Color::White => &mut white,
            Color::Black => &mut black,
        };

        if let Err(err) = session.select(piece) {
            warn!("[MOVE] Skipping {}: {}", entry, err);
            continue;
        }
        match session.choose(destination).await {
            Ok(report) => {
                if let Some(err) = report.sync_error {
                    warn!("[MOVE] {} applied locally but not synced: {}", entry, err);
                }
            }
            Err(err) => {
                // drop the selection the rejection left behind
                let _ = session.select(piece);
                warn!("[MOVE] Skipping {}: {}", entry, err);
                continue;
            }
        }

        if !converge(&white, &black).await {
            bail!("boards did not converge after {entry}");
        }
    }

    while let Ok(event) = notices.try_recv() {
        if let BoardEvent::Captured { piece } = event {
            info!("[MOVE] {} left the board", piece);
        }
    }

    println!("white's view:\n{}", white.board());
    println!("black's view:\n{}", black.board());
    println!(
        "material advantage (white): {}",
        white.captured().material_advantage()
    );
    Ok(())
}

async fn converge(a: &GameSession, b: &GameSession) -> bool {
    for _ in 0..200 {
        if a.board() == b.board() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn parse_move(entry: &str) -> anyhow::Result<(PieceId, Coordinate)> {
    let (key, square) = entry
        .split_once(':')
        .ok_or_else(|| anyhow!("move '{entry}' should look like pieceKey:rank,file"))?;
    Ok((key.parse()?, parse_square(square)?))
}

fn parse_square(square: &str) -> anyhow::Result<Coordinate> {
    let (rank, file) = square
        .split_once(',')
        .ok_or_else(|| anyhow!("square '{square}' should look like rank,file"))?;
    let rank = rank.trim().parse().with_context(|| format!("bad rank in '{square}'"))?;
    let file = file.trim().parse().with_context(|| format!("bad file in '{square}'"))?;
    Ok(Coordinate::new(rank, file))
}
