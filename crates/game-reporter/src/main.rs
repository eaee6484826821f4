//! Game Reporter
//!
//! Evaluates every position of a PGN game with a pool of UCI engines,
//! classifies each move and prints the report as JSON on stdout.

use std::path::PathBuf;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use game_reporter::{
    annotate_tree, EvaluationScheduler, GameReport, OpeningBook, ProcessLauncher, ReporterConfig,
};

/// Parse the PGN path from CLI args
fn parse_pgn_path() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [path] if !path.starts_with('-') => Some(PathBuf::from(path)),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let Some(pgn_path) = parse_pgn_path() else {
        eprintln!("Usage: game-reporter <game.pgn>");
        std::process::exit(2);
    };

    let config = ReporterConfig::load()?;
    info!(
        stockfish_path = %config.stockfish_path,
        depth = config.engine.depth,
        max_engines = config.engine.max_engine_count,
        "Reporter config loaded"
    );

    let pgn = tokio::fs::read_to_string(&pgn_path)
        .await
        .with_context(|| format!("Failed to read {}", pgn_path.display()))?;
    let mut game = chess_core::pgn::parse_pgn(&pgn)?;
    info!(nodes = game.tree.len(), white = %game.metadata.white, black = %game.metadata.black, "Parsed game");

    let book = OpeningBook::load_or_built_in(config.opening_book_path.as_deref());

    let launcher = ProcessLauncher::new(&config.stockfish_path, &config.engine.version);
    let scheduler = EvaluationScheduler::new(launcher, config.engine.clone(), &config.options)
        .with_cached_source(config.cached_line_source.clone());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping engines...");
            on_ctrl_c.cancel();
        }
    });

    let mut logged_decile = 0;
    let evaluation = scheduler
        .run(
            &mut game.tree,
            |progress| {
                let decile = (progress * 10.0).floor() as i32;
                if decile > logged_decile {
                    logged_decile = decile;
                    info!(progress, "Evaluating positions");
                }
            },
            &cancel,
        )
        .await;

    match evaluation {
        Ok(()) => {}
        // Cancelled by the user: nothing to report
        Err(e) if e.is_aborted() => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    annotate_tree(&mut game.tree, &config.options, &book);

    let report = GameReport::from_game(&game);
    info!(
        white_accuracy = ?report.accuracy.white,
        black_accuracy = ?report.accuracy.black,
        "Report ready"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
