//! In-memory UCI engine for driving the scheduler without a real binary.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use game_reporter::{AnalysisError, EngineConfig, EngineLauncher, UciEngine};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Position};
use tokio::io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

pub const ENGINE_SOURCE: &str = "fake-engine";

/// How the fake engine answers `go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Report every depth for every requested line, then `bestmove`
    Normal,
    /// Report depth 1 and never finish
    Hang,
    /// Answer with an `error` line
    ErrorOnGo,
}

/// Launches fake engines and tracks how many are alive.
#[derive(Clone)]
pub struct FakeLauncher {
    pub behaviour: Behaviour,
    pub live: Arc<AtomicUsize>,
    pub launched: Arc<AtomicUsize>,
    pub commands: Arc<std::sync::Mutex<Vec<String>>>,
}

impl FakeLauncher {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            live: Arc::new(AtomicUsize::new(0)),
            launched: Arc::new(AtomicUsize::new(0)),
            commands: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn launched_count(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    /// Poll until every fake engine has exited. Panics after a second.
    pub async fn wait_until_idle(&self) {
        for _ in 0..100 {
            if self.live_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} fake engines still running", self.live_count());
    }

    pub fn received(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl EngineLauncher for FakeLauncher {
    fn launch(&self) -> BoxFuture<'_, Result<UciEngine, AnalysisError>> {
        Box::pin(async move {
            let (client, server) = duplex(64 * 1024);
            let (reader, writer) = split(client);

            // Count before returning so teardown checks never race the spawn
            self.live.fetch_add(1, Ordering::SeqCst);
            self.launched.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(fake_engine(
                server,
                self.behaviour,
                LiveGuard(Arc::clone(&self.live)),
                Arc::clone(&self.commands),
            ));

            Ok(UciEngine::from_streams(reader, writer, ENGINE_SOURCE))
        })
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn fake_engine(
    server: DuplexStream,
    behaviour: Behaviour,
    _guard: LiveGuard,
    commands: Arc<std::sync::Mutex<Vec<String>>>,
) {
    let (reader, mut writer) = split(server);
    let mut lines = BufReader::new(reader).lines();
    let mut position = Chess::default();
    let mut multipv = 1;

    while let Ok(Some(line)) = lines.next_line().await {
        commands.lock().unwrap().push(line.clone());

        let reply = if line == "uci" {
            "id name fake\nuciok\n".to_string()
        } else if line == "isready" {
            "readyok\n".to_string()
        } else if line == "quit" {
            break;
        } else if let Some(value) = line.strip_prefix("setoption name MultiPV value ") {
            multipv = value.parse().unwrap();
            String::new()
        } else if let Some(rest) = line.strip_prefix("position fen ") {
            position = replay(rest);
            String::new()
        } else if let Some(rest) = line.strip_prefix("go depth ") {
            let depth: u32 = rest.split_whitespace().next().unwrap().parse().unwrap();
            match behaviour {
                Behaviour::Normal => search_output(&position, depth, multipv),
                Behaviour::Hang => search_output(&position, 1, 1)
                    .lines()
                    .filter(|l| l.starts_with("info"))
                    .map(|l| format!("{l}\n"))
                    .collect(),
                Behaviour::ErrorOnGo => "error fake engine failure\n".to_string(),
            }
        } else {
            String::new()
        };

        if writer.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// `<fen> [moves ...]` → position
fn replay(command: &str) -> Chess {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    let fen = tokens[..6].join(" ");
    let mut pos: Chess = fen
        .parse::<Fen>()
        .unwrap()
        .into_position(CastlingMode::Standard)
        .unwrap();
    if tokens.get(6) == Some(&"moves") {
        for uci in &tokens[7..] {
            let mv = uci.parse::<UciMove>().unwrap().to_move(&pos).unwrap();
            pos.play_unchecked(mv);
        }
    }
    pos
}

/// Rank k plays the k-th legal move and scores 10 for rank 1, then drops
/// 15 centipawns per rank.
fn search_output(position: &Chess, depth: u32, multipv: u32) -> String {
    let legal = position.legal_moves();
    if legal.is_empty() {
        let score = if position.is_checkmate() { "mate 0" } else { "cp 0" };
        return format!("info depth 0 score {score}\nbestmove (none)\n");
    }

    let mut out = String::new();
    for d in 1..=depth {
        for (k, mv) in legal.iter().take(multipv as usize).enumerate() {
            let cp = 10 - 15 * k as i32;
            let uci = mv.to_uci(CastlingMode::Standard);
            out.push_str(&format!(
                "info depth {d} seldepth {d} multipv {} score cp {cp} nodes 1000 pv {uci}\n",
                k + 1
            ));
        }
    }
    let best = legal[0].to_uci(CastlingMode::Standard);
    out.push_str(&format!("bestmove {best}\n"));
    out
}

pub fn engine_config(max_engine_count: usize, depth: u32) -> EngineConfig {
    EngineConfig {
        version: ENGINE_SOURCE.to_string(),
        max_engine_count,
        depth,
        ..EngineConfig::default()
    }
}
