//! UCI engine session over async I/O.
//!
//! A session owns one engine: a child process in production, or any pair of
//! async streams (tests drive an in-memory engine). Scores are normalized to
//! White's point of view and PV moves are converted to SAN before lines leave
//! this module.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use chess_core::{EngineLine, LineMove};
use futures::future::BoxFuture;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Position};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::uci;

type EngineReader = BufReader<Box<dyn AsyncRead + Unpin + Send>>;
type EngineWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Creates engine sessions for the scheduler.
pub trait EngineLauncher: Send + Sync + 'static {
    fn launch(&self) -> BoxFuture<'_, Result<UciEngine, AnalysisError>>;
}

/// Launches engine binaries as child processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    path: String,
    source: String,
}

impl ProcessLauncher {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl EngineLauncher for ProcessLauncher {
    fn launch(&self) -> BoxFuture<'_, Result<UciEngine, AnalysisError>> {
        Box::pin(async move {
            let engine = UciEngine::spawn(&self.path, self.source.clone())?;
            info!(path = %self.path, "Engine process started");
            Ok(engine)
        })
    }
}

pub struct UciEngine {
    process: Option<Child>,
    stdin: EngineWriter,
    stdout: EngineReader,
    /// Label stamped on every line this session reports
    source: String,
    position: Chess,
    searching: bool,
}

impl UciEngine {
    /// Spawn an engine process. The UCI handshake happens in [`initialize`].
    ///
    /// [`initialize`]: UciEngine::initialize
    pub fn spawn(path: &str, source: impl Into<String>) -> Result<Self, AnalysisError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AnalysisError::EngineProtocol(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnalysisError::EngineProtocol("engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::EngineProtocol("engine stdout unavailable".into()))?;

        let mut engine = Self::from_streams(stdout, stdin, source);
        engine.process = Some(process);
        Ok(engine)
    }

    pub fn from_streams<R, W>(reader: R, writer: W, source: impl Into<String>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(reader);
        Self {
            process: None,
            stdin: Box::new(writer),
            stdout: BufReader::new(reader),
            source: source.into(),
            position: Chess::default(),
            searching: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// UCI handshake and analysis options.
    pub async fn initialize(&mut self, config: &EngineConfig, lines: u32) -> Result<(), AnalysisError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send(&uci::set_option("Threads", config.threads)).await?;
        self.send(&uci::set_option("Hash", config.hash_mb)).await?;
        self.send(&uci::set_option("MultiPV", lines)).await?;
        self.send(&uci::set_option("UCI_AnalyseMode", true)).await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), AnalysisError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnalysisError::EngineProtocol(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnalysisError::EngineProtocol(format!("Failed to flush engine input: {e}")))?;
        Ok(())
    }

    /// Next non-empty line. End of stream and `error` lines are protocol
    /// errors.
    async fn next_line(&mut self) -> Result<String, AnalysisError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| AnalysisError::EngineProtocol(format!("Failed to read from engine: {e}")))?;
            if read == 0 {
                return Err(AnalysisError::EngineProtocol("engine closed its output".into()));
            }

            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with("error") {
                return Err(AnalysisError::EngineProtocol(trimmed.to_string()));
            }
            return Ok(trimmed.to_string());
        }
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalysisError> {
        while self.next_line().await? != expected {}
        Ok(())
    }

    /// Set the position to search: the game's initial FEN replayed through
    /// `moves`. `position` is the resulting position, used to normalize
    /// scores and render the PV.
    pub async fn set_position(
        &mut self,
        initial_fen: &str,
        moves: &[String],
        position: Chess,
    ) -> Result<(), AnalysisError> {
        self.send(&uci::position_command(initial_fen, moves)).await?;
        self.position = position;
        Ok(())
    }

    /// Search the current position until `bestmove`. `on_depth` is called with
    /// the depth of every progress line; a position without legal moves
    /// reports depth 0. Returns the final line for each MultiPV rank.
    pub async fn evaluate<F>(
        &mut self,
        depth: u32,
        time_limit: Option<Duration>,
        mut on_depth: F,
    ) -> Result<Vec<EngineLine>, AnalysisError>
    where
        F: FnMut(u32),
    {
        self.send(&uci::go_command(depth, time_limit)).await?;
        self.searching = true;

        let turn = self.position.turn();
        let mut lines: BTreeMap<u32, EngineLine> = BTreeMap::new();

        loop {
            let line = self.next_line().await?;

            if let Some(info) = uci::parse_info(&line) {
                if let Some(score) = info.score {
                    lines.insert(
                        info.multipv,
                        EngineLine {
                            source: self.source.clone(),
                            depth: info.depth,
                            index: info.multipv,
                            evaluation: score.from_side_to_move(turn),
                            moves: san_line(&self.position, &info.pv),
                        },
                    );
                }
                on_depth(info.depth);
            } else if line.starts_with("bestmove") {
                debug!(best = ?uci::parse_bestmove(&line), "Search finished");
                self.searching = false;
                break;
            }
        }

        Ok(lines.into_values().collect())
    }

    /// Stop a running search and drain its output up to `bestmove`.
    pub async fn stop(&mut self) -> Result<(), AnalysisError> {
        if !self.searching {
            return Ok(());
        }
        self.send("stop").await?;
        while !self.next_line().await?.starts_with("bestmove") {}
        self.searching = false;
        Ok(())
    }

    /// Stop any interrupted search, then quit and wait for the process to
    /// exit.
    pub async fn quit(&mut self) {
        if let Err(e) = self.stop().await {
            debug!(error = %e, "Engine did not stop cleanly");
        }
        let _ = self.send("quit").await;
        if let Some(process) = self.process.as_mut() {
            let _ = process.wait().await;
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        if let Some(process) = self.process.as_mut() {
            let _ = process.start_kill();
        }
    }
}

/// Render a UCI PV as SAN, stopping at the first move that does not apply.
fn san_line(position: &Chess, pv: &[String]) -> Vec<LineMove> {
    let mut scratch = position.clone();
    let mut moves = Vec::with_capacity(pv.len());

    for uci in pv {
        let Some(mv) = uci
            .parse::<UciMove>()
            .ok()
            .and_then(|parsed| parsed.to_move(&scratch).ok())
        else {
            break;
        };
        let san = SanPlus::from_move_and_play_unchecked(&mut scratch, mv);
        moves.push(LineMove {
            uci: uci.clone(),
            san: san.to_string(),
        });
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Evaluation;
    use tokio::io::{duplex, split, AsyncBufReadExt, DuplexStream};

    /// Answer each command with a canned reply until the client hangs up.
    fn scripted_engine(server: DuplexStream, search_output: &'static str) -> tokio::task::JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let (reader, mut writer) = split(server);
            let mut lines = BufReader::new(reader).lines();
            let mut received = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                let reply = match line.as_str() {
                    "uci" => "id name scripted\nuciok\n",
                    "isready" => "readyok\n",
                    "stop" => "bestmove e7e5\n",
                    cmd if cmd.starts_with("go") => search_output,
                    _ => "",
                };
                received.push(line);
                if writer.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
            received
        })
    }

    fn connect(search_output: &'static str) -> (UciEngine, tokio::task::JoinHandle<Vec<String>>) {
        let (client, server) = duplex(4096);
        let (reader, writer) = split(client);
        (
            UciEngine::from_streams(reader, writer, "test-engine"),
            scripted_engine(server, search_output),
        )
    }

    fn after_e4() -> Chess {
        let mut pos = Chess::default();
        let mv = "e2e4".parse::<UciMove>().unwrap().to_move(&pos).unwrap();
        pos.play_unchecked(mv);
        pos
    }

    #[tokio::test]
    async fn test_evaluate_normalizes_for_black() {
        let (mut engine, script) = connect(
            "info depth 1 multipv 1 score cp 20 pv e7e5\n\
             info depth 12 currmove e7e5 currmovenumber 1\n\
             info depth 2 multipv 1 score cp 50 pv e7e5 g1f3\n\
             info depth 2 multipv 2 score mate 3 pv d7d5\n\
             bestmove e7e5\n",
        );
        engine.initialize(&EngineConfig::default(), 2).await.unwrap();
        engine
            .set_position(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                &["e2e4".to_string()],
                after_e4(),
            )
            .await
            .unwrap();

        let mut depths = Vec::new();
        let lines = engine.evaluate(2, None, |depth| depths.push(depth)).await.unwrap();

        assert_eq!(depths, vec![1, 2, 2]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].index, 1);
        assert_eq!(lines[0].depth, 2);
        assert_eq!(lines[0].source, "test-engine");
        assert_eq!(lines[0].evaluation, Evaluation::Centipawn(-50));
        assert_eq!(lines[0].moves[0].san, "e5");
        assert_eq!(lines[0].moves[1].san, "Nf3");
        assert_eq!(lines[1].evaluation, Evaluation::Mate(-3));

        engine.quit().await;
        drop(engine);
        let received = script.await.unwrap();
        assert!(received.contains(&"setoption name MultiPV value 2".to_string()));
        assert!(received.contains(&"position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 moves e2e4".to_string()));
        assert!(received.contains(&"go depth 2".to_string()));
        assert_eq!(received.last().map(String::as_str), Some("quit"));
    }

    #[tokio::test]
    async fn test_engine_error_line() {
        let (mut engine, _script) = connect("error position rejected\n");
        engine.initialize(&EngineConfig::default(), 1).await.unwrap();
        let result = engine.evaluate(10, None, |_| {}).await;
        assert!(matches!(result, Err(AnalysisError::EngineProtocol(msg)) if msg.contains("rejected")));
    }

    #[tokio::test]
    async fn test_disconnect_mid_search() {
        let (client, server) = duplex(1024);
        let (reader, writer) = split(client);
        let mut engine = UciEngine::from_streams(reader, writer, "test-engine");
        drop(server);
        let result = engine.evaluate(10, None, |_| {}).await;
        assert!(matches!(result, Err(AnalysisError::EngineProtocol(_))));
    }

    #[tokio::test]
    async fn test_stop_without_search_is_noop() {
        let (mut engine, _script) = connect("bestmove e2e4\n");
        engine.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_quit_stops_interrupted_search() {
        // The search never reaches bestmove on its own
        let (mut engine, script) = connect("info depth 1 multipv 1 score cp 20 pv e7e5\n");
        engine.initialize(&EngineConfig::default(), 1).await.unwrap();
        engine
            .set_position(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                &["e2e4".to_string()],
                after_e4(),
            )
            .await
            .unwrap();

        let search = engine.evaluate(30, None, |_| {});
        assert!(tokio::time::timeout(Duration::from_millis(50), search).await.is_err());

        engine.quit().await;
        drop(engine);
        let received = script.await.unwrap();
        let tail: Vec<&str> = received.iter().rev().take(2).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["stop", "quit"]);
    }

    #[test]
    fn test_san_line_stops_at_bad_move() {
        let moves = san_line(
            &Chess::default(),
            &["e2e4".to_string(), "e7e5".to_string(), "e4e5".to_string()],
        );
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[1].san, "e5");
    }
}
