//! Evaluation scheduler: a pool of engine sessions working through every
//! node of a game tree.
//!
//! Sessions race for the next node index through a shared counter, so each
//! node is claimed exactly once. Results and progress flow back to the
//! caller's task over a channel; only that task touches the tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chess_core::{EngineLine, GameTree, NodeId};
use shakmaty::{Chess, Position};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{AnalysisOptions, EngineConfig};
use crate::engine::EngineLauncher;
use crate::error::AnalysisError;

/// One node to evaluate
struct Job {
    id: NodeId,
    /// UCI moves from the initial position
    moves: Vec<String>,
    position: Chess,
}

struct SessionShared {
    jobs: Vec<Job>,
    next: AtomicUsize,
    initial_fen: String,
    engine: EngineConfig,
    line_count: u32,
}

enum SessionEvent {
    Progress { index: usize, fraction: f64 },
    Finished { index: usize, lines: Vec<EngineLine> },
    Failed(AnalysisError),
}

pub struct EvaluationScheduler<L> {
    launcher: Arc<L>,
    engine: EngineConfig,
    line_count: u32,
    cached_source: Option<String>,
}

impl<L: EngineLauncher> EvaluationScheduler<L> {
    pub fn new(launcher: L, engine: EngineConfig, options: &AnalysisOptions) -> Self {
        let line_count = engine.effective_line_count(options);
        Self {
            launcher: Arc::new(launcher),
            engine,
            line_count,
            cached_source: None,
        }
    }

    /// Trust leading nodes that already carry lines from `source`.
    pub fn with_cached_source(mut self, source: Option<String>) -> Self {
        self.cached_source = source;
        self
    }

    /// MultiPV requested from each engine
    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// Evaluate every node of `tree`, replacing this engine's lines on each
    /// node as it completes. `on_progress` receives overall progress in
    /// [0, 1], rounded to three decimals; a complete run ends on 1.0.
    ///
    /// Cancelling `cancel` tears down every session before returning
    /// [`AnalysisError::Aborted`]. Nodes finished before that keep their
    /// new lines.
    pub async fn run<F>(
        &self,
        tree: &mut GameTree,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<(), AnalysisError>
    where
        F: FnMut(f64),
    {
        let order = evaluation_order(tree);
        let trusted = self.trusted_prefix(tree, &order);
        // The last trusted node is evaluated again
        let start = trusted.saturating_sub(1);

        let mut progress = vec![0.0_f64; order.len()];
        progress[..start].fill(1.0);

        let jobs = order[start..]
            .iter()
            .map(|id| {
                Ok(Job {
                    id: *id,
                    moves: tree.path_moves(*id)?,
                    position: tree.node(*id)?.state.position.clone(),
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        let pending = jobs.len();
        let session_count = self.engine.max_engine_count.min(pending + 1).max(1);
        info!(
            nodes = order.len(),
            trusted,
            pending,
            sessions = session_count,
            depth = self.engine.depth,
            "Starting evaluation"
        );

        let shared = Arc::new(SessionShared {
            jobs,
            next: AtomicUsize::new(0),
            initial_fen: tree.initial_fen(),
            engine: self.engine.clone(),
            line_count: self.line_count,
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sessions = JoinSet::new();
        for session in 0..session_count {
            let launcher = Arc::clone(&self.launcher);
            let shared = Arc::clone(&shared);
            let tx = tx.clone();
            sessions.spawn(async move {
                if let Err(e) = run_session(session, launcher.as_ref(), &shared, &tx).await {
                    let _ = tx.send(SessionEvent::Failed(e));
                }
            });
        }
        drop(tx);

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    sessions.shutdown().await;
                    info!("Evaluation cancelled, engine sessions stopped");
                    return Err(AnalysisError::Aborted);
                }
                event = rx.recv() => event,
            };

            match event {
                Some(SessionEvent::Progress { index, fraction }) => {
                    let slot = &mut progress[start + index];
                    *slot = slot.max(fraction);
                    on_progress(overall(&progress));
                }
                Some(SessionEvent::Finished { index, lines }) => {
                    if let Some(node) = tree.get_mut(shared.jobs[index].id) {
                        node.state.engine_lines = lines;
                    }
                    progress[start + index] = 1.0;
                    on_progress(overall(&progress));
                }
                Some(SessionEvent::Failed(e)) => {
                    sessions.shutdown().await;
                    return Err(e);
                }
                None => break,
            }
        }

        while let Some(joined) = sessions.join_next().await {
            joined.map_err(|e| AnalysisError::EngineProtocol(format!("engine session failed: {e}")))?;
        }

        info!(nodes = order.len(), "Evaluation complete");
        Ok(())
    }

    fn trusted_prefix(&self, tree: &GameTree, order: &[NodeId]) -> usize {
        let Some(source) = self.cached_source.as_deref() else {
            return 0;
        };
        order
            .iter()
            .take_while(|id| {
                tree.get(**id).is_some_and(|node| {
                    node.state.engine_lines.iter().any(|line| line.source == source)
                })
            })
            .count()
    }
}

async fn run_session<L: EngineLauncher>(
    session: usize,
    launcher: &L,
    shared: &SessionShared,
    events: &UnboundedSender<SessionEvent>,
) -> Result<(), AnalysisError> {
    let mut engine = launcher.launch().await?;
    engine.initialize(&shared.engine, shared.line_count).await?;
    debug!(session, "Engine session ready");

    let depth = shared.engine.depth;
    let time_limit: Option<Duration> = shared.engine.time_limit;

    loop {
        let index = shared.next.fetch_add(1, Ordering::SeqCst);
        let Some(job) = shared.jobs.get(index) else {
            break;
        };

        engine
            .set_position(&shared.initial_fen, &job.moves, job.position.clone())
            .await?;

        let no_legal_moves = job.position.legal_moves().is_empty();
        let lines = engine
            .evaluate(depth, time_limit, |reached| {
                let fraction = if no_legal_moves {
                    1.0
                } else {
                    (f64::from(reached) / f64::from(depth)).min(1.0)
                };
                let _ = events.send(SessionEvent::Progress { index, fraction });
            })
            .await?;

        debug!(session, node = %job.id, lines = lines.len(), "Node evaluated");
        let _ = events.send(SessionEvent::Finished { index, lines });
    }

    engine.quit().await;
    debug!(session, "Engine session finished");
    Ok(())
}

/// Depth-first node order with each principal continuation first, so the
/// mainline leads.
pub fn evaluation_order(tree: &GameTree) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(tree.len());
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        order.push(id);
        stack.extend(node.children().iter().rev().copied());
    }
    order
}

fn overall(progress: &[f64]) -> f64 {
    if progress.is_empty() {
        return 1.0;
    }
    let mean = progress.iter().sum::<f64>() / progress.len() as f64;
    (mean * 1000.0).round() / 1000.0
}
