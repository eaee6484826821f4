//! Tree annotation and the per-game report.

use chess_core::engine_line::top_line;
use chess_core::{Classification, Evaluation, Game, GameMetadata, GameTree, NodeId, TreeNode};
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use tracing::{debug, info};

use crate::accuracy::{game_accuracy, move_accuracy, GameAccuracy};
use crate::classify::{classify, extract_current, extract_previous};
use crate::config::AnalysisOptions;
use crate::openings::OpeningBook;

/// Classification counts for one side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub forced: u32,
    pub theory: u32,
    pub brilliant: u32,
    pub critical: u32,
    pub best: u32,
    pub excellent: u32,
    pub okay: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl ClassificationCounts {
    pub fn record(&mut self, classification: Classification) {
        let slot = match classification {
            Classification::Forced => &mut self.forced,
            Classification::Theory => &mut self.theory,
            Classification::Brilliant => &mut self.brilliant,
            Classification::Critical => &mut self.critical,
            Classification::Best => &mut self.best,
            Classification::Excellent => &mut self.excellent,
            Classification::Okay => &mut self.okay,
            Classification::Inaccuracy => &mut self.inaccuracy,
            Classification::Mistake => &mut self.mistake,
            Classification::Blunder => &mut self.blunder,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        self.forced
            + self.theory
            + self.brilliant
            + self.critical
            + self.best
            + self.excellent
            + self.okay
            + self.inaccuracy
            + self.mistake
            + self.blunder
    }
}

/// What annotation produced for one node.
#[derive(Debug, Clone, Default)]
struct NodeAnnotation {
    classification: Option<Classification>,
    accuracy: Option<f64>,
    opening: Option<String>,
}

/// Totals from one annotation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub classified: usize,
    pub unclassified: usize,
}

/// Classify every non-root node, attach opening names everywhere and
/// accuracy wherever both sides of the move have evaluations. Previous
/// annotations are replaced.
pub fn annotate_tree(
    tree: &mut GameTree,
    options: &AnalysisOptions,
    book: &OpeningBook,
) -> AnnotationSummary {
    let mut summary = AnnotationSummary::default();

    let annotations: Vec<(NodeId, NodeAnnotation)> = tree
        .nodes()
        .map(|node| (node.id, annotate_node(tree, node, options, book)))
        .collect();

    for (id, annotation) in annotations {
        let Some(node) = tree.get_mut(id) else {
            continue;
        };
        if node.parent().is_some() {
            if annotation.classification.is_some() {
                summary.classified += 1;
            } else {
                summary.unclassified += 1;
            }
        }
        node.state.classification = annotation.classification;
        node.state.accuracy = annotation.accuracy;
        node.state.opening = annotation.opening;
    }

    info!(
        classified = summary.classified,
        unclassified = summary.unclassified,
        "Annotated game tree"
    );

    summary
}

fn annotate_node(
    tree: &GameTree,
    node: &TreeNode,
    options: &AnalysisOptions,
    book: &OpeningBook,
) -> NodeAnnotation {
    let opening = book.name_for(&node.state.position).map(str::to_string);

    let Some(parent) = tree.parent_of(node.id) else {
        return NodeAnnotation {
            opening,
            ..NodeAnnotation::default()
        };
    };

    let classification = match classify(tree, node.id, options, book) {
        Ok(classification) => Some(classification),
        Err(e) => {
            debug!(node = %node.id, error = %e, "Left node unclassified");
            None
        }
    };

    let accuracy = match (extract_previous(tree, parent), extract_current(tree, node)) {
        (Ok(previous), Ok(current)) => {
            let mover = node.state.move_colour.unwrap_or(Color::White);
            Some(move_accuracy(&previous.evaluation, &current.evaluation, mover))
        }
        _ => None,
    };

    NodeAnnotation {
        classification,
        accuracy,
        opening,
    }
}

/// One row of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveReport {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    /// Half-moves from the initial position
    pub ply: usize,
    pub san: String,
    pub uci: String,
    pub colour: String,
    pub classification: Option<Classification>,
    pub accuracy: Option<f64>,
    pub opening: Option<String>,
    pub evaluation: Option<Evaluation>,
    /// Engine's preferred move in this position
    pub best_move: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub metadata: GameMetadata,
    pub initial_fen: String,
    pub accuracy: GameAccuracy,
    pub white: ClassificationCounts,
    pub black: ClassificationCounts,
    pub moves: Vec<MoveReport>,
}

impl GameReport {
    pub fn from_game(game: &Game) -> Self {
        Self::new(&game.tree, game.metadata.clone())
    }

    /// Summarize an annotated tree. Counts and accuracy cover the mainline;
    /// `moves` lists every node in creation order.
    pub fn new(tree: &GameTree, metadata: GameMetadata) -> Self {
        let mut white = ClassificationCounts::default();
        let mut black = ClassificationCounts::default();
        for node in tree.mainline().into_iter().filter_map(|id| tree.get(id)) {
            let Some(classification) = node.state.classification else {
                continue;
            };
            match node.state.move_colour {
                Some(Color::White) => white.record(classification),
                Some(Color::Black) => black.record(classification),
                None => {}
            }
        }

        let moves = tree
            .nodes()
            .filter_map(|node| move_report(tree, node))
            .collect();

        Self {
            metadata,
            initial_fen: tree.initial_fen(),
            accuracy: game_accuracy(tree),
            white,
            black,
            moves,
        }
    }
}

fn move_report(tree: &GameTree, node: &TreeNode) -> Option<MoveReport> {
    let played = node.state.played.as_ref()?;
    let best = top_line(&node.state.engine_lines);

    Some(MoveReport {
        node: node.id,
        parent: node.parent(),
        ply: ply_of(tree, node),
        san: played.san.clone(),
        uci: played.uci.clone(),
        colour: match node.state.move_colour {
            Some(Color::Black) => "black",
            _ => "white",
        }
        .to_string(),
        classification: node.state.classification,
        accuracy: node.state.accuracy,
        opening: node.state.opening.clone(),
        evaluation: best.map(|line| line.evaluation),
        best_move: best
            .and_then(|line| line.first_move())
            .map(|mv| mv.san.clone()),
    })
}

fn ply_of(tree: &GameTree, node: &TreeNode) -> usize {
    let mut ply = 0;
    let mut current = node.parent();
    while let Some(id) = current {
        ply += 1;
        current = tree.get(id).and_then(TreeNode::parent);
    }
    ply
}
